//! Settings: `.env` → defaults → `md2jira.toml` → `JIRA_*` environment → CLI overrides.

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use base64::{Engine, engine::general_purpose::STANDARD};
use color_eyre::eyre::{Result, WrapErr, bail};
use serde::Deserialize;
use smart_default::SmartDefault;
use url::Url;

use crate::{cache::DEFAULT_CACHE_FILE, payload::FieldIds};

pub const CONFIG_FILE: &str = "md2jira.toml";
pub const ENV_PREFIX: &str = "JIRA";

#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Settings {
	/// `{subdomain}.{domain}` is the Jira host.
	pub project_subdomain: Option<String>,
	#[default("atlassian.net".to_string())]
	pub domain: String,
	/// Pre-encoded Basic credential (`base64(email:token)`).
	pub auth_key: Option<String>,
	pub user_email: Option<String>,
	pub api_token: Option<String>,
	pub project_key: Option<String>,
	pub checklist_field: Option<String>,
	#[default("customfield_10011".to_string())]
	pub epic_name_field: String,
	#[default("customfield_10014".to_string())]
	pub epic_link_field: String,
	#[default(PathBuf::from(DEFAULT_CACHE_FILE))]
	pub cache_path: PathBuf,
}

/// Everything the HTTP client needs, validated.
#[derive(Clone, Debug)]
pub struct JiraSettings {
	/// `https://{subdomain}.{domain}/rest/api/2/`
	pub base_url: Url,
	/// Full `Authorization` header value.
	pub auth_header: String,
	pub project_key: String,
}

impl Settings {
	/// Load `.env` (if any) into the process environment, then read settings from `dir` and the environment.
	pub fn load(dir: &Path) -> Result<Self> {
		match dotenvy::from_path(dir.join(".env")) {
			Ok(()) => tracing::debug!("Loaded {}", dir.join(".env").display()),
			Err(e) if e.not_found() => {}
			Err(e) => return Err(e).wrap_err("Failed to load .env"),
		}
		Self::from_sources(&dir.join(CONFIG_FILE), Environment::with_prefix(ENV_PREFIX))
	}

	/// Layer the optional config file and the given environment source over the defaults.
	pub fn from_sources(config_file: &Path, env: Environment) -> Result<Self> {
		let settings = Config::builder()
			.add_source(File::from(config_file).required(false))
			.add_source(env)
			.build()
			.wrap_err_with(|| format!("Failed to read configuration ({})", config_file.display()))?
			.try_deserialize::<Settings>()
			.wrap_err("The configuration is malformed")?;
		Ok(settings)
	}

	pub fn field_ids(&self) -> FieldIds {
		FieldIds {
			epic_name: self.epic_name_field.clone(),
			epic_link: self.epic_link_field.clone(),
			checklist: self.checklist_field.clone().filter(|f| !f.is_empty()),
		}
	}

	pub fn project_key(&self) -> Result<&str> {
		match self.project_key.as_deref().map(str::trim) {
			Some(key) if !key.is_empty() => Ok(key),
			_ => bail!("No project key configured: set JIRA_PROJECT_KEY or pass --project"),
		}
	}

	/// Value of the `Authorization` header.
	pub fn auth_header(&self) -> Result<String> {
		if let Some(key) = self.auth_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
			return Ok(format!("Basic {key}"));
		}
		match (self.user_email.as_deref(), self.api_token.as_deref()) {
			(Some(email), Some(token)) if !email.is_empty() && !token.is_empty() => Ok(format!("Basic {}", STANDARD.encode(format!("{email}:{token}")))),
			_ => bail!("No Jira credential configured: set JIRA_AUTH_KEY, or JIRA_USER_EMAIL and JIRA_API_TOKEN"),
		}
	}

	/// Validate into what the real client needs. Fails before any request is made.
	pub fn jira(&self) -> Result<JiraSettings> {
		let Some(subdomain) = self.project_subdomain.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
			bail!("No Jira subdomain configured: set JIRA_PROJECT_SUBDOMAIN");
		};
		let base_url = Url::parse(&format!("https://{subdomain}.{}/rest/api/2/", self.domain.trim())).wrap_err("Invalid Jira subdomain or domain")?;
		Ok(JiraSettings {
			base_url,
			auth_header: self.auth_header()?,
			project_key: self.project_key()?.to_string(),
		})
	}
}
