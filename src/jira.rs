//! Jira REST v2 access.
//!
//! `JiraClient` is the seam between the reconciler and the tracker; `RealJiraClient`
//! talks HTTP, `MockJiraClient` (in `mock_jira`) keeps everything in memory.

use reqwest::{
	StatusCode,
	blocking::{Client, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;
use url::Url;

use crate::{
	config::JiraSettings,
	issue::{Checklist, Issue, IssueType, adf_to_text},
	payload::{FieldIds, IssuePayload},
};

/// Failure talking to Jira. Carries everything needed to show the user what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
	#[error("request to Jira failed: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("issue {0} does not exist")]
	NotFound(String),
	#[error("Jira rejected the request ({status}): {}", messages.join("; "))]
	Rejected { status: u16, messages: Vec<String> },
	#[error("unexpected response from Jira ({status}): {body}")]
	Unexpected { status: u16, body: String },
	#[error("could not decode Jira response: {0}")]
	Decode(String),
	#[error("invalid Jira endpoint: {0}")]
	Url(#[from] url::ParseError),
}

//==============================================================================
// Jira Client Trait
//==============================================================================

/// One method per round trip to the tracker.
pub trait JiraClient {
	/// Fuzzy search by project and summary, then pick the first exact summary match.
	/// Several exact matches resolve to whichever Jira returned first.
	fn find_issue(&self, project_key: &str, summary: &str) -> Result<Option<Issue>, RemoteError>;

	/// Create an issue; the returned issue carries the newly assigned key.
	fn create_issue(&self, payload: &IssuePayload) -> Result<Issue, RemoteError>;

	/// Read an issue by key. `None` if it doesn't exist.
	fn read_issue(&self, key: &str) -> Result<Option<Issue>, RemoteError>;

	/// Overwrite an existing issue's fields.
	fn update_issue(&self, key: &str, payload: &IssuePayload) -> Result<Issue, RemoteError>;

	fn delete_issue(&self, key: &str) -> Result<(), RemoteError>;
}

pub type BoxedJiraClient = Box<dyn JiraClient>;

/// Create a Jira client from validated settings.
pub fn create_client(settings: JiraSettings, fields: FieldIds) -> BoxedJiraClient {
	Box::new(RealJiraClient::new(settings, fields))
}

//==============================================================================
// Response decoding
//==============================================================================

#[derive(Debug, Default, Deserialize)]
struct NamedRef {
	#[serde(default)]
	name: String,
}

#[derive(Debug, Default, Deserialize)]
struct KeyedRef {
	#[serde(default)]
	key: String,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteFields {
	#[serde(default)]
	summary: Option<String>,
	#[serde(default)]
	description: Value,
	#[serde(default)]
	issuetype: Option<NamedRef>,
	#[serde(default)]
	parent: Option<KeyedRef>,
	/// Custom fields (epic link, checklist, ...).
	#[serde(flatten)]
	custom: Map<String, Value>,
}

/// An issue as returned by `GET issue/{key}` or inside search results.
#[derive(Debug, Deserialize)]
struct RemoteIssue {
	key: String,
	#[serde(default)]
	fields: RemoteFields,
}

impl RemoteIssue {
	fn into_issue(self, ids: &FieldIds) -> Issue {
		let fields = self.fields;
		let kind = fields.issuetype.as_ref().map(|t| IssueType::from_api_name_lossy(&t.name)).unwrap_or(IssueType::Task);
		let mut issue = Issue::new(kind, fields.summary.unwrap_or_default(), adf_to_text(&fields.description)).with_key(self.key);

		issue.parent_id = fields.parent.map(|p| p.key).filter(|k| !k.is_empty());
		issue.epic_id = fields.custom.get(&ids.epic_link).and_then(text_field);
		if let Some(field) = &ids.checklist
			&& let Some(text) = fields.custom.get(field).and_then(text_field)
		{
			issue.checklist = Checklist::parse(&text);
		}
		issue
	}
}

/// Custom field value as text. Null and empty values are treated as absent.
fn text_field(value: &Value) -> Option<String> {
	let text = match value {
		Value::Null => return None,
		Value::Object(obj) if obj.contains_key("key") => obj.get("key").and_then(Value::as_str).unwrap_or_default().to_string(),
		other => adf_to_text(other),
	};
	(!text.is_empty()).then_some(text)
}

/// Decode a list of issues, dropping entries that don't look like issues at all.
fn decode_issues(values: Vec<Value>, ids: &FieldIds) -> Vec<Issue> {
	values
		.into_iter()
		.filter_map(|value| match serde_json::from_value::<RemoteIssue>(value) {
			Ok(remote) => Some(remote.into_issue(ids)),
			Err(e) => {
				tracing::warn!("Skipping undecodable issue in search results: {e}");
				None
			}
		})
		.collect()
}

/// Pick the first issue whose summary matches exactly.
pub fn pick_exact_match(candidates: Vec<Issue>, summary: &str) -> Option<Issue> {
	if candidates.len() > 1 {
		tracing::debug!("[find] {} candidates for {summary:?}, filtering to exact matches", candidates.len());
	}
	candidates.into_iter().find(|issue| issue.summary == summary)
}

/// Collect the messages of a Jira error body: `{"errorMessages": [..], "errors": {field: msg}}`.
pub fn rejection_messages(body: &str) -> Vec<String> {
	#[derive(Deserialize)]
	struct ErrorBody {
		#[serde(default, rename = "errorMessages")]
		error_messages: Vec<String>,
		#[serde(default)]
		errors: Map<String, Value>,
	}

	match serde_json::from_str::<ErrorBody>(body) {
		Ok(parsed) => {
			let mut messages = parsed.error_messages;
			messages.extend(parsed.errors.iter().map(|(field, msg)| match msg {
				Value::String(s) => format!("{field}: {s}"),
				other => format!("{field}: {other}"),
			}));
			if messages.is_empty() && !body.trim().is_empty() {
				messages.push(body.trim().to_string());
			}
			messages
		}
		Err(_) if body.trim().is_empty() => Vec::new(),
		Err(_) => vec![body.trim().to_string()],
	}
}

/// Escape a summary for use inside a JQL `~` string literal.
pub fn escape_jql_text(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'+' | '-' | '&' | '|' | '!' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '~' | '*' | '?' | ':' | '\\' | '/' => {
				out.push_str("\\\\");
				out.push(c);
			}
			_ => out.push(c),
		}
	}
	out
}

fn error_for(status: StatusCode, body: String, key: Option<&str>) -> RemoteError {
	match (status, key) {
		(StatusCode::NOT_FOUND, Some(key)) => RemoteError::NotFound(key.to_string()),
		(s, _) if s.is_client_error() => RemoteError::Rejected {
			status: s.as_u16(),
			messages: rejection_messages(&body),
		},
		(s, _) => RemoteError::Unexpected { status: s.as_u16(), body },
	}
}

//==============================================================================
// Real Jira Client Implementation
//==============================================================================

/// Blocking HTTP client for Jira REST v2.
pub struct RealJiraClient {
	http_client: Client,
	settings: JiraSettings,
	fields: FieldIds,
}

impl RealJiraClient {
	pub fn new(settings: JiraSettings, fields: FieldIds) -> Self {
		Self {
			http_client: Client::new(),
			settings,
			fields,
		}
	}

	fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
		Ok(self.settings.base_url.join(path)?)
	}

	fn field_list(&self) -> String {
		let mut fields = vec!["summary", "description", "issuetype", "parent", self.fields.epic_link.as_str()];
		if let Some(checklist) = &self.fields.checklist {
			fields.push(checklist);
		}
		fields.join(",")
	}

	fn get(&self, url: Url) -> Result<Response, RemoteError> {
		Ok(self
			.http_client
			.get(url)
			.header("Authorization", &self.settings.auth_header)
			.header("Accept", "application/json")
			.send()?)
	}

	fn decode<T: serde::de::DeserializeOwned>(res: Response) -> Result<T, RemoteError> {
		let body = res.text()?;
		serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
	}
}

impl JiraClient for RealJiraClient {
	#[instrument(skip(self), name = "RealJiraClient::find_issue")]
	fn find_issue(&self, project_key: &str, summary: &str) -> Result<Option<Issue>, RemoteError> {
		#[derive(Deserialize)]
		struct SearchResult {
			#[serde(default)]
			issues: Vec<Value>,
		}

		let jql = format!("project = \"{project_key}\" AND summary ~ \"{}\"", escape_jql_text(summary));
		let mut url = self.endpoint("search/jql")?;
		url.query_pairs_mut().append_pair("jql", &jql).append_pair("fields", &self.field_list());

		let res = self.get(url)?;
		let status = res.status();
		if !status.is_success() {
			let body = res.text().unwrap_or_default();
			return Err(error_for(status, body, None));
		}

		let result: SearchResult = Self::decode(res)?;
		if result.issues.is_empty() {
			return Ok(None);
		}
		Ok(pick_exact_match(decode_issues(result.issues, &self.fields), summary))
	}

	#[instrument(skip(self, payload), fields(summary = %payload.summary), name = "RealJiraClient::create_issue")]
	fn create_issue(&self, payload: &IssuePayload) -> Result<Issue, RemoteError> {
		#[derive(Deserialize)]
		struct CreatedIssue {
			key: String,
		}

		let res = self
			.http_client
			.post(self.endpoint("issue")?)
			.header("Authorization", &self.settings.auth_header)
			.header("Accept", "application/json")
			.json(payload)
			.send()?;

		let status = res.status();
		if !status.is_success() {
			let body = res.text().unwrap_or_default();
			return Err(error_for(status, body, None));
		}

		let created: CreatedIssue = Self::decode(res)?;
		Ok(payload.to_issue(&created.key))
	}

	#[instrument(skip(self), name = "RealJiraClient::read_issue")]
	fn read_issue(&self, key: &str) -> Result<Option<Issue>, RemoteError> {
		let mut url = self.endpoint(&format!("issue/{key}"))?;
		url.query_pairs_mut().append_pair("fields", &self.field_list());

		let res = self.get(url)?;
		let status = res.status();
		if status == StatusCode::NOT_FOUND {
			return Ok(None);
		}
		if !status.is_success() {
			let body = res.text().unwrap_or_default();
			return Err(error_for(status, body, Some(key)));
		}

		let remote: RemoteIssue = Self::decode(res)?;
		Ok(Some(remote.into_issue(&self.fields)))
	}

	#[instrument(skip(self, payload), name = "RealJiraClient::update_issue")]
	fn update_issue(&self, key: &str, payload: &IssuePayload) -> Result<Issue, RemoteError> {
		let res = self
			.http_client
			.put(self.endpoint(&format!("issue/{key}"))?)
			.header("Authorization", &self.settings.auth_header)
			.header("Accept", "application/json")
			.json(payload)
			.send()?;

		let status = res.status();
		if !status.is_success() {
			let body = res.text().unwrap_or_default();
			return Err(error_for(status, body, Some(key)));
		}
		Ok(payload.to_issue(key))
	}

	#[instrument(skip(self), name = "RealJiraClient::delete_issue")]
	fn delete_issue(&self, key: &str) -> Result<(), RemoteError> {
		let res = self
			.http_client
			.delete(self.endpoint(&format!("issue/{key}"))?)
			.header("Authorization", &self.settings.auth_header)
			.send()?;

		let status = res.status();
		if !status.is_success() {
			let body = res.text().unwrap_or_default();
			return Err(error_for(status, body, Some(key)));
		}
		Ok(())
	}
}
