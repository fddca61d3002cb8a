//! Tracing setup: human-readable events on stderr, optionally JSON lines to a trace file.

use std::{
	fs::File,
	path::{Path, PathBuf},
	sync::Mutex,
};

use color_eyre::eyre::{Result, WrapErr};
use tracing::{Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// When set, every event is also written to this file as one JSON object per line.
pub const TRACE_FILE_ENV: &str = "MD2JIRA_TRACE_FILE";

/// `RUST_LOG` wins; otherwise `info` (`debug` when verbose) plus whatever was baked in at build time.
pub fn env_filter(verbose: bool) -> EnvFilter {
	let mut directives = if verbose { "debug" } else { "info" }.to_string();
	if let Some(baked) = option_env!("LOG_DIRECTIVES") {
		directives.push(',');
		directives.push_str(baked);
	}
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

pub fn subscriber(verbose: bool, trace_file: Option<&Path>) -> Result<impl Subscriber + Send + Sync + 'static> {
	let json = match trace_file {
		Some(path) => {
			let file = File::create(path).wrap_err_with(|| format!("Failed to create trace file {}", path.display()))?;
			Some(fmt::layer().json().with_writer(Mutex::new(file)).with_filter(LevelFilter::DEBUG))
		}
		None => None,
	};
	let human = fmt::layer().with_writer(std::io::stderr).with_target(false).with_filter(env_filter(verbose));
	Ok(tracing_subscriber::registry().with(human).with(json))
}

/// Install the global subscriber. The trace file comes from `MD2JIRA_TRACE_FILE`.
pub fn init(verbose: bool) -> Result<()> {
	let trace_file = std::env::var_os(TRACE_FILE_ENV).map(PathBuf::from);
	subscriber(verbose, trace_file.as_deref())?.try_init().wrap_err("Failed to install tracing subscriber")?;
	Ok(())
}
