//! Utilities for capturing and verifying tracing output in integration tests.
//!
//! With a trace file configured, events are written as one JSON object per line.
//! The mock client emits `tracing::info!` events with target "mock_jira" named after
//! the method and carrying its arguments as fields; `has_mock_call` looks for those.

use std::{fs, path::Path};

use serde::Deserialize;

/// A single trace event from the JSON log
#[derive(Debug, Deserialize)]
pub struct TraceEvent {
	pub level: String,
	pub target: String,
	pub fields: TraceFields,
}

#[derive(Debug, Deserialize)]
pub struct TraceFields {
	pub message: Option<String>,
	pub project_key: Option<String>,
	pub summary: Option<String>,
	pub key: Option<String>,
	pub kind: Option<String>,
}

/// Parsed trace log that provides verification methods
pub struct TraceLog {
	events: Vec<TraceEvent>,
}

impl TraceLog {
	/// Read and parse a trace log file
	pub fn from_file(path: &Path) -> Self {
		let content = fs::read_to_string(path).unwrap_or_default();
		let events = content.lines().filter(|line| !line.is_empty()).filter_map(|line| serde_json::from_str(line).ok()).collect();
		Self { events }
	}

	pub fn has_mock_call(&self, method_name: &str) -> bool {
		self.mock_calls().iter().any(|e| e.fields.message.as_deref() == Some(method_name))
	}

	/// Check if a mock method was called for an issue with this summary
	pub fn has_mock_call_for(&self, method_name: &str, summary: &str) -> bool {
		self.mock_calls()
			.iter()
			.any(|e| e.fields.message.as_deref() == Some(method_name) && e.fields.summary.as_deref() == Some(summary))
	}

	/// Get all mock call events, in order
	pub fn mock_calls(&self) -> Vec<&TraceEvent> {
		self.events.iter().filter(|e| e.target == "mock_jira").collect()
	}

	pub fn warnings(&self) -> Vec<&TraceEvent> {
		self.events.iter().filter(|e| e.level == "WARN").collect()
	}
}

/// Assert that a mock method was called
#[macro_export]
macro_rules! assert_traced {
	($log:expr, $method:expr) => {
		assert!(
			$log.has_mock_call($method),
			"Expected mock call '{}' to be traced, but it wasn't. Mock calls:\n{:#?}",
			$method,
			$log.mock_calls()
		);
	};
	($log:expr, $method:expr, $summary:expr) => {
		assert!(
			$log.has_mock_call_for($method, $summary),
			"Expected mock call '{}' for '{}' to be traced, but it wasn't. Mock calls:\n{:#?}",
			$method,
			$summary,
			$log.mock_calls()
		);
	};
}
