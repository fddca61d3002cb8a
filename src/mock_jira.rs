//! Mock Jira client for testing purposes.
//!
//! This module provides a mock implementation of the JiraClient trait that stores
//! all data in memory and can be used for integration testing without hitting the real API.

use std::{
	collections::HashSet,
	sync::{
		Mutex,
		atomic::{AtomicU64, Ordering},
	},
};

use tracing::instrument;

use crate::{
	issue::{Issue, IssueType},
	jira::{JiraClient, RemoteError, pick_exact_match},
	payload::{IssuePayload, Linkage},
};

/// Mock Jira client that stores all state in memory.
pub struct MockJiraClient {
	/// Project key used when assigning new issue keys
	project_key: String,

	/// Counter for generating issue numbers
	next_number: AtomicU64,

	/// All issues, in creation order
	issues: Mutex<Vec<Issue>>,

	/// Every payload passed to `create_issue`, accepted or not
	created: Mutex<Vec<IssuePayload>>,

	/// Every `(key, payload)` passed to `update_issue`
	updated: Mutex<Vec<(String, IssuePayload)>>,

	/// Summaries whose create / find requests fail, keys whose updates fail
	failing_creates: Mutex<HashSet<String>>,
	failing_finds: Mutex<HashSet<String>>,
	failing_updates: Mutex<HashSet<String>>,

	/// Call log for debugging
	call_log: Mutex<Vec<String>>,
}

impl MockJiraClient {
	pub fn new(project_key: &str) -> Self {
		Self {
			project_key: project_key.to_string(),
			next_number: AtomicU64::new(1),
			issues: Mutex::new(Vec::new()),
			created: Mutex::new(Vec::new()),
			updated: Mutex::new(Vec::new()),
			failing_creates: Mutex::new(HashSet::new()),
			failing_finds: Mutex::new(HashSet::new()),
			failing_updates: Mutex::new(HashSet::new()),
			call_log: Mutex::new(Vec::new()),
		}
	}

	/// Add an issue to the mock state. Issues without a key get the next free one.
	pub fn add_issue(&self, issue: Issue) -> String {
		let issue = if issue.is_remote() { issue } else { issue.with_key(self.next_key()) };
		let key = issue.key.clone();
		self.issues.lock().unwrap().push(issue);
		key
	}

	/// Make `create_issue` reject any payload with this summary.
	pub fn fail_create(&self, summary: &str) {
		self.failing_creates.lock().unwrap().insert(summary.to_string());
	}

	/// Make `find_issue` error out for this summary.
	pub fn fail_find(&self, summary: &str) {
		self.failing_finds.lock().unwrap().insert(summary.to_string());
	}

	/// Make `update_issue` reject updates to this key.
	pub fn fail_update(&self, key: &str) {
		self.failing_updates.lock().unwrap().insert(key.to_string());
	}

	pub fn get_issue(&self, key: &str) -> Option<Issue> {
		self.issues.lock().unwrap().iter().find(|i| i.key == key).cloned()
	}

	/// Snapshot of all issues, in creation order.
	pub fn issues(&self) -> Vec<Issue> {
		self.issues.lock().unwrap().clone()
	}

	pub fn created_payloads(&self) -> Vec<IssuePayload> {
		self.created.lock().unwrap().clone()
	}

	pub fn updated_payloads(&self) -> Vec<(String, IssuePayload)> {
		self.updated.lock().unwrap().clone()
	}

	/// Get the call log for debugging
	pub fn get_call_log(&self) -> Vec<String> {
		self.call_log.lock().unwrap().clone()
	}

	/// Clear the call log
	pub fn clear_call_log(&self) {
		self.call_log.lock().unwrap().clear();
	}

	fn log_call(&self, call: &str) {
		self.call_log.lock().unwrap().push(call.to_string());
	}

	fn next_key(&self) -> String {
		format!("{}-{}", self.project_key, self.next_number.fetch_add(1, Ordering::SeqCst))
	}

	fn exists(&self, key: &str, kind: impl Fn(IssueType) -> bool) -> bool {
		self.issues.lock().unwrap().iter().any(|i| i.key == key && kind(i.kind))
	}

	/// The checks Jira itself would make before accepting a payload.
	fn validate(&self, payload: &IssuePayload) -> Result<(), RemoteError> {
		let rejected = |message: String| RemoteError::Rejected { status: 400, messages: vec![message] };
		if payload.summary.is_empty() {
			return Err(rejected("summary: You must specify a summary of the issue.".to_string()));
		}
		match &payload.linkage {
			Linkage::Subtask { parent: None } => Err(rejected("parent: Sub-tasks must have a parent.".to_string())),
			Linkage::Subtask { parent: Some(parent) } if !self.exists(parent, IssueType::holds_subtasks) => Err(rejected(format!("parent: Issue '{parent}' cannot hold sub-tasks."))),
			Linkage::Story { field, epic_link: Some(epic) } if !self.exists(epic, IssueType::holds_epic) => Err(rejected(format!("{field}: Epic '{epic}' does not exist."))),
			_ => Ok(()),
		}
	}
}

impl JiraClient for MockJiraClient {
	#[instrument(skip(self), name = "MockJiraClient::find_issue")]
	fn find_issue(&self, project_key: &str, summary: &str) -> Result<Option<Issue>, RemoteError> {
		tracing::info!(target: "mock_jira", project_key, summary, "find_issue");
		self.log_call(&format!("find_issue({project_key}, {summary})"));

		if self.failing_finds.lock().unwrap().contains(summary) {
			return Err(RemoteError::Unexpected {
				status: 500,
				body: "search unavailable".to_string(),
			});
		}

		// `summary ~ "..."` is a text search, so near misses come back too
		let prefix = format!("{project_key}-");
		let needle = summary.to_lowercase();
		let candidates: Vec<Issue> = self
			.issues
			.lock()
			.unwrap()
			.iter()
			.filter(|i| i.key.starts_with(&prefix) && i.summary.to_lowercase().contains(&needle))
			.cloned()
			.collect();

		Ok(pick_exact_match(candidates, summary))
	}

	#[instrument(skip(self, payload), fields(summary = %payload.summary), name = "MockJiraClient::create_issue")]
	fn create_issue(&self, payload: &IssuePayload) -> Result<Issue, RemoteError> {
		tracing::info!(target: "mock_jira", summary = %payload.summary, kind = %payload.kind, "create_issue");
		self.log_call(&format!("create_issue({}, {})", payload.kind, payload.summary));
		self.created.lock().unwrap().push(payload.clone());

		if self.failing_creates.lock().unwrap().contains(&payload.summary) {
			return Err(RemoteError::Rejected {
				status: 400,
				messages: vec!["summary: rejected by mock".to_string()],
			});
		}
		self.validate(payload)?;

		let issue = payload.to_issue(&self.next_key());
		self.issues.lock().unwrap().push(issue.clone());
		Ok(issue)
	}

	#[instrument(skip(self), name = "MockJiraClient::read_issue")]
	fn read_issue(&self, key: &str) -> Result<Option<Issue>, RemoteError> {
		tracing::info!(target: "mock_jira", key, "read_issue");
		self.log_call(&format!("read_issue({key})"));
		Ok(self.get_issue(key))
	}

	#[instrument(skip(self, payload), name = "MockJiraClient::update_issue")]
	fn update_issue(&self, key: &str, payload: &IssuePayload) -> Result<Issue, RemoteError> {
		tracing::info!(target: "mock_jira", key, summary = %payload.summary, "update_issue");
		self.log_call(&format!("update_issue({key}, {})", payload.summary));
		self.updated.lock().unwrap().push((key.to_string(), payload.clone()));

		if self.failing_updates.lock().unwrap().contains(key) {
			return Err(RemoteError::Rejected {
				status: 400,
				messages: vec!["description: rejected by mock".to_string()],
			});
		}
		if self.get_issue(key).is_none() {
			return Err(RemoteError::NotFound(key.to_string()));
		}
		self.validate(payload)?;

		// Like Jira, fields the payload leaves out keep their stored values.
		let mut updated = payload.to_issue(key);
		let mut issues = self.issues.lock().unwrap();
		if let Some(slot) = issues.iter_mut().find(|i| i.key == key) {
			if payload.checklist.is_none() {
				updated.checklist = std::mem::take(&mut slot.checklist);
			}
			if updated.epic_id.is_none() {
				updated.epic_id = slot.epic_id.take();
			}
			if updated.parent_id.is_none() {
				updated.parent_id = slot.parent_id.take();
			}
			*slot = updated.clone();
		}
		Ok(updated)
	}

	#[instrument(skip(self), name = "MockJiraClient::delete_issue")]
	fn delete_issue(&self, key: &str) -> Result<(), RemoteError> {
		tracing::info!(target: "mock_jira", key, "delete_issue");
		self.log_call(&format!("delete_issue({key})"));

		let mut issues = self.issues.lock().unwrap();
		let before = issues.len();
		issues.retain(|i| i.key != key);
		if issues.len() == before {
			return Err(RemoteError::NotFound(key.to_string()));
		}
		Ok(())
	}
}
