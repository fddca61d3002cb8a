//! Core issue data structures.
//!
//! `IssueType` carries the explicit mapping between the Markdown heading depth,
//! the Jira issue type name and the hierarchy role of each variant.

use std::fmt;

use super::checklist::Checklist;

/// Kind of a Jira ticket in the Epic → Story/Task → Subtask hierarchy.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IssueType {
	Epic,
	Story,
	Task,
	Subtask,
}

/// `(variant, heading depth, api type name)`, indexed by the variant's discriminant.
const TYPE_TABLE: [(IssueType, usize, &str); 4] = [
	(IssueType::Epic, 1, "Epic"),
	(IssueType::Story, 2, "Story"),
	(IssueType::Task, 2, "Task"),
	(IssueType::Subtask, 3, "Sub-task"),
];

impl IssueType {
	fn entry(self) -> (IssueType, usize, &'static str) {
		TYPE_TABLE[self as usize]
	}

	/// Markdown heading depth (`#`, `##`, `###`).
	pub fn heading_depth(self) -> usize {
		self.entry().1
	}

	/// Name of the issue type as Jira expects it in `issuetype.name`.
	pub fn api_name(self) -> &'static str {
		self.entry().2
	}

	/// Heading depth → type. Depth 2 is always a Story (first in the table); `Task` only comes from the remote.
	pub fn from_heading_depth(depth: usize) -> Option<Self> {
		TYPE_TABLE.iter().find(|(_, d, _)| *d == depth).map(|(kind, _, _)| *kind)
	}

	/// Parse a Jira type name. Jira cloud reports sub-tasks as either `Sub-task` or `Subtask`.
	pub fn from_api_name(name: &str) -> Option<Self> {
		let name = name.trim();
		if name.eq_ignore_ascii_case("subtask") {
			return Some(IssueType::Subtask);
		}
		TYPE_TABLE.iter().find(|(_, _, api)| api.eq_ignore_ascii_case(name)).map(|(kind, _, _)| *kind)
	}

	/// Remote type names we don't know are treated as plain tasks.
	pub fn from_api_name_lossy(name: &str) -> Self {
		Self::from_api_name(name).unwrap_or_else(|| {
			tracing::warn!("Unknown issue type '{name}', treating as Task");
			IssueType::Task
		})
	}

	/// Epics own stories and tasks.
	pub fn holds_epic(self) -> bool {
		matches!(self, IssueType::Epic)
	}

	/// Stories and tasks own subtasks.
	pub fn holds_subtasks(self) -> bool {
		matches!(self, IssueType::Story | IssueType::Task)
	}
}

impl fmt::Display for IssueType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.api_name())
	}
}

/// One ticket, either parsed from the document or read back from Jira.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Issue {
	/// Jira key (`PROJ-12`). Empty until the issue has been confirmed to exist remotely.
	pub key: String,
	pub kind: IssueType,
	pub summary: String,
	pub description: String,
	pub checklist: Checklist,
	/// Key of the owning epic (stories and tasks).
	pub epic_id: Option<String>,
	/// Key of the owning story (subtasks).
	pub parent_id: Option<String>,
}

impl Issue {
	pub fn new(kind: IssueType, summary: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			key: String::new(),
			kind,
			summary: summary.into().trim().to_string(),
			description: description.into().trim().to_string(),
			checklist: Checklist::default(),
			epic_id: None,
			parent_id: None,
		}
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();
		self
	}

	pub fn with_checklist(mut self, checklist: Checklist) -> Self {
		self.checklist = checklist;
		self
	}

	/// Whether the issue has been created or found remotely during this run.
	pub fn is_remote(&self) -> bool {
		!self.key.is_empty()
	}
}
