//! Typed request bodies for Jira's create/update issue endpoints.
//!
//! Every issue type has its own builder; the JSON shape is fixed by the `Serialize` impl:
//! ```json
//! { "fields": { "project": {"key": ..}, "summary": .., "description": .., "issuetype": {"name": ..}, ... } }
//! ```
//! plus the type-specific linkage field and, when configured, the checklist field.

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use smart_default::SmartDefault;

use crate::issue::{Checklist, Issue, IssueType};

/// Ids of the Jira custom fields md2jira writes to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, SmartDefault)]
pub struct FieldIds {
	/// "Epic Name", required when creating epics on classic projects.
	#[default("customfield_10011".to_string())]
	pub epic_name: String,
	/// "Epic Link" on stories and tasks.
	#[default("customfield_10014".to_string())]
	pub epic_link: String,
	/// Checklist text field. Checklist support is off when unset.
	pub checklist: Option<String>,
}

/// Type-specific part of a payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Linkage {
	Epic { field: String, epic_name: String },
	Story { field: String, epic_link: Option<String> },
	Subtask { parent: Option<String> },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChecklistField {
	pub field: String,
	pub text: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssuePayload {
	pub project_key: String,
	pub kind: IssueType,
	pub summary: String,
	pub description: String,
	pub linkage: Linkage,
	pub checklist: Option<ChecklistField>,
}

impl IssuePayload {
	/// Build the payload for `issue`, dispatching on its type.
	pub fn build(issue: &Issue, project_key: &str, fields: &FieldIds) -> Self {
		match issue.kind {
			IssueType::Epic => Self::epic(issue, project_key, fields),
			IssueType::Story | IssueType::Task => Self::story(issue, project_key, fields),
			IssueType::Subtask => Self::subtask(issue, project_key, fields),
		}
	}

	pub fn epic(issue: &Issue, project_key: &str, fields: &FieldIds) -> Self {
		let linkage = Linkage::Epic {
			field: fields.epic_name.clone(),
			epic_name: issue.summary.clone(),
		};
		Self::base(issue, project_key, fields, linkage)
	}

	pub fn story(issue: &Issue, project_key: &str, fields: &FieldIds) -> Self {
		let linkage = Linkage::Story {
			field: fields.epic_link.clone(),
			epic_link: non_empty(issue.epic_id.as_deref()),
		};
		Self::base(issue, project_key, fields, linkage)
	}

	pub fn subtask(issue: &Issue, project_key: &str, fields: &FieldIds) -> Self {
		let linkage = Linkage::Subtask {
			parent: non_empty(issue.parent_id.as_deref()),
		};
		Self::base(issue, project_key, fields, linkage)
	}

	fn base(issue: &Issue, project_key: &str, fields: &FieldIds, linkage: Linkage) -> Self {
		// Always sent when configured: an empty string is what clears the remote block.
		let checklist = fields.checklist.as_ref().map(|field| ChecklistField {
			field: field.clone(),
			text: issue.checklist.serialize(),
		});
		Self {
			project_key: project_key.to_string(),
			kind: issue.kind,
			summary: issue.summary.clone(),
			description: issue.description.trim().to_string(),
			linkage,
			checklist,
		}
	}

	/// The issue this payload describes, as it will exist remotely under `key`.
	pub fn to_issue(&self, key: &str) -> Issue {
		let mut issue = Issue::new(self.kind, self.summary.as_str(), self.description.as_str()).with_key(key);
		if let Some(checklist) = &self.checklist {
			issue.checklist = Checklist::parse(&checklist.text);
		}
		match &self.linkage {
			Linkage::Epic { .. } => {}
			Linkage::Story { epic_link, .. } => issue.epic_id = epic_link.clone(),
			Linkage::Subtask { parent } => issue.parent_id = parent.clone(),
		}
		issue
	}

	pub fn to_json(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or_default()
	}
}

fn non_empty(value: Option<&str>) -> Option<String> {
	value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[derive(Serialize)]
struct KeyRef<'a> {
	key: &'a str,
}

#[derive(Serialize)]
struct NameRef<'a> {
	name: &'a str,
}

/// The `fields` object of a payload.
struct Fields<'a>(&'a IssuePayload);

impl Serialize for Fields<'_> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let payload = self.0;
		let mut map = serializer.serialize_map(None)?;
		map.serialize_entry("project", &KeyRef { key: &payload.project_key })?;
		map.serialize_entry("summary", &payload.summary)?;
		map.serialize_entry("description", &payload.description)?;
		map.serialize_entry("issuetype", &NameRef { name: payload.kind.api_name() })?;
		match &payload.linkage {
			Linkage::Epic { field, epic_name } => map.serialize_entry(field, epic_name)?,
			Linkage::Story { field, epic_link: Some(epic) } => map.serialize_entry(field, epic)?,
			Linkage::Story { epic_link: None, .. } => {}
			Linkage::Subtask { parent: Some(parent) } => map.serialize_entry("parent", &KeyRef { key: parent })?,
			Linkage::Subtask { parent: None } => {}
		}
		if let Some(checklist) = &payload.checklist {
			map.serialize_entry(&checklist.field, &checklist.text)?;
		}
		map.end()
	}
}

impl Serialize for IssuePayload {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(1))?;
		map.serialize_entry("fields", &Fields(self))?;
		map.end()
	}
}
