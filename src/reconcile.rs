//! Find → diff → create-or-update → cache, one issue at a time.
//!
//! Hierarchy state (current epic, current parent) is an explicit `ReconcileContext` that each
//! step takes and hands back, so siblings see the keys their predecessors were given.

use std::fmt;

use derive_more::Display;
use tracing::instrument;

use crate::{
	cache::{CacheError, ChangeStore},
	hash::content_hash,
	issue::{Issue, IssueType, normalize_for_compare},
	jira::{JiraClient, RemoteError},
	payload::{FieldIds, IssuePayload},
};

/// Keys of the most recently seen epic and story/task.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReconcileContext {
	pub epic_id: Option<String>,
	pub parent_id: Option<String>,
}

impl ReconcileContext {
	/// Point `issue` at its owner: stories/tasks at the epic, subtasks at the story.
	pub fn attach(&self, issue: &mut Issue) {
		match issue.kind {
			IssueType::Epic => {}
			IssueType::Story | IssueType::Task => issue.epic_id = self.epic_id.clone(),
			IssueType::Subtask => issue.parent_id = self.parent_id.clone(),
		}
	}

	/// Context after an issue of `kind` was resolved to `key` (`None`: it could not be).
	///
	/// A new epic leaves `parent_id` alone; subtasks never change the context.
	pub fn advance(self, kind: IssueType, key: Option<String>) -> Self {
		match kind {
			IssueType::Epic => Self { epic_id: key, ..self },
			IssueType::Story | IssueType::Task => Self { parent_id: key, ..self },
			IssueType::Subtask => self,
		}
	}
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ChangedField {
	#[display("summary")]
	Summary,
	#[display("description")]
	Description,
	#[display("checklist")]
	Checklist,
}

/// Fields in which a local issue differs from its remote counterpart.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IssueDiff {
	pub fields: Vec<ChangedField>,
}

impl IssueDiff {
	pub fn is_changed(&self) -> bool {
		!self.fields.is_empty()
	}
}

impl fmt::Display for IssueDiff {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let names: Vec<String> = self.fields.iter().map(ToString::to_string).collect();
		f.write_str(&names.join(", "))
	}
}

/// Compare the parts of an issue that get written to Jira, normalized the same way the hash is.
pub fn diff_issues(local: &Issue, remote: &Issue) -> IssueDiff {
	let mut fields = Vec::new();
	if local.summary != remote.summary {
		fields.push(ChangedField::Summary);
	}
	if normalize_for_compare(&local.description) != normalize_for_compare(&remote.description) {
		fields.push(ChangedField::Description);
	}
	if normalize_for_compare(&local.checklist.text()) != normalize_for_compare(&remote.checklist.text()) {
		fields.push(ChangedField::Checklist);
	}
	IssueDiff { fields }
}

#[derive(Debug, Display)]
pub enum Outcome {
	#[display("created")]
	Created,
	#[display("updated")]
	Updated,
	#[display("up to date, skipping")]
	UpToDate,
	#[display("unchanged, cache seeded")]
	CacheSeeded,
	#[display("failed: {_0}")]
	Failed(RemoteError),
}

impl Outcome {
	pub fn is_failure(&self) -> bool {
		matches!(self, Outcome::Failed(_))
	}
}

/// What happened to one issue.
#[derive(Debug)]
pub struct IssueReport {
	/// The issue as processed: key backfilled when it was found or created.
	pub issue: Issue,
	pub outcome: Outcome,
	/// `[diff]`, `[cache-hit]`, `[cache-miss]` lines, shown in verbose mode.
	pub notes: Vec<String>,
}

impl fmt::Display for IssueReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let key = if self.issue.is_remote() { self.issue.key.as_str() } else { "-" };
		write!(f, "{:<8} {:<10} {}: {}", self.issue.kind, key, self.issue.summary, self.outcome)
	}
}

#[derive(Debug, Default)]
pub struct SyncReport {
	pub issues: Vec<IssueReport>,
}

impl SyncReport {
	pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
		self.issues.iter().filter(|r| pred(&r.outcome)).count()
	}

	pub fn failures(&self) -> impl Iterator<Item = &IssueReport> {
		self.issues.iter().filter(|r| r.outcome.is_failure())
	}
}

impl fmt::Display for SyncReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} created, {} updated, {} up to date, {} cache seeded, {} failed",
			self.count(|o| matches!(o, Outcome::Created)),
			self.count(|o| matches!(o, Outcome::Updated)),
			self.count(|o| matches!(o, Outcome::UpToDate)),
			self.count(|o| matches!(o, Outcome::CacheSeeded)),
			self.count(Outcome::is_failure),
		)
	}
}

pub struct Reconciler<'a> {
	client: &'a dyn JiraClient,
	store: &'a mut dyn ChangeStore,
	project_key: String,
	fields: FieldIds,
}

impl<'a> Reconciler<'a> {
	pub fn new(client: &'a dyn JiraClient, store: &'a mut dyn ChangeStore, project_key: impl Into<String>, fields: FieldIds) -> Self {
		Self {
			client,
			store,
			project_key: project_key.into(),
			fields,
		}
	}

	/// Reconcile issues in document order. Remote failures are recorded per issue; only cache I/O aborts the run.
	#[instrument(skip_all, fields(project = %self.project_key))]
	pub fn reconcile_all(&mut self, issues: impl IntoIterator<Item = Issue>) -> Result<SyncReport, CacheError> {
		let mut report = SyncReport::default();
		let mut ctx = ReconcileContext::default();
		for issue in issues {
			let (entry, next) = self.process_issue(issue, ctx)?;
			if let Outcome::Failed(e) = &entry.outcome {
				tracing::warn!("{} '{}' failed: {e}", entry.issue.kind, entry.issue.summary);
			}
			report.issues.push(entry);
			ctx = next;
		}
		tracing::info!("{report}");
		Ok(report)
	}

	#[instrument(skip(self, issue, ctx), fields(kind = %issue.kind, summary = %issue.summary))]
	pub fn process_issue(&mut self, mut issue: Issue, ctx: ReconcileContext) -> Result<(IssueReport, ReconcileContext), CacheError> {
		ctx.attach(&mut issue);
		let mut notes = Vec::new();

		let remote = match self.client.find_issue(&self.project_key, &issue.summary) {
			Ok(remote) => remote,
			Err(e) => {
				let ctx = ctx.advance(issue.kind, None);
				return Ok((IssueReport { issue, outcome: Outcome::Failed(e), notes }, ctx));
			}
		};

		let (outcome, ctx) = match remote {
			Some(remote) => {
				issue.key = remote.key.clone();
				// a depth-2 heading may match a remote Task; keep the remote type
				if remote.kind.heading_depth() == issue.kind.heading_depth() {
					issue.kind = remote.kind;
				}
				let ctx = ctx.advance(remote.kind, Some(remote.key.clone()));

				let diff = diff_issues(&issue, &remote);
				let outcome = if diff.is_changed() {
					notes.push(format!("[diff] {}: {diff}", issue.key));
					self.update(&issue)?
				} else {
					let hash = content_hash(&issue);
					match self.store.get(&issue.key)? {
						Some(cached) if cached == hash => {
							notes.push(format!("[cache-hit] {} {hash}", issue.key));
							Outcome::UpToDate
						}
						cached => {
							notes.push(format!("[cache-miss] {} {} -> {hash}", issue.key, cached.as_deref().unwrap_or("none")));
							self.store.put(&issue.key, &issue.summary, &hash)?;
							Outcome::CacheSeeded
						}
					}
				};
				(outcome, ctx)
			}
			None => {
				let payload = IssuePayload::build(&issue, &self.project_key, &self.fields);
				match self.client.create_issue(&payload) {
					Ok(created) => {
						tracing::info!("Created {} {} '{}'", issue.kind, created.key, issue.summary);
						issue.key = created.key;
						self.store.put(&issue.key, &issue.summary, &content_hash(&issue))?;
						(Outcome::Created, ctx.advance(issue.kind, Some(issue.key.clone())))
					}
					Err(e) => (Outcome::Failed(e), ctx.advance(issue.kind, None)),
				}
			}
		};

		for note in &notes {
			tracing::debug!("{note}");
		}
		Ok((IssueReport { issue, outcome, notes }, ctx))
	}

	fn update(&mut self, issue: &Issue) -> Result<Outcome, CacheError> {
		let payload = IssuePayload::build(issue, &self.project_key, &self.fields);
		match self.client.update_issue(&issue.key, &payload) {
			Ok(_) => {
				tracing::info!("Updated {} {} '{}'", issue.kind, issue.key, issue.summary);
				self.store.put(&issue.key, &issue.summary, &content_hash(issue))?;
				Ok(Outcome::Updated)
			}
			Err(e) => Ok(Outcome::Failed(e)),
		}
	}
}
