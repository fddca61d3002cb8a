//! Shared test fixtures for integration tests.

use std::{
	path::{Path, PathBuf},
	process::{Command, Output},
};

use md2jira::{
	ParseContext, ParseOptions,
	cache::{CacheEntry, ChangeStore, DEFAULT_CACHE_FILE, TsvStore},
	mock_jira::MockJiraClient,
	parse_document,
	payload::FieldIds,
	reconcile::{Reconciler, SyncReport},
};
use rstest::fixture;
use tempfile::TempDir;

pub const PROJECT: &str = "PROJ";
pub const CHECKLIST_FIELD: &str = "customfield_10035";

/// A working directory with a cache file and an in-memory Jira.
pub struct SyncContext {
	pub dir: TempDir,
	pub client: MockJiraClient,
	pub checklists: bool,
}

impl SyncContext {
	pub fn new() -> Self {
		Self {
			dir: tempfile::tempdir().unwrap(),
			client: MockJiraClient::new(PROJECT),
			checklists: false,
		}
	}

	pub fn with_checklists(mut self) -> Self {
		self.checklists = true;
		self
	}

	pub fn fields(&self) -> FieldIds {
		FieldIds {
			checklist: self.checklists.then(|| CHECKLIST_FIELD.to_string()),
			..FieldIds::default()
		}
	}

	pub fn cache_path(&self) -> PathBuf {
		self.dir.path().join(DEFAULT_CACHE_FILE)
	}

	pub fn cache_entries(&self) -> Vec<CacheEntry> {
		TsvStore::new(self.cache_path()).entries().unwrap()
	}

	/// Parse `document` and reconcile it against the mock, caching in the temp dir.
	pub fn sync(&self, document: &str) -> SyncReport {
		let ctx = ParseContext::new(document.to_string(), "doc.md");
		let issues = parse_document(&ctx, ParseOptions { checklists: self.checklists }).unwrap();
		let mut store = TsvStore::new(self.cache_path());
		Reconciler::new(&self.client, &mut store, PROJECT, self.fields()).reconcile_all(issues).unwrap()
	}

	pub fn write(&self, name: &str, content: &str) -> PathBuf {
		let path = self.dir.path().join(name);
		std::fs::write(&path, content).unwrap();
		path
	}
}

#[fixture]
pub fn ctx() -> SyncContext {
	SyncContext::new()
}

/// Run the md2jira binary in `dir` with a clean environment.
pub fn run_binary(dir: &Path, args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_md2jira"))
		.args(args)
		.current_dir(dir)
		.env_clear()
		.env("NO_COLOR", "1")
		.output()
		.unwrap()
}
