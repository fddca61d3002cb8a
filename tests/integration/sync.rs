//! End-to-end runs: Markdown document → reconciler → mock Jira + TSV cache.

use md2jira::{Issue, IssueType, hash::content_hash, reconcile::Outcome};
use rstest::rstest;

use crate::fixtures::{CHECKLIST_FIELD, SyncContext, ctx};

const DOCUMENT: &str = "\
# Launch
Everything for the launch.
## Landing page
Build it, see [the mockup](https://example.com/mock).
### Copy
Write the copy.
## Pricing
";

fn outcomes(report: &md2jira::reconcile::SyncReport) -> Vec<String> {
	report.issues.iter().map(|r| r.outcome.to_string()).collect()
}

#[rstest]
fn test_first_run_creates_hierarchy(ctx: SyncContext) {
	let report = ctx.sync(DOCUMENT);
	assert_eq!(outcomes(&report), vec!["created"; 4]);

	let issues = ctx.client.issues();
	let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
	assert_eq!(keys, vec!["PROJ-1", "PROJ-2", "PROJ-3", "PROJ-4"]);
	assert_eq!(issues[1].epic_id.as_deref(), Some("PROJ-1"));
	assert_eq!(issues[2].parent_id.as_deref(), Some("PROJ-2"));
	assert_eq!(issues[3].epic_id.as_deref(), Some("PROJ-1"));
	assert_eq!(issues[1].description, "Build it, see [the mockup|https://example.com/mock].");

	let cached: Vec<String> = ctx.cache_entries().into_iter().map(|e| e.key).collect();
	assert_eq!(cached, keys);
}

#[rstest]
fn test_second_run_is_a_noop(ctx: SyncContext) {
	ctx.sync(DOCUMENT);
	let report = ctx.sync(DOCUMENT);

	assert_eq!(outcomes(&report), vec!["up to date, skipping"; 4]);
	assert_eq!(ctx.client.created_payloads().len(), 4);
	assert!(ctx.client.updated_payloads().is_empty());
	insta::assert_snapshot!(report.to_string(), @"0 created, 0 updated, 4 up to date, 0 cache seeded, 0 failed");
}

#[rstest]
fn test_edit_updates_only_the_changed_issue(ctx: SyncContext) {
	ctx.sync(DOCUMENT);
	let edited = DOCUMENT.replace("Write the copy.", "Write the copy.\nThen proofread it.");
	let report = ctx.sync(&edited);

	assert_eq!(outcomes(&report), vec!["up to date, skipping", "up to date, skipping", "updated", "up to date, skipping"]);
	let updated = ctx.client.updated_payloads();
	assert_eq!(updated.len(), 1);
	assert_eq!(updated[0].0, "PROJ-3");
	assert_eq!(updated[0].1.description, "Write the copy.\nThen proofread it.");

	let copy = &report.issues[2].issue;
	let entry = ctx.cache_entries().into_iter().find(|e| e.key == "PROJ-3").unwrap();
	assert_eq!(entry.hash, content_hash(copy));
}

#[rstest]
fn test_lost_cache_is_reseeded_without_writes(ctx: SyncContext) {
	ctx.sync(DOCUMENT);
	std::fs::remove_file(ctx.cache_path()).unwrap();

	let report = ctx.sync(DOCUMENT);
	assert_eq!(outcomes(&report), vec!["unchanged, cache seeded"; 4]);
	assert!(ctx.client.updated_payloads().is_empty());
	assert_eq!(ctx.cache_entries().len(), 4);
}

#[rstest]
fn test_existing_remote_issues_are_adopted(ctx: SyncContext) {
	let epic = ctx.client.add_issue(Issue::new(IssueType::Epic, "Launch", "Everything for the launch."));
	ctx.client.add_issue(Issue::new(IssueType::Epic, "Launch v2", ""));

	let report = ctx.sync("# Launch\nEverything for the launch.\n## Pricing\n");
	assert_eq!(report.issues[0].issue.key, epic);
	assert!(matches!(report.issues[0].outcome, Outcome::CacheSeeded));
	assert_eq!(report.issues[1].issue.epic_id.as_deref(), Some(epic.as_str()));
}

#[rstest]
fn test_failed_story_does_not_stop_the_run(ctx: SyncContext) {
	ctx.client.fail_create("Landing page");
	let report = ctx.sync(DOCUMENT);

	assert_eq!(report.failures().count(), 2, "story and its subtask fail");
	assert!(matches!(report.issues[3].outcome, Outcome::Created));
	let cached: Vec<String> = ctx.cache_entries().into_iter().map(|e| e.summary).collect();
	assert_eq!(cached, vec!["Launch", "Pricing"]);

	// next run retries only what is still missing
	let report = ctx.sync(DOCUMENT);
	assert_eq!(report.failures().count(), 2);
	assert!(matches!(report.issues[0].outcome, Outcome::UpToDate));
	assert_eq!(ctx.client.issues().len(), 2);
}

#[test]
fn test_checklist_round_trip() {
	let ctx = SyncContext::new().with_checklists();
	let document = "# Epic\n## Story\nbody\n* [x] design\n* [ ] build\n* [>] review\n";
	let report = ctx.sync(document);
	assert!(matches!(report.issues[1].outcome, Outcome::Created));

	let payload = &ctx.client.created_payloads()[1];
	insta::assert_snapshot!(payload.to_json()["fields"][CHECKLIST_FIELD].as_str().unwrap().trim_end(), @r"
	# Default Checklist
	* [x] design
	* [ ] build
	* [>] review
	");

	let report = ctx.sync(document);
	assert!(matches!(report.issues[1].outcome, Outcome::UpToDate));

	let report = ctx.sync(&document.replace("* [ ] build", "* [x] build"));
	assert!(matches!(report.issues[1].outcome, Outcome::Updated));
	assert_eq!(report.issues[1].notes, vec!["[diff] PROJ-2: checklist".to_string()]);
}

#[test]
fn test_clearing_checklist_converges() {
	let ctx = SyncContext::new().with_checklists();
	let document = "# Epic\n## Story\nbody\n* [x] design\n* [ ] build\n";
	ctx.sync(document);
	assert_eq!(ctx.client.get_issue("PROJ-2").unwrap().checklist.len(), 2);

	let cleared = "# Epic\n## Story\nbody\n";
	let report = ctx.sync(cleared);
	assert!(matches!(report.issues[1].outcome, Outcome::Updated));
	let (key, payload) = ctx.client.updated_payloads().pop().unwrap();
	assert_eq!(key, "PROJ-2");
	assert_eq!(payload.to_json()["fields"][CHECKLIST_FIELD], "");
	assert!(ctx.client.get_issue("PROJ-2").unwrap().checklist.is_empty());

	let report = ctx.sync(cleared);
	assert!(matches!(report.issues[1].outcome, Outcome::UpToDate));
}

#[rstest]
fn test_undecodable_cache_is_not_fatal(ctx: SyncContext) {
	std::fs::write(ctx.cache_path(), b"PROJ-1\t\"\xff\"\tabc\n").unwrap();
	let report = ctx.sync(DOCUMENT);
	assert_eq!(report.failures().count(), 0);
	assert_eq!(ctx.cache_entries().len(), 4);
}
