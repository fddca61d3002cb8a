//! Running the binary itself: argument handling and the error paths that never reach Jira.

use rstest::rstest;

use crate::fixtures::{SyncContext, ctx, run_binary};

#[rstest]
fn test_dry_run_prints_hierarchy(ctx: SyncContext) {
	ctx.write("plan.md", "intro text\n# Epic\nSee [docs](https://example.com)\n## Story\n### Sub\n#### not a heading\n");
	let output = run_binary(ctx.dir.path(), &["--input", "plan.md", "--dry-run"]);

	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
	insta::assert_snapshot!(String::from_utf8_lossy(&output.stdout), @r"
	# Epic
	See [docs|https://example.com]
	## Story
	### Sub
	#### not a heading
	");
}

#[rstest]
fn test_missing_config_fails_before_any_request(ctx: SyncContext) {
	ctx.write("plan.md", "# Epic\n");
	let output = run_binary(ctx.dir.path(), &["-i", "plan.md"]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("JIRA_PROJECT_SUBDOMAIN"));
	assert!(!ctx.cache_path().exists());
}

#[rstest]
fn test_config_file_is_read_from_working_directory(ctx: SyncContext) {
	ctx.write("plan.md", "# Epic\n");
	ctx.write("md2jira.toml", "project_subdomain = \"acme\"\nauth_key = \"c2VjcmV0\"\n");
	let output = run_binary(ctx.dir.path(), &["-i", "plan.md"]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("project key"));
}

#[rstest]
fn test_malformed_checklist_is_a_parse_error(ctx: SyncContext) {
	ctx.write(".env", "JIRA_CHECKLIST_FIELD=customfield_10035\n");
	ctx.write("plan.md", "# Epic\n* [xx] broken\n");
	let output = run_binary(ctx.dir.path(), &["-i", "plan.md", "--dry-run"]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("Failed to parse plan.md"), "{stderr}");
}

#[rstest]
fn test_missing_input_file(ctx: SyncContext) {
	let output = run_binary(ctx.dir.path(), &["-i", "nope.md", "--dry-run"]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read nope.md"));
}
