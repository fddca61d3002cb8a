//! Verify mock calls through the JSON trace file written by the logging setup.

use md2jira::logging;
use rstest::rstest;

use crate::{
	assert_traced,
	fixtures::{SyncContext, ctx},
	tracing_utils::TraceLog,
};

fn traced<T>(ctx: &SyncContext, f: impl FnOnce() -> T) -> (T, TraceLog) {
	let trace_file = ctx.dir.path().join("trace.jsonl");
	let subscriber = logging::subscriber(false, Some(&trace_file)).unwrap();
	let out = tracing::subscriber::with_default(subscriber, f);
	(out, TraceLog::from_file(&trace_file))
}

#[rstest]
fn test_first_run_traces_find_then_create(ctx: SyncContext) {
	let (_, trace) = traced(&ctx, || ctx.sync("# Epic\nbody\n## Story\nbody2\n"));

	assert_traced!(trace, "find_issue", "Epic");
	assert_traced!(trace, "create_issue", "Epic");
	assert_traced!(trace, "create_issue", "Story");
	let methods: Vec<&str> = trace.mock_calls().iter().filter_map(|e| e.fields.message.as_deref()).collect();
	assert_eq!(methods, vec!["find_issue", "create_issue", "find_issue", "create_issue"]);

	let create = trace.mock_calls().into_iter().find(|e| e.fields.message.as_deref() == Some("create_issue")).unwrap();
	assert_eq!(create.fields.kind.as_deref(), Some("Epic"));
}

#[rstest]
fn test_unchanged_run_never_writes(ctx: SyncContext) {
	ctx.sync("# Epic\nbody\n");
	let (_, trace) = traced(&ctx, || ctx.sync("# Epic\nbody\n"));

	assert_traced!(trace, "find_issue");
	assert!(!trace.has_mock_call("create_issue"));
	assert!(!trace.has_mock_call("update_issue"));
}

#[rstest]
fn test_changed_run_traces_update_with_key(ctx: SyncContext) {
	ctx.sync("# Epic\nbody\n");
	let (_, trace) = traced(&ctx, || ctx.sync("# Epic\nnew body\n"));

	let update = trace.mock_calls().into_iter().find(|e| e.fields.message.as_deref() == Some("update_issue")).unwrap();
	assert_eq!(update.fields.key.as_deref(), Some("PROJ-1"));
	assert_eq!(update.fields.summary.as_deref(), Some("Epic"));
}

#[rstest]
fn test_failures_are_warned(ctx: SyncContext) {
	ctx.client.fail_create("Epic");
	let (report, trace) = traced(&ctx, || ctx.sync("# Epic\n"));

	assert_eq!(report.failures().count(), 1);
	assert_eq!(trace.warnings().len(), 1);
}
