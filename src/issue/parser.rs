//! Markdown document → ordered issue records.
//!
//! The parser is a two-state machine. In `DetectIssue` it waits for the first heading;
//! in `CollectDescription` every non-heading line belongs to the current issue, either
//! as description text or (when enabled) as a checklist item. An issue is finalized
//! when the next heading starts or the input ends.

use std::{iter::Enumerate, str::Lines, sync::LazyLock};

use regex::Regex;

use super::{
	checklist::{Checklist, ChecklistItem, ChecklistStatus},
	error::{ParseContext, ParseError},
	types::{Issue, IssueType},
	util::markdown_links_to_wiki,
};
use crate::Header;

static CHECKLIST_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\* \[(.)\] (.*)$").expect("valid checklist line regex"));
/// Bracket group followed by whitespace or end of line. `* [text](url)` is a link bullet, not a checkbox.
static CHECKLIST_CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\* \[[^\]]*\](\s|$)").expect("valid checklist candidate regex"));

#[derive(Clone, Copy, Debug, Default)]
pub struct ParseOptions {
	/// Treat `* [x] text` lines as checklist items instead of description text.
	pub checklists: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ParserState {
	DetectIssue,
	CollectDescription,
}

/// What a single input line means to the parser.
#[derive(Debug, PartialEq)]
enum LineKind<'a> {
	Heading(IssueType, String),
	Checklist(&'a str),
	Text(&'a str),
}

fn classify_line(line: &str, options: ParseOptions) -> LineKind<'_> {
	if let Some(header) = Header::decode(line)
		&& let Some(kind) = IssueType::from_heading_depth(header.level)
	{
		return LineKind::Heading(kind, header.content);
	}
	let trimmed = line.trim();
	if options.checklists && CHECKLIST_CANDIDATE_RE.is_match(trimmed) {
		return LineKind::Checklist(trimmed);
	}
	LineKind::Text(line)
}

/// Issue being assembled while its description is collected.
struct PendingIssue {
	kind: IssueType,
	summary: String,
	description: Vec<String>,
	checklist: Checklist,
}

impl PendingIssue {
	fn new(kind: IssueType, summary: String) -> Self {
		Self {
			kind,
			summary,
			description: Vec::new(),
			checklist: Checklist::default(),
		}
	}

	fn finish(self) -> Issue {
		tracing::debug!("[parse] finalized {} {:?}", self.kind, self.summary);
		Issue::new(self.kind, self.summary, self.description.join("\n")).with_checklist(self.checklist)
	}
}

/// Lazily yields issues in document order.
///
/// Iteration stops after the first error.
pub struct DocumentParser<'a> {
	lines: Enumerate<Lines<'a>>,
	ctx: &'a ParseContext,
	options: ParseOptions,
	state: ParserState,
	current: Option<PendingIssue>,
	done: bool,
}

impl<'a> DocumentParser<'a> {
	pub fn new(ctx: &'a ParseContext, options: ParseOptions) -> Self {
		Self {
			lines: ctx.content.lines().enumerate(),
			ctx,
			options,
			state: ParserState::DetectIssue,
			current: None,
			done: false,
		}
	}

	fn checklist_item(&self, line: &str, line_num: usize) -> Result<ChecklistItem, ParseError> {
		let caps = CHECKLIST_LINE_RE.captures(line).ok_or_else(|| ParseError::MalformedChecklist {
			src: self.ctx.named_source(),
			span: self.ctx.line_span(line_num),
			line: line_num,
		})?;
		Ok(ChecklistItem::new(&caps[2], ChecklistStatus::from_checkbox(&caps[1])))
	}

	fn fail(&mut self, err: ParseError) -> Option<Result<Issue, ParseError>> {
		self.done = true;
		self.current = None;
		Some(Err(err))
	}
}

impl Iterator for DocumentParser<'_> {
	type Item = Result<Issue, ParseError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		while let Some((idx, line)) = self.lines.next() {
			let line_num = idx + 1;
			match classify_line(line, self.options) {
				LineKind::Heading(kind, summary) => {
					tracing::debug!("[parse] line {line_num}: {kind} heading {summary:?}");
					self.state = ParserState::CollectDescription;
					if let Some(finished) = self.current.replace(PendingIssue::new(kind, summary)) {
						return Some(Ok(finished.finish()));
					}
				}
				LineKind::Checklist(item_line) => {
					if self.current.is_none() {
						let err = ParseError::OrphanChecklist {
							src: self.ctx.named_source(),
							span: self.ctx.line_span(line_num),
							line: line_num,
						};
						return self.fail(err);
					}
					let item = match self.checklist_item(item_line, line_num) {
						Ok(item) => item,
						Err(err) => return self.fail(err),
					};
					if let Some(current) = self.current.as_mut() {
						current.checklist.push(item);
					}
				}
				LineKind::Text(text) => match (self.state, self.current.as_mut()) {
					(ParserState::CollectDescription, Some(current)) => current.description.push(markdown_links_to_wiki(text.trim_end())),
					_ => tracing::debug!("[parse] line {line_num}: outside of any issue, skipping"),
				},
			}
		}

		self.done = true;
		self.current.take().map(|pending| Ok(pending.finish()))
	}
}

/// Parse the whole document, failing on the first malformed line.
pub fn parse_document(ctx: &ParseContext, options: ParseOptions) -> Result<Vec<Issue>, ParseError> {
	DocumentParser::new(ctx, options).collect()
}

/// Render issues back into the Markdown layout they were parsed from.
pub fn render_markdown(issues: &[Issue]) -> String {
	let mut out = String::new();
	for issue in issues {
		out.push_str(&Header::new(issue.kind.heading_depth(), issue.summary.as_str()).encode());
		out.push('\n');
		if !issue.description.is_empty() {
			out.push_str(&issue.description);
			out.push('\n');
		}
		for item in &issue.checklist.items {
			out.push_str(&item.to_string());
			out.push('\n');
		}
	}
	out
}
