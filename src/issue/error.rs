//! Error types for parsing Markdown documents.
//!
//! Uses miette for rich diagnostics with source code spans.

#![allow(unused_assignments)] // Fields are read by miette's derive macro via attributes

use miette::{Diagnostic, NamedSource, SourceSpan};

/// Error type for document parsing.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum ParseError {
	#[error("malformed checklist item on line {line}")]
	#[diagnostic(code(md2jira::parse::malformed_checklist), help("checklist items must be formatted as: '* [x] text', '* [ ] text' or '* [>] text'"))]
	MalformedChecklist {
		#[source_code]
		src: NamedSource<String>,
		#[label("expected '* [<one character>] <text>'")]
		span: SourceSpan,
		line: usize,
	},

	#[error("checklist item on line {line} does not belong to any issue")]
	#[diagnostic(code(md2jira::parse::orphan_checklist), help("put checklist items below an '#', '##' or '###' heading"))]
	OrphanChecklist {
		#[source_code]
		src: NamedSource<String>,
		#[label("no heading above this item")]
		span: SourceSpan,
		line: usize,
	},
}

/// Holds source content and filename for error reporting.
#[derive(Clone, Debug)]
pub struct ParseContext {
	pub content: String,
	pub filename: String,
}

impl ParseContext {
	pub fn new(content: String, filename: impl Into<String>) -> Self {
		Self { content, filename: filename.into() }
	}

	/// Create a NamedSource for miette diagnostics.
	pub fn named_source(&self) -> NamedSource<String> {
		NamedSource::new(&self.filename, self.content.clone())
	}

	/// Get byte offset for a given line number (1-indexed).
	pub fn line_offset(&self, line_num: usize) -> usize {
		self.content.split_inclusive('\n').take(line_num.saturating_sub(1)).map(str::len).sum()
	}

	/// Get span for an entire line (1-indexed line number).
	pub fn line_span(&self, line_num: usize) -> SourceSpan {
		let offset = self.line_offset(line_num);
		let len = self.content.lines().nth(line_num.saturating_sub(1)).map(str::len).unwrap_or(0);
		(offset, len).into()
	}
}
