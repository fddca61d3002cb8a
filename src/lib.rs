pub mod cache;
pub mod config;
pub mod hash;
pub mod issue;
pub mod jira;
pub mod logging;
pub mod mock_jira;
pub mod payload;
pub mod reconcile;

// Re-export the issue model at crate root for convenience
pub use issue::{
	CHECKLIST_HEADER, Checklist, ChecklistItem, ChecklistStatus, DocumentParser, Issue, IssueType, ParseContext, ParseError, ParseOptions, adf_to_text, markdown_links_to_wiki,
	normalize_for_compare, parse_document, render_markdown,
};

/// A Markdown ATX heading: `# Content`, `## Content`, etc.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
	pub level: usize,
	pub content: String,
}

impl Header {
	/// Create a new header with the given level and content.
	/// Level must be >= 1.
	pub fn new(level: usize, content: impl Into<String>) -> Self {
		debug_assert!(level >= 1, "Header level must be >= 1");
		Self {
			level: level.max(1),
			content: content.into(),
		}
	}

	/// Decode a header from a line. Leading/trailing whitespace of the line is ignored.
	/// Returns None if the line is not a valid header.
	pub fn decode(s: &str) -> Option<Self> {
		let trimmed = s.trim();
		let level = trimmed.chars().take_while(|&ch| ch == '#').count();
		if level == 0 {
			return None;
		}
		// Valid header must have whitespace after the # characters
		let rest = &trimmed[level..];
		if !rest.starts_with(char::is_whitespace) {
			return None;
		}
		Some(Self {
			level,
			content: rest.trim().to_string(),
		})
	}

	/// Encode the header to a Markdown line.
	pub fn encode(&self) -> String {
		format!("{} {}", "#".repeat(self.level), self.content)
	}
}
