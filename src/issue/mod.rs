//! Issue model and Markdown document parsing.
//!
//! This module contains the pure issue types, the checklist sub-format and
//! the document parser that turns headings into Epic/Story/Subtask records.

mod checklist;
pub use checklist::{CHECKLIST_HEADER, Checklist, ChecklistItem, ChecklistStatus};

mod error;
pub use error::{ParseContext, ParseError};

mod parser;
pub use parser::{DocumentParser, ParseOptions, parse_document, render_markdown};

mod types;
pub use types::{Issue, IssueType};

mod util;
pub use util::{adf_to_text, markdown_links_to_wiki, normalize_for_compare};
