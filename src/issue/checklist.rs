//! Checklist block attached to an issue.
//!
//! The block format is a fixed title line followed by one checkbox line per item:
//! ```text
//! # Default Checklist
//! * [x] Done item
//! * [ ] Open item
//! * [>] Item in progress
//! ```

use std::{borrow::Cow, fmt, sync::LazyLock};

use regex::Regex;

/// Title line written at the top of every serialized checklist.
pub const CHECKLIST_HEADER: &str = "# Default Checklist";

/// Item line inside a stored checklist block. The status may be a shorthand or a word (`[in progress]`).
static BLOCK_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*\s+\[([^\]]*)\]\s+(.*)$").expect("valid checklist item regex"));

/// Status of a single checklist item.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ChecklistStatus {
	#[default]
	Open,
	InProgress,
	Skipped,
	Done,
}

impl ChecklistStatus {
	/// Parse the content between the brackets of `* [..]`.
	///
	/// One-character shorthands are tried first; anything else is title-cased into a variant
	/// name (`in progress` → `InProgress`). Unknown names fall back to `Open`.
	pub fn from_checkbox(content: &str) -> Self {
		match content {
			"x" | "X" => ChecklistStatus::Done,
			"" | " " => ChecklistStatus::Open,
			">" => ChecklistStatus::InProgress,
			"-" => ChecklistStatus::Skipped,
			other => Self::from_name(other).unwrap_or_else(|| {
				tracing::debug!("[checklist] unknown status {other:?}, defaulting to Open");
				ChecklistStatus::default()
			}),
		}
	}

	fn from_name(name: &str) -> Option<Self> {
		let title_cased: String = name
			.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
			.filter(|word| !word.is_empty())
			.map(|word| {
				let mut chars = word.chars();
				match chars.next() {
					Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
					None => String::new(),
				}
			})
			.collect();

		match title_cased.as_str() {
			"Open" => Some(ChecklistStatus::Open),
			"InProgress" => Some(ChecklistStatus::InProgress),
			"Skipped" => Some(ChecklistStatus::Skipped),
			"Done" => Some(ChecklistStatus::Done),
			_ => None,
		}
	}

	/// Shorthand written between the brackets on serialization.
	pub fn to_checkbox(self) -> char {
		match self {
			ChecklistStatus::Open => ' ',
			ChecklistStatus::InProgress => '>',
			ChecklistStatus::Skipped => '-',
			ChecklistStatus::Done => 'x',
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChecklistItem {
	pub text: String,
	pub status: ChecklistStatus,
}

impl ChecklistItem {
	pub fn new(text: impl Into<String>, status: ChecklistStatus) -> Self {
		Self {
			text: text.into().trim().to_string(),
			status,
		}
	}
}

impl fmt::Display for ChecklistItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "* [{}] {}", self.status.to_checkbox(), self.text)
	}
}

/// Ordered checklist items, plus the raw block they were read from (if any).
///
/// Equality only looks at the items, so a re-serialized block compares equal to its source.
#[derive(Clone, Debug, Default)]
pub struct Checklist {
	pub items: Vec<ChecklistItem>,
	/// Block text as stored remotely. Kept even when it yields no items.
	pub raw: Option<String>,
}

impl Checklist {
	/// Parse a stored checklist block. The first line is the title and is ignored;
	/// lines that are not checkbox items are skipped.
	pub fn parse(block: &str) -> Self {
		let items = block
			.lines()
			.skip(1)
			.filter_map(|line| {
				let caps = BLOCK_ITEM_RE.captures(line.trim())?;
				Some(ChecklistItem::new(&caps[2], ChecklistStatus::from_checkbox(&caps[1])))
			})
			.collect();

		Self {
			items,
			raw: Some(block.to_string()),
		}
	}

	/// Render the fixed block format. An empty checklist renders as an empty string.
	pub fn serialize(&self) -> String {
		if self.items.is_empty() {
			return String::new();
		}
		let mut out = String::from(CHECKLIST_HEADER);
		out.push('\n');
		for item in &self.items {
			out.push_str(&item.to_string());
			out.push('\n');
		}
		out
	}

	/// Text that identifies this checklist for hashing: the raw block if we have one, otherwise the serialized form.
	pub fn text(&self) -> Cow<'_, str> {
		match &self.raw {
			Some(raw) => Cow::Borrowed(raw.as_str()),
			None => Cow::Owned(self.serialize()),
		}
	}

	pub fn push(&mut self, item: ChecklistItem) {
		self.items.push(item);
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}
}

impl PartialEq for Checklist {
	fn eq(&self, other: &Self) -> bool {
		self.items == other.items
	}
}

impl Eq for Checklist {}

impl FromIterator<ChecklistItem> for Checklist {
	fn from_iter<T: IntoIterator<Item = ChecklistItem>>(iter: T) -> Self {
		Self {
			items: iter.into_iter().collect(),
			raw: None,
		}
	}
}
