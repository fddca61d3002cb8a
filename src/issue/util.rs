//! Text helpers shared by the parser, the hasher and the diff.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid link regex"));

/// Normalize text before comparing or hashing it.
///
/// Trailing whitespace is stripped from every line, runs of blank lines collapse to a
/// single blank line, and the result is trimmed.
pub fn normalize_for_compare(text: &str) -> String {
	let mut out: Vec<&str> = Vec::new();
	let mut previous_blank = false;
	for line in text.lines() {
		let line = line.trim_end();
		let blank = line.is_empty();
		if blank && previous_blank {
			continue;
		}
		previous_blank = blank;
		out.push(line);
	}
	out.join("\n").trim().to_string()
}

/// Convert Markdown links into Jira wiki links: `[text](url)` → `[text|url]`.
pub fn markdown_links_to_wiki(line: &str) -> String {
	MD_LINK_RE.replace_all(line, "[$1|$2]").into_owned()
}

/// Flatten a Jira description into plain text.
///
/// Jira returns either a plain string, `null`, or an Atlassian Document Format tree.
/// Block nodes are separated by newlines, inline nodes are concatenated.
pub fn adf_to_text(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		Value::Object(_) => adf_node_to_text(value).trim().to_string(),
		other => {
			tracing::warn!("unexpected description shape, treating as empty: {other}");
			String::new()
		}
	}
}

fn adf_node_to_text(node: &Value) -> String {
	match node.get("type").and_then(Value::as_str) {
		Some("text") => node.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
		Some("hardBreak") => "\n".to_string(),
		_ => {
			let Some(children) = node.get("content").and_then(Value::as_array) else {
				return String::new();
			};
			let inline = children.iter().all(is_inline_node);
			let separator = if inline { "" } else { "\n" };
			children.iter().map(adf_node_to_text).collect::<Vec<_>>().join(separator)
		}
	}
}

fn is_inline_node(node: &Value) -> bool {
	matches!(
		node.get("type").and_then(Value::as_str),
		Some("text" | "hardBreak" | "mention" | "emoji" | "inlineCard" | "date" | "status")
	)
}
