//! Content fingerprint used for change detection.

use crate::issue::{Issue, normalize_for_compare};

/// MD5 over `summary:description:checklist`, hex encoded.
///
/// Description and checklist text go through the same normalization the diff uses,
/// so reformatting that the diff ignores does not change the fingerprint either.
pub fn content_hash(issue: &Issue) -> String {
	let description = normalize_for_compare(&issue.description);
	let checklist = normalize_for_compare(&issue.checklist.text());
	let material = format!("{}:{description}:{checklist}", issue.summary);
	format!("{:x}", md5::compute(material.as_bytes()))
}
