//! Unified diffs for differing key/output files
//!
//! Purely diagnostic: the verdict comes from [`crate::compare()`], this only
//! renders what changed when both sides are text.

use std::path::Path;
use similar::TextDiff;

/// Unified diff of two files, or `None` if either is unreadable or not UTF-8.
pub fn unified_diff(left: &Path, right: &Path, left_label: &str, right_label: &str) -> Option<String> {
    let left_text = String::from_utf8(std::fs::read(left).ok()?).ok()?;
    let right_text = String::from_utf8(std::fs::read(right).ok()?).ok()?;
    Some(diff_text(&left_text, &right_text, left_label, right_label))
}

/// Unified diff of two strings.
pub fn diff_text(left: &str, right: &str, left_label: &str, right_label: &str) -> String {
    TextDiff::from_lines(left, right)
        .unified_diff()
        .header(left_label, right_label)
        .to_string()
}
