//! Fixed-width text helpers for the triage report.
//!
//! Report lines must keep a stable column layout even though some cells are
//! wrapped in ANSI color markers, so width bookkeeping here always counts
//! printable characters, never escape bytes.

use colored::{Color, Colorize};
use regex::Regex;
use std::sync::OnceLock;

/// Root of the long user-facing bug URL form.
pub const LONG_URL_ROOT: &str = "https://pad.lv/";

/// Prefix of the short bug reference that terminals autolink.
pub const SHORTLINK_ROOT: &str = "LP: #";

/// Width reserved for the bug number digits.
pub const BUG_NUMBER_LENGTH: usize = 7;

/// Width of the bug reference column.
///
/// Sized for the longer of the two reference prefixes so the column aligns
/// identically whichever form a report uses, and matches the header.
pub const BUG_COLUMN_WIDTH: usize = BUG_NUMBER_LENGTH
    + if LONG_URL_ROOT.len() > SHORTLINK_ROOT.len() {
        LONG_URL_ROOT.len()
    } else {
        SHORTLINK_ROOT.len()
    };

/// Truncate a string and hint visually if truncated.
///
/// The result is at most `length` characters; when truncation happened the
/// final character becomes `…` so the width still comes out exactly
/// `length`.
pub fn truncate_string(text: &str, length: usize) -> String {
    let mut truncated: String = text.chars().take(length).collect();
    if text.chars().count() > length {
        truncated.pop();
        truncated.push('…');
    }
    truncated
}

/// Mark text with the specified color.
///
/// Markers collapse to plain text when color output is disabled; layout code
/// must not count on their presence.
pub fn mark(text: &str, color: Color) -> String {
    text.color(color).to_string()
}

/// Count the printable status characters in a releases cell.
///
/// Release characters are always capital letters; everything else in the
/// cell is decoration or padding.
pub fn printable_len(text: &str) -> usize {
    text.chars().filter(char::is_ascii_uppercase).count()
}

/// Strip ANSI escape sequences, leaving the printable text.
pub fn strip_ansi(text: &str) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let re = ANSI.get_or_init(|| Regex::new("\u{1b}\\[[0-9;]*m").expect("static pattern"));
    re.replace_all(text, "").into_owned()
}

/// Header line matching the `compose_pretty` column layout.
pub fn header(extended: bool) -> String {
    let mut text = format!(
        "{:<w$} | {:<6} | {:<7} | {:<13} | {:<19} |",
        "Bug",
        "Flags",
        "Release",
        "Status",
        "Package",
        w = BUG_COLUMN_WIDTH
    );
    if extended {
        text.push_str(&format!(
            " {:<8} | {:<10} | {:<13} |",
            "Last Upd", "Prio", "Assignee"
        ));
    }
    text.push_str(&format!(" {:<60} |", "Title"));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // truncate_string Tests
    // ========================================================================

    #[test]
    fn test_truncate_replaces_last_char_with_ellipsis() {
        assert_eq!(truncate_string("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_string("abcdefghij", 5).chars().count(), 5);
    }

    #[test]
    fn test_truncate_leaves_short_strings_alone() {
        assert_eq!(truncate_string("abc", 5), "abc");
        assert_eq!(truncate_string("abcde", 5), "abcde");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_string("éééééé", 3), "éé…");
    }

    // ========================================================================
    // Width Bookkeeping Tests
    // ========================================================================

    #[test]
    fn test_printable_len_only_counts_capitals() {
        assert_eq!(printable_len("TD"), 2);
        assert_eq!(printable_len("T D  "), 2);
        assert_eq!(printable_len("\u{1b}[0;32mT\u{1b}[0mD"), 2);
        assert_eq!(printable_len("   "), 0);
    }

    #[test]
    fn test_strip_ansi_removes_escape_sequences() {
        let marked = format!("\u{1b}[0;36mX\u{1b}[0m plain");
        assert_eq!(strip_ansi(&marked), "X plain");
        assert_eq!(strip_ansi("no escapes"), "no escapes");
    }

    #[test]
    fn test_mark_preserves_printable_text() {
        let marked = mark("V", Color::Green);
        assert_eq!(strip_ansi(&marked), "V");
    }

    // ========================================================================
    // Header Tests
    // ========================================================================

    #[test]
    fn test_bug_column_fits_both_reference_forms() {
        assert_eq!(BUG_COLUMN_WIDTH, BUG_NUMBER_LENGTH + LONG_URL_ROOT.len());
        assert!(BUG_COLUMN_WIDTH >= BUG_NUMBER_LENGTH + SHORTLINK_ROOT.len());
    }

    #[test]
    fn test_header_column_counts() {
        assert_eq!(header(false).matches('|').count(), 6);
        assert_eq!(header(true).matches('|').count(), 9);
    }

    #[test]
    fn test_header_extended_shares_leading_columns() {
        let basic: Vec<String> = header(false).split('|').map(String::from).collect();
        let extended: Vec<String> = header(true).split('|').map(String::from).collect();
        // Bug through Package columns are identical in both modes
        assert_eq!(basic[..5], extended[..5]);
    }
}
