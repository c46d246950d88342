//! Keep user-supplied text on one log line.
//!
//! Command text reaches the logs verbatim from players, so control characters
//! are escaped and long input is cut short.

use std::fmt::Write;

const MAX_PREVIEW: usize = 200;

/// Escape `s` for single-line logging, truncating after 200 characters.
pub fn escape_log(s: &str) -> String {
    escape_log_limited(s, MAX_PREVIEW)
}

/// Escape newlines, tabs, backslashes and other control characters (as
/// `\xNN`), appending `…` when more than `limit` characters were dropped.
pub fn escape_log_limited(s: &str, limit: usize) -> String {
    let mut out = String::with_capacity(s.len().min(limit) + 4);
    let mut chars = s.chars();
    for ch in chars.by_ref().take(limit) {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape_log("say hi\r\n\tbye"), "say hi\\r\\n\\tbye");
        assert_eq!(escape_log("a\\b"), "a\\\\b");
        assert_eq!(escape_log("bell\u{7}"), "bell\\x07");
    }

    #[test]
    fn truncates_long_input() {
        assert_eq!(escape_log_limited("abcdef", 3), "abc…");
        assert_eq!(escape_log_limited("abc", 3), "abc");
        assert_eq!(escape_log(&"x".repeat(500)).chars().count(), 201);
    }
}
