//! Text cleanup for extracted block and link text.
//!
//! Malformed documents leave residual markup fragments in text output even
//! after parsing (`<<<< /p>`, `< /div>`, half-open tags the sanitizer
//! collapsed into literal text). `clean_text` scrubs those and normalizes the
//! whitespace the removal leaves behind.

use regex::Regex;
use std::sync::LazyLock;

/// Residual HTML-like fragments that sometimes survive parsing.
#[allow(clippy::expect_used)]
static MARKUP_GARBAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<+\s*/?\w*\s*>?").expect("valid regex"));

#[allow(clippy::expect_used)]
static WHITESPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse runs of whitespace into single spaces.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN_RE.replace_all(text, " ").into_owned()
}

/// Remove markup garbage from text, collapse the gaps, and trim.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let stripped = MARKUP_GARBAGE_RE.replace_all(text, "");
    collapse_whitespace(&stripped).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_partial_closing_tags() {
        assert_eq!(clean_text("Text <<<< /p> more"), "Text more");
        assert_eq!(clean_text("start < /div> end"), "start end");
    }

    #[test]
    fn removes_doubled_tag_fragments() {
        assert_eq!(clean_text("a <<tag>> b"), "a > b");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(clean_text("Hello World"), "Hello World");
    }

    #[test]
    fn collapses_whitespace_left_by_removal() {
        assert_eq!(clean_text("one  <p>   two"), "one two");
    }

    #[test]
    fn trims_result() {
        assert_eq!(clean_text("  padded  "), "padded");
    }

    #[test]
    fn collapse_whitespace_handles_newlines_and_tabs() {
        assert_eq!(collapse_whitespace("a\n\t b\r\nc"), "a b c");
    }
}
