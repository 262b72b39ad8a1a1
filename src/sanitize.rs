//! String-level sanitization of raw HTML before structural parsing.
//!
//! Fixes run in a fixed order, byte-level first, then structural. Each fix is
//! gated by a cheap existence check before the substitution and appends a
//! warning only when it actually changed something. Sanitization never fails
//! on bad input; a fix that cannot apply is skipped and processing continues.
//!
//! Running the sanitizer on its own output is a fixed point: a second pass
//! changes nothing.

use regex::Regex;
use std::sync::LazyLock;

/// Doubled angle brackets around a tag name or slash, e.g. `<<p>>`.
/// Copy-paste corruption; collapse to a single bracket pair.
#[allow(clippy::expect_used)]
static DOUBLE_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<{2,}(/?[a-zA-Z][^>]*?)>{2,}").expect("valid regex"));

/// Doubled equals before a quoted attribute value, e.g. `href=="/path"`.
#[allow(clippy::expect_used)]
static DOUBLE_EQUALS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)==(["'])"#).expect("valid regex"));

/// Sanitize a raw HTML string.
///
/// Returns the sanitized string and an ordered list of applied-fix warnings.
#[must_use]
pub fn sanitize(html: &str) -> (String, Vec<String>) {
    let mut warnings = Vec::new();
    let mut sanitized = html.to_string();

    // NULL bytes crash many parsers and are never valid in HTML text.
    if sanitized.contains('\0') {
        sanitized = sanitized.replace('\0', "");
        warnings.push("Removed NULL bytes".to_string());
    }

    // Collapse doubled angle brackets so the parser sees a normal tag.
    if DOUBLE_BRACKET_RE.is_match(&sanitized) {
        sanitized = DOUBLE_BRACKET_RE.replace_all(&sanitized, "<$1>").into_owned();
        warnings.push("Fixed double angle brackets".to_string());
    }

    // A `<` not starting a tag is literal text; escape it so the parser does
    // not see a phantom tag.
    if let Some(escaped) = escape_stray_brackets(&sanitized) {
        sanitized = escaped;
        warnings.push("Escaped stray angle brackets".to_string());
    }

    // Doubled equals in attributes is a recurring CMS bug.
    if DOUBLE_EQUALS_RE.is_match(&sanitized) {
        sanitized = DOUBLE_EQUALS_RE.replace_all(&sanitized, "$1=$2").into_owned();
        warnings.push("Fixed malformed attributes (double equals)".to_string());
    }

    // Normalize line endings for consistent downstream processing.
    if sanitized.contains('\r') {
        sanitized = sanitized.replace("\r\n", "\n").replace('\r', "\n");
    }

    // Control characters (except tab/newline/CR, and CR is gone by now) cause
    // invisible parse failures or corrupt text output.
    if sanitized.chars().any(is_forbidden_control) {
        sanitized.retain(|c| !is_forbidden_control(c));
        warnings.push("Removed control characters".to_string());
    }

    (sanitized, warnings)
}

fn is_forbidden_control(c: char) -> bool {
    c < ' ' && c != '\t' && c != '\n' && c != '\r'
}

/// Escape every `<` not immediately followed by a letter, `/`, or `!`.
///
/// Returns `None` when nothing needed escaping. A manual scan because the
/// regex crate has no lookahead.
fn escape_stray_brackets(html: &str) -> Option<String> {
    let mut out = String::with_capacity(html.len());
    let mut changed = false;
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let starts_tag = matches!(chars.peek(), Some(&n) if n.is_ascii_alphabetic() || n == '/' || n == '!');
            if starts_tag {
                out.push('<');
            } else {
                out.push_str("&lt;");
                changed = true;
            }
        } else {
            out.push(c);
        }
    }

    changed.then_some(out)
}

/// Scan raw HTML for structural anomalies worth reporting to the analysis
/// stage. Cheap heuristics only; none of these block extraction.
#[must_use]
pub fn detect_anomalies(html: &str) -> Vec<String> {
    let mut anomalies = Vec::new();
    let lower = html.to_ascii_lowercase();

    if html.contains("<<") {
        anomalies.push("double_angle_brackets".to_string());
    }

    // Rough heuristic: a balanced document has one opener per closer, so the
    // total bracket count is twice the closer count. Void tags skew this, but
    // the tag is advisory only.
    if html.contains("</") && html.matches('<').count() != 2 * html.matches("</").count() {
        anomalies.push("possible_unclosed_tags".to_string());
    }

    // Orphan closing tags: more closers than openers for common containers
    for tag in ["span", "div", "p", "footer", "section"] {
        let opening = lower.matches(&format!("<{tag}")).count();
        let closing = lower.matches(&format!("</{tag}>")).count();
        if closing > opening {
            anomalies.push(format!("orphan_closing_{tag}"));
        }
    }

    if lower.contains("href==") {
        anomalies.push("malformed_href_attribute".to_string());
    }

    if html.contains("HREF=") || html.contains("SRC=") {
        anomalies.push("uppercase_attributes".to_string());
    }

    for handler in ["onclick", "onload", "onerror", "onmouseover"] {
        if lower.contains(handler) {
            anomalies.push("has_event_handlers".to_string());
            break;
        }
    }

    anomalies
}
