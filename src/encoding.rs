//! Character encoding detection and repair.
//!
//! Detection scans the first bytes of a raw document for a charset
//! declaration and maps it to its browser-equivalent encoding: every
//! renderer treats `iso-8859-1` as `windows-1252` (identical through 0x7F,
//! but the code page defines glyphs above it), and `Encoding::for_label`
//! implements exactly that WHATWG remapping. Repair depends on getting the
//! renderer-equivalent charset, not the nominally-declared one.
//!
//! Repair reverses the common failure mode where bytes authored in UTF-8 are
//! decoded with a declared legacy charset (or vice versa), producing mojibake.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// Charset declarations must appear early per the HTML spec (1024 bytes);
/// scan double that for safety.
const DETECTION_WINDOW: usize = 2048;

/// Match `<meta charset="...">`.
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([^\s"';>]+)"#).expect("valid regex")
});

/// Match legacy `<meta http-equiv="Content-Type" content="...; charset=...">`.
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+content\s*=\s*["'][^"']*charset=([^\s"';>]+)"#)
        .expect("valid regex")
});

/// Detect the browser-equivalent encoding from raw HTML bytes.
///
/// Looks for the modern `<meta charset>` form first, then the legacy
/// content-type form, case-insensitively. Defaults to UTF-8 when nothing is
/// found or the label is unknown.
#[must_use]
pub fn detect_encoding(raw: &[u8]) -> &'static Encoding {
    let head = &raw[..raw.len().min(DETECTION_WINDOW)];
    let head_str = String::from_utf8_lossy(head);

    if let Some(label) = extract_charset(&head_str) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return encoding;
        }
    }

    if let Some(label) = extract_content_type_charset(&head_str) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return encoding;
        }
    }

    UTF_8
}

/// Detect the browser-equivalent charset label from raw HTML bytes.
#[must_use]
pub fn detect_charset_label(raw: &[u8]) -> String {
    detect_encoding(raw).name().to_ascii_lowercase()
}

/// Normalize an arbitrary charset label to its browser-equivalent form.
///
/// Unknown labels pass through lowercased, as the original declaration is
/// still more informative than nothing.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    Encoding::for_label(label.trim().as_bytes())
        .map_or_else(|| label.trim().to_ascii_lowercase(), |e| e.name().to_ascii_lowercase())
}

fn extract_charset(head: &str) -> Option<String> {
    CHARSET_META_RE
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_content_type_charset(head: &str) -> Option<String> {
    CONTENT_TYPE_CHARSET_RE
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decode raw bytes with the document's own declared encoding.
///
/// This reproduces what a browser honoring the declaration would display,
/// mojibake included when the declaration lies about the actual bytes. That
/// is the "raw" truth that block extraction preserves. Invalid sequences become the
/// replacement character; the flag reports whether any replacement happened.
#[must_use]
pub fn decode_bytes(raw: &[u8]) -> (String, bool) {
    let encoding = detect_encoding(raw);
    let (decoded, _, had_errors) = encoding.decode(raw);
    (decoded.into_owned(), had_errors)
}

/// Repair mojibake via a byte round-trip through the declared charset.
///
/// Re-encodes the text with the declared charset's byte mapping, then decodes
/// those bytes as UTF-8. No-op when the charset is UTF-8, unset, or unknown.
/// On any encode/decode failure the original text is returned unchanged;
/// repair is best-effort and never fails.
#[must_use]
pub fn repair_text(text: &str, declared_charset: Option<&str>) -> String {
    let Some(label) = declared_charset else {
        return text.to_string();
    };
    let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
        return text.to_string();
    };
    if encoding == UTF_8 {
        return text.to_string();
    }

    let (bytes, _, had_unmappable) = encoding.encode(text);
    if had_unmappable {
        // Some characters have no byte in the declared charset; the text was
        // not produced by mis-decoding those bytes, so leave it alone.
        return text.to_string();
    }

    match std::str::from_utf8(&bytes) {
        Ok(repaired) => repaired.to_string(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_utf8_from_meta_charset() {
        let html = br#"<html><head><meta charset="utf-8"></head><body>Test</body></html>"#;
        assert_eq!(detect_encoding(html), UTF_8);
    }

    #[test]
    fn detect_iso88591_maps_to_windows1252() {
        // WHATWG: every browser treats iso-8859-1 as its windows-1252 superset
        let html = br#"<html><head><meta charset="ISO-8859-1"></head><body>Test</body></html>"#;
        assert_eq!(detect_encoding(html).name(), "windows-1252");
    }

    #[test]
    fn detect_from_legacy_content_type() {
        let html = br#"<meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-9">"#;
        assert_eq!(detect_encoding(html).name(), "windows-1254");
    }

    #[test]
    fn detect_defaults_to_utf8() {
        assert_eq!(detect_encoding(b"<html><body>Test</body></html>"), UTF_8);
    }

    #[test]
    fn detect_ignores_declarations_past_window() {
        let mut html = Vec::new();
        html.extend_from_slice(b"<html><head>");
        html.extend_from_slice(" ".repeat(DETECTION_WINDOW).as_bytes());
        html.extend_from_slice(br#"<meta charset="windows-1252">"#);
        assert_eq!(detect_encoding(&html), UTF_8);
    }

    #[test]
    fn detect_charset_without_quotes() {
        let html = b"<meta charset=windows-1252>";
        assert_eq!(detect_charset_label(html), "windows-1252");
    }

    #[test]
    fn normalize_label_applies_whatwg_mapping() {
        assert_eq!(normalize_label("latin1"), "windows-1252");
        assert_eq!(normalize_label("US-ASCII"), "windows-1252");
        assert_eq!(normalize_label(" UTF8 "), "utf-8");
    }

    #[test]
    fn normalize_label_passes_unknown_through() {
        assert_eq!(normalize_label("x-no-such-charset"), "x-no-such-charset");
    }

    #[test]
    fn decode_bytes_honors_declaration() {
        // 0xE9 is é in windows-1252
        let html = b"<html><head><meta charset=\"windows-1252\"></head><body>Caf\xE9</body></html>";
        let (decoded, had_errors) = decode_bytes(html);
        assert!(decoded.contains("Caf\u{e9}"));
        assert!(!had_errors);
    }

    #[test]
    fn decode_bytes_preserves_mojibake_for_misdeclared_utf8() {
        // UTF-8 right single quote bytes under a windows-1252 declaration
        let html =
            b"<html><head><meta charset=\"iso-8859-1\"></head><body>It\xE2\x80\x99s</body></html>";
        let (decoded, _) = decode_bytes(html);
        assert!(decoded.contains("It\u{e2}\u{20ac}\u{2122}s"));
    }

    #[test]
    fn repair_is_noop_for_utf8_and_unset() {
        assert_eq!(repair_text("café", Some("utf-8")), "café");
        assert_eq!(repair_text("café", Some("UTF8")), "café");
        assert_eq!(repair_text("café", None), "café");
    }

    #[test]
    fn repair_reverses_windows1252_mojibake() {
        // "It’s" authored as UTF-8 but decoded as windows-1252
        assert_eq!(repair_text("It\u{e2}\u{20ac}\u{2122}s", Some("windows-1252")), "It’s");
        // Curly double quotes
        assert_eq!(
            repair_text("\u{e2}\u{20ac}\u{153}quoted\u{e2}\u{20ac}\u{9d}", Some("iso-8859-1")),
            "\u{201c}quoted\u{201d}"
        );
    }

    #[test]
    fn repair_leaves_clean_text_alone() {
        // Plain ASCII round-trips to itself under any single-byte charset
        assert_eq!(repair_text("plain text", Some("windows-1252")), "plain text");
    }

    #[test]
    fn repair_falls_back_on_unmappable_chars() {
        // Already-correct text that cannot round-trip stays unchanged
        assert_eq!(repair_text("日本語", Some("windows-1252")), "日本語");
    }

    #[test]
    fn repair_falls_back_on_unknown_label() {
        assert_eq!(repair_text("text", Some("not-a-charset")), "text");
    }

    #[test]
    fn repair_falls_back_when_bytes_are_not_utf8() {
        // é encodes to the lone byte 0xE9, which is not valid UTF-8
        assert_eq!(repair_text("café", Some("windows-1252")), "café");
    }
}
