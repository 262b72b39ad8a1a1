//! Document building with a parser fallback chain.
//!
//! Parsers are tried from most to least tolerant: the full document tree
//! builder, then a fragment parse, then a minimal wrapped parse that always
//! yields a tree. A failed attempt is a warning, never a fatal error. While
//! building, a charset declaration is opportunistically read from the meta
//! nodes of the parsed tree; DOM-level detection takes precedence over the
//! byte-level scan once parsing succeeds, since it reflects the parser's own
//! interpretation of the markup.

use crate::dom::{self, Document};
use crate::encoding;

/// A parsed document plus what was learned while building it.
pub struct BuiltDocument {
    pub doc: Document,

    /// Browser-equivalent charset declared in the DOM's meta nodes, if any.
    pub meta_charset: Option<String>,

    /// Parser fallback notes.
    pub warnings: Vec<String>,
}

/// Parse HTML into a document, falling back through progressively simpler
/// parsers. Never fails; the last tier always produces a tree.
#[must_use]
pub fn build(html: &str) -> BuiltDocument {
    let mut warnings = Vec::new();

    let doc = if let Some(doc) = parse_document(html) {
        doc
    } else {
        warnings.push("Document parse produced no usable tree, trying fragment parse".to_string());
        if let Some(doc) = parse_fragment(html) {
            doc
        } else {
            warnings.push("Fragment parse produced no usable tree, using minimal parser".to_string());
            parse_minimal(html)
        }
    };

    let meta_charset = charset_from_meta(&doc);

    BuiltDocument {
        doc,
        meta_charset,
        warnings,
    }
}

/// Full tree-builder parse. `None` when the result has no body to extract
/// from despite non-empty input.
fn parse_document(html: &str) -> Option<Document> {
    let doc = dom::parse(html);
    usable(doc, html)
}

/// Fragment parse: tolerant of content that confuses the document builder's
/// head/body disposition. A fragment tree has no body; any element at all
/// counts as usable.
fn parse_fragment(html: &str) -> Option<Document> {
    let doc = Document::fragment(html);
    if html.trim().is_empty() || doc.select("*").exists() {
        return Some(doc);
    }
    None
}

/// Last resort: force the content into an explicit body and reparse.
fn parse_minimal(html: &str) -> Document {
    dom::parse(&format!("<html><body>{html}</body></html>"))
}

fn usable(doc: Document, html: &str) -> Option<Document> {
    if html.trim().is_empty() {
        // Nothing to lose; an empty tree is as good as it gets.
        return Some(doc);
    }
    doc.select("body").exists().then_some(doc)
}

/// Read a charset declaration from the parsed tree's meta nodes.
///
/// Checks `<meta charset>` first, then the legacy
/// `<meta http-equiv="Content-Type">` form, and normalizes the label to its
/// browser-equivalent encoding.
fn charset_from_meta(doc: &Document) -> Option<String> {
    let charset_meta = doc.select("meta[charset]");
    if let Some(label) = charset_meta.attr("charset") {
        let label = label.trim().to_string();
        if !label.is_empty() {
            return Some(encoding::normalize_label(&label));
        }
    }

    let metas = doc.select("meta[http-equiv][content]");
    for node in metas.nodes() {
        let equiv = dom::attr(node, "http-equiv")?;
        if !equiv.trim().eq_ignore_ascii_case("content-type") {
            continue;
        }
        let content = dom::attr(node, "content")?;
        if let Some(label) = charset_from_content_type(&content) {
            return Some(encoding::normalize_label(&label));
        }
    }

    None
}

/// Pull the charset parameter out of a content-type value like
/// `text/html; charset=utf-8`.
fn charset_from_content_type(content: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let idx = lower.find("charset=")?;
    let rest = &content[idx + "charset=".len()..];
    let label = rest
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    (!label.is_empty()).then_some(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_wellformed_document() {
        let built = build("<html><body><p>hello</p></body></html>");
        assert!(built.warnings.is_empty());
        assert_eq!(built.doc.select("p").text().as_ref(), "hello");
    }

    #[test]
    fn builds_bare_fragment() {
        // The tree builder wraps loose content in html/body itself.
        let built = build("<p>loose</p>");
        assert!(built.doc.select("body p").exists());
    }

    #[test]
    fn empty_input_is_fine() {
        let built = build("");
        assert!(built.warnings.is_empty());
        assert!(built.doc.select("p").nodes().is_empty());
    }

    #[test]
    fn meta_charset_is_detected_and_normalized() {
        let built = build(r#"<html><head><meta charset="ISO-8859-1"></head><body></body></html>"#);
        assert_eq!(built.meta_charset.as_deref(), Some("windows-1252"));
    }

    #[test]
    fn legacy_content_type_charset_is_detected() {
        let built = build(
            r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-9"></head><body></body></html>"#,
        );
        assert_eq!(built.meta_charset.as_deref(), Some("windows-1254"));
    }

    #[test]
    fn no_meta_charset_yields_none() {
        let built = build("<html><body><p>x</p></body></html>");
        assert_eq!(built.meta_charset, None);
    }

    #[test]
    fn charset_param_parsing() {
        assert_eq!(
            charset_from_content_type("text/html; charset=utf-8").as_deref(),
            Some("utf-8")
        );
        assert_eq!(
            charset_from_content_type(r#"text/html; charset="windows-1252"; x=y"#).as_deref(),
            Some("windows-1252")
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }
}
