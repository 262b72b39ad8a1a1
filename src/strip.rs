//! Executable/style payload stripping and script-content recovery.
//!
//! Pages sometimes inject visible content through `document.write()` calls in
//! inline scripts; stripping script bodies outright would lose it. Recovery
//! runs before any clearing: string arguments to `document.write` are matched
//! with escape-aware patterns, unescaped, and collected so the extraction
//! engine can segment them separately (with a `script:` tag prefix).
//!
//! In "preserve structure" mode the emptied tags stay in the tree, so the
//! selector stage can still reason about where dynamic regions lived.

use crate::dom::{self, Document, Selection};
use regex::Regex;
use std::sync::LazyLock;

/// `document.write("...")` with a double-quoted argument, tolerating escaped
/// quotes inside the string.
#[allow(clippy::expect_used)]
static DOC_WRITE_DQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)document\.write\s*\(\s*"([^"\\]*(?:\\.[^"\\]*)*)"\s*\)"#)
        .expect("valid regex")
});

/// Single-quoted variant.
#[allow(clippy::expect_used)]
static DOC_WRITE_SQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)document\.write\s*\(\s*'([^'\\]*(?:\\.[^'\\]*)*)'\s*\)")
        .expect("valid regex")
});

/// What payload stripping found and removed.
#[derive(Debug, Default)]
pub struct StripReport {
    pub scripts: usize,
    pub styles: usize,

    /// External script URLs (diagnostic only).
    pub external_sources: Vec<String>,

    /// HTML fragments recovered from document-mutation calls, in document
    /// order of their scripts.
    pub recovered: Vec<String>,
}

/// Strip script/style/noscript payloads from the tree.
///
/// Script bodies are scanned for recoverable `document.write` HTML first.
/// With `preserve_structure` the emptied tags remain as structural hints;
/// otherwise the nodes are removed entirely.
pub fn strip_payloads(doc: &Document, preserve_structure: bool) -> StripReport {
    let mut report = StripReport::default();

    let scripts = doc.select("script");
    report.scripts = scripts.nodes().len();
    for node in scripts.nodes() {
        if let Some(src) = dom::attr(node, "src") {
            report.external_sources.push(src.to_string());
        }

        let sel = Selection::from(*node);
        let body = sel.text();
        if !body.trim().is_empty() {
            report.recovered.extend(recover_document_write(&body));
        }

        // Recovery must happen before the body is cleared.
        clear_or_remove(&sel, preserve_structure);
    }

    let styles = doc.select("style");
    report.styles = styles.nodes().len();
    for node in styles.nodes() {
        clear_or_remove(&Selection::from(*node), preserve_structure);
    }

    for node in doc.select("noscript").nodes() {
        clear_or_remove(&Selection::from(*node), preserve_structure);
    }

    report
}

fn clear_or_remove(sel: &Selection, preserve_structure: bool) {
    if preserve_structure {
        sel.set_html("");
    } else {
        sel.remove();
    }
}

/// Extract HTML strings passed to `document.write()` calls in script text.
#[must_use]
pub fn recover_document_write(script_text: &str) -> Vec<String> {
    let mut fragments = Vec::new();

    for re in [&*DOC_WRITE_DQ_RE, &*DOC_WRITE_SQ_RE] {
        for captures in re.captures_iter(script_text) {
            if let Some(m) = captures.get(1) {
                let html = unescape_js_string(m.as_str());
                if !html.trim().is_empty() {
                    fragments.push(html);
                }
            }
        }
    }

    fragments
}

/// Undo the common JavaScript string escapes so the fragment parses as the
/// author wrote it.
fn unescape_js_string(s: &str) -> String {
    s.replace("\\\"", "\"")
        .replace("\\'", "'")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}
