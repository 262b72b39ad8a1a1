//! Selector resolution across two parse engines.
//!
//! CSS selectors run directly against the primary tree. Path expressions run
//! against an independent parse of the same markup, so their matches live in
//! a different tree; a [`BridgeStrategy`] carries each match back into the
//! primary tree by its attributes. The two engines disagree about recovery of
//! badly broken markup sometimes, which is exactly why the bridge works on
//! attributes rather than positions alone.
//!
//! Invalid selectors in either dialect are reported as warnings and skipped;
//! resolution itself never fails.

use crate::dom::{self, Document, NodeId, NodeRef};
use crate::pathexpr::PathExpr;
use crate::schema::SelectorList;
use dom_query::Matcher;
use scraper::{ElementRef, Html};
use std::collections::HashSet;

/// Identifying attributes of a path-expression match, used to find the same
/// element in the primary tree.
#[derive(Debug, Clone)]
pub struct BridgeHint {
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
}

impl BridgeHint {
    fn from_element(el: &ElementRef) -> Self {
        Self {
            tag: el.value().name().to_ascii_lowercase(),
            id: el.value().attr("id").map(ToString::to_string),
            class: el.value().attr("class").map(ToString::to_string),
        }
    }
}

/// Carries an element matched in a foreign tree into the primary tree.
pub trait BridgeStrategy {
    fn bridge<'a>(&self, doc: &'a Document, hint: &BridgeHint) -> Option<NodeRef<'a>>;
}

/// Attribute-based bridge. Tries progressively weaker evidence: a matching
/// `id` on the same tag, then an identical `class` attribute, then the first
/// element with the same tag. The last tier is an approximation; an
/// attribute-less match collapses onto the first same-tag element rather
/// than guessing at positions the two parsers may disagree on.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeBridge;

impl BridgeStrategy for AttributeBridge {
    fn bridge<'a>(&self, doc: &'a Document, hint: &BridgeHint) -> Option<NodeRef<'a>> {
        let candidates = doc.select(&hint.tag);
        let nodes = candidates.nodes();

        if let Some(id) = &hint.id {
            let found = nodes
                .iter()
                .find(|n| dom::attr(n, "id").is_some_and(|v| v.as_ref() == id.as_str()));
            if let Some(node) = found {
                return Some(*node);
            }
        }

        if let Some(class) = &hint.class {
            let found = nodes
                .iter()
                .find(|n| dom::attr(n, "class").is_some_and(|v| v.as_ref() == class.as_str()));
            if let Some(node) = found {
                return Some(*node);
            }
        }

        nodes.first().copied()
    }
}

/// Resolve a selector list against the primary tree.
///
/// Returns matched nodes in first-seen order with duplicates removed. `html`
/// must be the same markup `doc` was parsed from; it feeds the secondary
/// parse for path expressions.
pub fn resolve<'a>(
    doc: &'a Document,
    html: &str,
    selectors: &SelectorList,
    warnings: &mut Vec<String>,
) -> Vec<NodeRef<'a>> {
    let mut out: Vec<NodeRef<'a>> = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::new();

    for css in &selectors.css {
        // Validity and matching are separate questions; only the former
        // deserves a warning.
        match Matcher::new(css) {
            Ok(matcher) => {
                let sel = doc.select_matcher(&matcher);
                for node in sel.nodes() {
                    if seen.insert(node.id) {
                        out.push(*node);
                    }
                }
            }
            Err(_) => {
                warnings.push(format!("Invalid CSS selector '{css}', skipped"));
            }
        }
    }

    if !selectors.xpath.is_empty() {
        // One secondary parse shared by all path expressions in this call.
        let parsed = Html::parse_document(html);
        let bridge = AttributeBridge;

        for expr in &selectors.xpath {
            match PathExpr::parse(expr) {
                Ok(path) => {
                    for el in path.evaluate(&parsed) {
                        let hint = BridgeHint::from_element(&el);
                        if let Some(node) = bridge.bridge(doc, &hint) {
                            if seen.insert(node.id) {
                                out.push(node);
                            }
                        } else {
                            warnings.push(format!(
                                "Path expression '{expr}' matched a <{}> with no counterpart in the primary tree",
                                hint.tag
                            ));
                        }
                    }
                }
                Err(err) => {
                    warnings.push(format!("Invalid path expression '{expr}': {err}"));
                }
            }
        }
    }

    out
}
