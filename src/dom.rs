//! DOM adapter over `dom_query`.
//!
//! Small helpers the extraction engine uses everywhere: lowercase tag names,
//! attribute access, inline-style hiddenness, and ancestor walks. Node
//! identity is `dom_query::NodeId`, a stable index into the arena-backed
//! tree, which is what the exclusion and processed sets are keyed by.

pub use dom_query::{Document, NodeId, NodeRef, Selection};
pub use tendril::StrTendril;

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static DISPLAY_NONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)display\s*:\s*none").expect("valid regex"));

#[allow(clippy::expect_used)]
static VISIBILITY_HIDDEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)visibility\s*:\s*hidden").expect("valid regex"));

/// Parse an HTML string into a document.
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Lowercase tag name of a node, empty for non-elements.
#[must_use]
pub fn tag_name(node: &NodeRef) -> String {
    node.node_name().map(|t| t.to_ascii_lowercase()).unwrap_or_default()
}

/// Attribute value of a node.
#[must_use]
pub fn attr(node: &NodeRef, name: &str) -> Option<StrTendril> {
    node.attr(name)
}

/// Check whether an element is hidden via its inline style.
#[must_use]
pub fn is_hidden(node: &NodeRef) -> bool {
    attr(node, "style").is_some_and(|style| {
        DISPLAY_NONE_RE.is_match(&style) || VISIBILITY_HIDDEN_RE.is_match(&style)
    })
}

/// Check whether any ancestor of `node` is in the given identity set.
///
/// Walks all the way to the document root; the matched containers themselves
/// are covered separately by direct membership tests.
#[must_use]
pub fn has_ancestor_in(node: &NodeRef, ids: &HashSet<NodeId>) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ids.contains(&ancestor.id) {
            return true;
        }
        current = ancestor.parent();
    }
    false
}

/// Check whether, walking up from `node`, a tag in `tags` appears before
/// reaching `boundary`. Used to decide whether a link already belongs to an
/// enclosing content block.
#[must_use]
pub fn has_ancestor_tag_within(node: &NodeRef, boundary: NodeId, tags: &[&str]) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ancestor.id == boundary {
            return false;
        }
        if tags.contains(&tag_name(&ancestor).as_str()) {
            return true;
        }
        current = ancestor.parent();
    }
    false
}
