//! Exclusion zone closure.
//!
//! Excluded containers and everything inside them must never contribute
//! blocks, links, or text, even when a main-zone selector also matches an
//! element inside one. The closure is materialized as a set of node ids so
//! later passes test membership in O(1) instead of re-walking ancestors.

use crate::dom::{Document, NodeId, NodeRef};
use crate::resolver;
use crate::schema::SelectorList;
use std::collections::HashSet;

/// Resolve the exclusion selectors and expand each match to cover all of its
/// element descendants.
///
/// Selector problems in the exclude list are swallowed: a bad exclusion
/// selector should not generate noise about content that was never wanted.
#[must_use]
pub fn build_exclusion_set(doc: &Document, html: &str, exclude: &SelectorList) -> HashSet<NodeId> {
    let mut discarded = Vec::new();
    let matches = resolver::resolve(doc, html, exclude, &mut discarded);

    let mut excluded = HashSet::new();
    for node in matches {
        mark_subtree(&node, &mut excluded);
    }
    excluded
}

fn mark_subtree(node: &NodeRef, excluded: &mut HashSet<NodeId>) {
    excluded.insert(node.id);
    for descendant in node.descendants() {
        if descendant.is_element() {
            excluded.insert(descendant.id);
        }
    }
}

/// True when the node itself or any ancestor is excluded.
#[must_use]
pub fn is_excluded(node: &NodeRef, excluded: &HashSet<NodeId>) -> bool {
    if excluded.contains(&node.id) {
        return true;
    }
    crate::dom::has_ancestor_in(node, excluded)
}
