//! Block segmentation: turning matched containers into ContentBlocks.
//!
//! One block per qualifying block-level descendant. Inline-tag text merges
//! into the enclosing block; nested block-level text is reserved for its own
//! block. Iteration is by tag priority first, then document order within each
//! tag; that ordering decides which node is "first" for dedup and is part of
//! the output contract.

use crate::dom::{self, NodeId, NodeRef};
use crate::encoding;
use crate::exclusion;
use crate::schema::{ContentBlock, ExtractionHints, Link};
use crate::text;
use std::collections::{HashMap, HashSet};

/// Block-level tags in priority order. Divs come last so that more specific
/// units inside them are claimed first.
pub const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "th", "blockquote",
    "figcaption", "dt", "dd", "caption", "div",
];

/// Inline tags whose text merges into the enclosing block.
pub const INLINE_TAGS: &[&str] = &[
    "span", "strong", "em", "b", "i", "u", "small", "mark", "sub", "sup",
    "code", "abbr", "cite", "q", "time",
];

/// Link-bearing tags.
pub const LINK_TAGS: &[&str] = &["a", "area"];

/// Per-call segmentation parameters.
#[derive(Debug, Clone, Copy)]
pub struct SegmentContext<'a> {
    pub hints: &'a ExtractionHints,

    /// Browser-equivalent charset for encoding repair, if declared.
    pub declared_charset: Option<&'a str>,
}

impl SegmentContext<'_> {
    fn finish_text(&self, raw: &str) -> (String, String) {
        let raw = if self.hints.collapse_whitespace {
            text::collapse_whitespace(raw).trim().to_string()
        } else {
            raw.trim().to_string()
        };
        let repaired = encoding::repair_text(&raw, self.declared_charset);
        (text::clean_text(&repaired), raw)
    }
}

/// Emit blocks for every qualifying block-level descendant of `container`.
pub fn blocks_in(
    container: &NodeRef,
    ctx: &SegmentContext,
    excluded: &HashSet<NodeId>,
    processed: &mut HashSet<NodeId>,
) -> Vec<ContentBlock> {
    let mut by_tag: HashMap<&'static str, Vec<NodeRef>> = HashMap::new();
    for node in container.descendants() {
        if !node.is_element() {
            continue;
        }
        let tag = dom::tag_name(&node);
        if let Some(known) = BLOCK_TAGS.iter().copied().find(|t| *t == tag) {
            by_tag.entry(known).or_default().push(node);
        }
    }

    let mut blocks = Vec::new();
    for tag in BLOCK_TAGS {
        let Some(nodes) = by_tag.get(tag) else {
            continue;
        };
        for node in nodes {
            if processed.contains(&node.id)
                || exclusion::is_excluded(node, excluded)
                || dom::is_hidden(node)
            {
                continue;
            }

            if let Some(block) = segment_block(node, tag, ctx, excluded) {
                processed.insert(node.id);
                blocks.push(block);
            }
        }
    }
    blocks
}

fn segment_block(
    node: &NodeRef,
    tag: &str,
    ctx: &SegmentContext,
    excluded: &HashSet<NodeId>,
) -> Option<ContentBlock> {
    let mut gathered = String::new();
    gather_own_text(node, ctx.hints, excluded, &mut gathered);
    let (cleaned, raw) = ctx.finish_text(&gathered);

    let links = links_in(node, ctx, excluded);

    // A block must carry something: cleaned text, non-blank raw, or links.
    if cleaned.is_empty() && raw.trim().is_empty() && links.is_empty() {
        return None;
    }

    Some(ContentBlock {
        tag: tag.to_string(),
        text: cleaned,
        raw,
        links,
    })
}

/// Collect a block node's own text: direct text children plus inline-tag
/// subtrees. Link text and nested block-level text are left out; the former
/// belongs to the block's links, the latter to its own block.
fn gather_own_text(
    node: &NodeRef,
    hints: &ExtractionHints,
    excluded: &HashSet<NodeId>,
    out: &mut String,
) {
    for child in node.children() {
        if child.is_text() {
            out.push_str(&child.text());
            continue;
        }
        if !child.is_element() || excluded.contains(&child.id) || dom::is_hidden(&child) {
            continue;
        }

        let tag = dom::tag_name(&child);
        if LINK_TAGS.contains(&tag.as_str()) || BLOCK_TAGS.contains(&tag.as_str()) {
            continue;
        }
        if tag == "img" {
            if hints.include_alt_text {
                if let Some(alt) = dom::attr(&child, "alt") {
                    out.push(' ');
                    out.push_str(&alt);
                    out.push(' ');
                }
            }
            continue;
        }
        if INLINE_TAGS.contains(&tag.as_str()) {
            gather_own_text(&child, hints, excluded, out);
        }
    }
}

/// Collect the links contained in a block.
fn links_in(node: &NodeRef, ctx: &SegmentContext, excluded: &HashSet<NodeId>) -> Vec<Link> {
    let mut links = Vec::new();
    for child in node.descendants() {
        if !child.is_element() {
            continue;
        }
        let tag = dom::tag_name(&child);
        if !LINK_TAGS.contains(&tag.as_str()) {
            continue;
        }
        if excluded.contains(&child.id) || dom::is_hidden(&child) {
            continue;
        }
        if let Some(link) = extract_link(&child, ctx) {
            links.push(link);
        }
    }
    links
}

/// Build a Link from a link node, or `None` when its href is unusable.
fn extract_link(node: &NodeRef, ctx: &SegmentContext) -> Option<Link> {
    let href = dom::attr(node, "href")?.trim().to_string();
    if !usable_href(&href) {
        return None;
    }

    let mut gathered = String::new();
    gather_link_text(node, &mut gathered);

    if gathered.trim().is_empty() && ctx.hints.include_alt_text {
        if let Some(alt) = image_alt(node) {
            gathered = alt;
        }
    }

    let (cleaned, raw) = ctx.finish_text(&gathered);
    Some(Link {
        href,
        text: cleaned,
        raw,
    })
}

/// Dead href values never produce a link, in any extraction path.
fn usable_href(href: &str) -> bool {
    !href.is_empty()
        && href != "#"
        && !href.to_ascii_lowercase().starts_with("javascript:")
}

/// Link text: the link's direct text plus inline-tag children. Block-level
/// descendants are excluded; malformed markup can nest a paragraph inside a
/// link, and that content belongs to its own block.
fn gather_link_text(node: &NodeRef, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            out.push_str(&child.text());
            continue;
        }
        if !child.is_element() {
            continue;
        }
        let tag = dom::tag_name(&child);
        if INLINE_TAGS.contains(&tag.as_str()) {
            gather_link_text(&child, out);
        }
    }
}

/// First non-empty `alt` on an image inside the link.
fn image_alt(node: &NodeRef) -> Option<String> {
    for child in node.descendants() {
        if child.is_element() && dom::tag_name(&child) == "img" {
            if let Some(alt) = dom::attr(&child, "alt") {
                let alt = alt.trim().to_string();
                if !alt.is_empty() {
                    return Some(alt);
                }
            }
        }
    }
    None
}

/// Emit standalone links: link-tag descendants of `container` with no
/// block-level ancestor between them and the container boundary.
pub fn standalone_links_in(
    container: &NodeRef,
    ctx: &SegmentContext,
    excluded: &HashSet<NodeId>,
    processed: &mut HashSet<NodeId>,
) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    for child in container.descendants() {
        if !child.is_element() {
            continue;
        }
        let tag = dom::tag_name(&child);
        if !LINK_TAGS.contains(&tag.as_str()) {
            continue;
        }
        if processed.contains(&child.id)
            || exclusion::is_excluded(&child, excluded)
            || dom::is_hidden(&child)
        {
            continue;
        }
        // A block-level ancestor inside the container means some block pass
        // already owned this link.
        if dom::has_ancestor_tag_within(&child, container.id, BLOCK_TAGS) {
            continue;
        }

        if let Some(link) = extract_link(&child, ctx) {
            processed.insert(child.id);
            blocks.push(ContentBlock {
                tag: "a".to_string(),
                text: String::new(),
                raw: String::new(),
                links: vec![link],
            });
        }
    }
    blocks
}

/// Re-run segmentation over HTML fragments recovered from scripts. Resulting
/// tags carry a `script:` provenance prefix.
#[must_use]
pub fn script_blocks(fragments: &[String], ctx: &SegmentContext) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let excluded = HashSet::new();

    for fragment in fragments {
        let doc = dom::parse(fragment);
        let body = doc.select("body");
        let Some(container) = body.nodes().first() else {
            continue;
        };

        let mut processed = HashSet::new();
        let mut found = blocks_in(container, ctx, &excluded, &mut processed);
        found.extend(standalone_links_in(container, ctx, &excluded, &mut processed));

        for mut block in found {
            block.tag = format!("script:{}", block.tag);
            blocks.push(block);
        }
    }
    blocks
}
