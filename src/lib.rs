//! blocksift extracts structured content blocks from messy real-world HTML.
//!
//! The pipeline is built for documents that lie: misdeclared charsets,
//! doubled angle brackets, stray `<` characters in text, content injected
//! through `document.write`. Extraction is driven by a [`Metadata`] contract
//! (typically produced by an external analysis stage, see
//! [`analysis::ZoneAnalyzer`]) that names the main content zones and the
//! regions to exclude.
//!
//! A full run is: byte-level charset detection, string-level sanitization,
//! parser-fallback document building, script/style stripping with
//! `document.write` recovery, selector resolution across two parse engines,
//! exclusion closure, block segmentation, and per-block encoding repair.
//! Everything non-fatal is a warning on the result, never an error.
//!
//! ```
//! use blocksift::{extract, ContentZones, Metadata, SelectorList};
//!
//! let html = r#"<div id="m"><p>Hello <b>World</b></p><a href="/x">Go</a></div>"#;
//! let metadata = Metadata {
//!     content_zones: ContentZones {
//!         main: SelectorList::from_css(["#m"]),
//!         ..ContentZones::default()
//!     },
//!     ..Metadata::default()
//! };
//!
//! let result = extract(html, &metadata);
//! assert_eq!(result.blocks.len(), 2);
//! assert_eq!(result.blocks[0].text, "Hello World");
//! assert_eq!(result.blocks[1].links[0].href, "/x");
//! ```

pub mod analysis;
pub mod builder;
pub mod dom;
pub mod encoding;
pub mod error;
pub mod exclusion;
pub mod pathexpr;
pub mod resolver;
pub mod sanitize;
pub mod schema;
pub mod segment;
pub mod strip;
pub mod text;

pub use analysis::{cache_key, extract_cached, MemoryCache, MetadataCache, ZoneAnalyzer};
pub use error::{Error, Result};
pub use schema::{
    ContentBlock, ContentZones, ExtractionContext, ExtractionHints, ExtractionResult, Link,
    Metadata, PreprocessResult, SelectorList,
};

use segment::SegmentContext;
use std::collections::HashSet;

/// Preprocess raw HTML: sanitize, parse, strip script/style payloads.
///
/// Emptied script/style nodes are left in the tree so later selector
/// resolution can still see where dynamic regions lived.
#[must_use]
pub fn preprocess(html: &str) -> PreprocessResult {
    preprocess_with(html, true)
}

/// [`preprocess`] with control over whether emptied script/style nodes stay
/// in the tree.
#[must_use]
pub fn preprocess_with(html: &str, preserve_structure: bool) -> PreprocessResult {
    // Anomalies are scanned on the input as received; sanitization would
    // erase the evidence.
    let anomalies = sanitize::detect_anomalies(html);
    let (sanitized_html, mut warnings) = sanitize::sanitize(html);

    let built = builder::build(&sanitized_html);
    warnings.extend(built.warnings);

    let report = strip::strip_payloads(&built.doc, preserve_structure);
    if report.scripts > 0 {
        warnings.push(format!("Removed content from {} script tags", report.scripts));
    }
    if report.styles > 0 {
        warnings.push(format!("Removed content from {} style tags", report.styles));
    }
    let normalized_html = built.doc.html().to_string();

    PreprocessResult {
        sanitized_html,
        normalized_html,
        declared_charset: built.meta_charset,
        recovered_scripts: report.recovered,
        script_sources: report.external_sources,
        anomalies,
        warnings,
    }
}

/// Extract content blocks from HTML using the given metadata.
///
/// Convenience wrapper over [`extract_with_context`]: the declared charset is
/// taken from `metadata.encoding` and no script-recovered fragments are
/// considered.
#[must_use]
pub fn extract(html: &str, metadata: &Metadata) -> ExtractionResult {
    let context = ExtractionContext {
        declared_charset: (!metadata.encoding.is_empty()).then(|| metadata.encoding.clone()),
        script_content: Vec::new(),
    };
    extract_with_context(html, metadata, &context)
}

/// Extract content blocks with explicit per-call context.
///
/// Never fails: parse trouble, selector trouble, and empty results all
/// surface as warnings on the returned [`ExtractionResult`].
#[must_use]
pub fn extract_with_context(
    html: &str,
    metadata: &Metadata,
    context: &ExtractionContext,
) -> ExtractionResult {
    let built = builder::build(html);
    let mut warnings = built.warnings;
    let doc = built.doc;

    let excluded = exclusion::build_exclusion_set(&doc, html, &metadata.content_zones.exclude);

    let mut containers =
        resolver::resolve(&doc, html, &metadata.content_zones.main, &mut warnings);
    if containers.is_empty() {
        warnings.push("No main content zone matched, using body".to_string());
        let body = doc.select("body");
        containers = body.nodes().to_vec();
    }

    let seg_ctx = SegmentContext {
        hints: &metadata.extraction_hints,
        declared_charset: context.declared_charset.as_deref(),
    };

    let mut blocks = Vec::new();
    let mut processed = HashSet::new();
    // The block pass covers every container before any standalone-link pass
    // runs, so blocks from all containers precede standalone links.
    for container in &containers {
        blocks.extend(segment::blocks_in(container, &seg_ctx, &excluded, &mut processed));
    }
    for container in &containers {
        blocks.extend(segment::standalone_links_in(
            container,
            &seg_ctx,
            &excluded,
            &mut processed,
        ));
    }

    blocks.extend(segment::script_blocks(&context.script_content, &seg_ctx));

    if blocks.is_empty() {
        warnings.push("No content blocks extracted".to_string());
    }

    ExtractionResult { blocks, warnings }
}

/// Extract from raw bytes: detect the charset, decode as a browser would,
/// preprocess, and run extraction with the declared charset threaded through
/// for encoding repair.
#[must_use]
pub fn extract_bytes(bytes: &[u8], metadata: &Metadata) -> ExtractionResult {
    let byte_label = encoding::detect_charset_label(bytes);
    let (decoded, had_replacements) = encoding::decode_bytes(bytes);

    let mut warnings = Vec::new();
    if had_replacements {
        warnings.push(format!(
            "Input contained byte sequences invalid in {byte_label}, replaced"
        ));
    }

    let pre = preprocess(&decoded);
    warnings.extend(pre.warnings.clone());

    // The DOM-level declaration wins over the byte-level sniff.
    let declared_charset = pre.declared_charset.clone().or(Some(byte_label));

    let context = ExtractionContext {
        declared_charset,
        script_content: pre.recovered_scripts.clone(),
    };

    let mut result = extract_with_context(&pre.normalized_html, metadata, &context);
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    result
}
