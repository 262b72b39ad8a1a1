//! Pipeline contract and output types.
//!
//! `Metadata` is the sole contract between the external analysis stage and
//! the extraction core; `ExtractionResult` is the terminal output. Both are
//! serde-derived because the metadata cache stores `Metadata` as JSON and
//! downstream consumers read results as JSON.

use serde::{Deserialize, Serialize};

/// Selector expressions in both supported dialects.
///
/// The analysis stage may return CSS selectors, path expressions, or a mix;
/// certain patterns (attribute `contains()` matching) are only expressible in
/// the path dialect, while CSS is simpler for id/class matching. Either list
/// may be empty; emptiness is a first-class condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorList {
    /// CSS selector expressions, evaluated directly against the primary tree.
    #[serde(default)]
    pub css: Vec<String>,

    /// Path expressions, evaluated against an independent second parse and
    /// bridged back to the primary tree.
    #[serde(default)]
    pub xpath: Vec<String>,
}

impl SelectorList {
    /// Build a list of CSS selectors only.
    #[must_use]
    pub fn from_css<S: Into<String>>(selectors: impl IntoIterator<Item = S>) -> Self {
        Self {
            css: selectors.into_iter().map(Into::into).collect(),
            xpath: Vec::new(),
        }
    }

    /// Build a list of path expressions only.
    #[must_use]
    pub fn from_xpath<S: Into<String>>(selectors: impl IntoIterator<Item = S>) -> Self {
        Self {
            css: Vec::new(),
            xpath: selectors.into_iter().map(Into::into).collect(),
        }
    }

    /// True when neither dialect has any expressions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.css.is_empty() && self.xpath.is_empty()
    }
}

/// Content zones identified by the analysis stage.
///
/// The extraction core consumes `main` and `exclude`; `nav` and `footer` are
/// carried for downstream consumers but do not steer block segmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentZones {
    /// Primary article/content containers.
    #[serde(default)]
    pub main: SelectorList,

    /// Navigation menus.
    #[serde(default)]
    pub nav: SelectorList,

    /// Footer regions.
    #[serde(default)]
    pub footer: SelectorList,

    /// Ads, sidebars, and other regions to skip entirely.
    #[serde(default)]
    pub exclude: SelectorList,
}

/// Behavior hints for the extraction core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionHints {
    /// Merge runs of whitespace into single spaces.
    #[serde(default = "default_true")]
    pub collapse_whitespace: bool,

    /// Use img alt text when link text would otherwise be empty.
    #[serde(default = "default_true")]
    pub include_alt_text: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExtractionHints {
    fn default() -> Self {
        Self {
            collapse_whitespace: true,
            include_alt_text: true,
        }
    }
}

/// Contract between the analysis stage and the extraction core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Encoding label propagated from charset detection.
    #[serde(default)]
    pub encoding: String,

    /// Zones identified in the document.
    #[serde(default)]
    pub content_zones: ContentZones,

    /// Extraction behavior hints.
    #[serde(default)]
    pub extraction_hints: ExtractionHints,

    /// Anomaly tags detected during preprocessing (e.g. `double_angle_brackets`).
    #[serde(default)]
    pub anomalies_detected: Vec<String>,
}

/// A link extracted from content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,

    /// Cleaned link text: encoding-corrected, markup garbage removed.
    pub text: String,

    /// Link text as a naive decoder renders it, mojibake preserved.
    #[serde(default)]
    pub raw: String,
}

/// A logical block of content: one paragraph, heading, list item, etc.
///
/// Dual-field design: `raw` is the text exactly as decoded from the byte
/// stream (browser truth, mojibake preserved); `text` is the
/// encoding-repaired, garbage-stripped version consumers should use.
///
/// A block exists only if it has non-empty cleaned text, non-empty raw text,
/// or at least one link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Tag label. Blocks recovered from script-injected HTML carry a
    /// `script:` prefix (`script:p`, `script:a`).
    pub tag: String,

    /// Cleaned non-link text content.
    pub text: String,

    /// Raw text before encoding repair and cleanup.
    #[serde(default)]
    pub raw: String,

    #[serde(default)]
    pub links: Vec<Link>,
}

/// Terminal output of the extraction core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,

    /// Non-fatal issues encountered during extraction.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Per-call extraction state threaded explicitly through the core.
///
/// The declared charset and recovered script fragments are per-document
/// values; keeping them out of any shared engine state makes concurrent
/// per-document extraction safe without coordination.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// Browser-equivalent charset the document declared, for encoding repair.
    pub declared_charset: Option<String>,

    /// HTML fragments recovered from script-based document mutation calls.
    pub script_content: Vec<String>,
}

/// Output of the preprocessing stage.
#[derive(Debug, Clone, Default)]
pub struct PreprocessResult {
    /// HTML after string-level fixes, before DOM parsing.
    pub sanitized_html: String,

    /// Serialized DOM after script/style payload stripping. This is what the
    /// extraction core consumes.
    pub normalized_html: String,

    /// Browser-equivalent charset for the document, DOM-level declaration
    /// taking precedence over any byte-level hint.
    pub declared_charset: Option<String>,

    /// HTML fragments recovered from script-based document mutation calls.
    pub recovered_scripts: Vec<String>,

    /// External script URLs seen while stripping (diagnostic only).
    pub script_sources: Vec<String>,

    /// Structural anomaly tags for the analysis stage.
    pub anomalies: Vec<String>,

    /// Non-fatal issues encountered during preprocessing.
    pub warnings: Vec<String>,
}
