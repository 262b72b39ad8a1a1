//! Error types for blocksift.
//!
//! Only the collaborator boundary (analysis stage, cache) produces hard
//! errors. Everything inside the extraction core reports failure as warning
//! strings carried in the result; see `ExtractionResult::warnings`.

/// Error type for pipeline boundary operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTML parsing failed across the entire fallback chain.
    #[error("HTML parsing failed: {0}")]
    Parse(String),

    /// Character encoding detection or conversion failed.
    #[error("Encoding failure: {0}")]
    Encoding(String),

    /// The external analysis stage failed to produce usable metadata.
    ///
    /// This halts the pipeline before the extraction core runs.
    #[error("Analysis failed: {0}")]
    Analysis(String),

    /// Metadata cache lookup or store failed.
    #[error("Cache failure: {0}")]
    Cache(String),
}

/// Result type alias for pipeline boundary operations.
pub type Result<T> = std::result::Result<T, Error>;
