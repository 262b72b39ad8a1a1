//! Analysis-stage and cache collaborators.
//!
//! The extraction core never decides where content lives; a [`ZoneAnalyzer`]
//! does, producing the `Metadata` contract. Analysis is expensive, so its
//! output is cached per document under a stable key. The cache is advisory:
//! lookup and store failures degrade to warnings, while an analyzer failure
//! is fatal since without `Metadata` there is nothing to extract.

use crate::error::Result;
use crate::schema::{ExtractionContext, ExtractionResult, Metadata};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hasher};
use std::sync::Mutex;

/// Bytes of the document that participate in the structural hash key.
const CACHE_KEY_WINDOW: usize = 10 * 1024;

/// Produces extraction `Metadata` for a sanitized document.
pub trait ZoneAnalyzer {
    /// `encoding` is the browser-equivalent charset label detected for the
    /// document; `anomalies` are the structural anomaly tags found during
    /// preprocessing.
    fn analyze(
        &self,
        sanitized_html: &str,
        anomalies: &[String],
        encoding: &str,
    ) -> Result<Metadata>;
}

/// Key→`Metadata` store.
pub trait MetadataCache {
    fn get(&self, key: &str) -> Result<Option<Metadata>>;
    fn put(&self, key: &str, metadata: &Metadata) -> Result<()>;
}

/// In-memory cache, mostly useful for tests and single-process batch runs.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Metadata>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Metadata>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| crate::error::Error::Cache("cache lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, metadata: &Metadata) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| crate::error::Error::Cache("cache lock poisoned".to_string()))?;
        entries.insert(key.to_string(), metadata.clone());
        Ok(())
    }
}

/// Cache key for a document: the sanitized source name when the caller has
/// one, otherwise a structural hash of the document's leading bytes.
#[must_use]
pub fn cache_key(html: &str, source_name: Option<&str>) -> String {
    if let Some(name) = source_name {
        let sanitized: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if !sanitized.is_empty() {
            return sanitized;
        }
    }

    let bytes = html.as_bytes();
    let window = &bytes[..bytes.len().min(CACHE_KEY_WINDOW)];
    let mut hasher = DefaultHasher::new();
    hasher.write(window);
    format!("{:016x}", hasher.finish())
}

/// Preprocess, analyze (through the cache), and extract in one call.
///
/// Preprocessing and extraction warnings are merged into the result, along
/// with any cache degradation notes.
pub fn extract_cached<A, C>(
    analyzer: &A,
    cache: &C,
    html: &str,
    source_name: Option<&str>,
) -> Result<ExtractionResult>
where
    A: ZoneAnalyzer + ?Sized,
    C: MetadataCache + ?Sized,
{
    let pre = crate::preprocess(html);
    let key = cache_key(html, source_name);
    let mut warnings = pre.warnings.clone();

    let cached = match cache.get(&key) {
        Ok(found) => found,
        Err(err) => {
            warnings.push(format!("Metadata cache read failed: {err}"));
            None
        }
    };

    let metadata = match cached {
        Some(metadata) => metadata,
        None => {
            let encoding_label = pre
                .declared_charset
                .clone()
                .unwrap_or_else(|| "utf-8".to_string());
            let metadata = analyzer.analyze(&pre.sanitized_html, &pre.anomalies, &encoding_label)?;
            if let Err(err) = cache.put(&key, &metadata) {
                warnings.push(format!("Metadata cache write failed: {err}"));
            }
            metadata
        }
    };

    let context = ExtractionContext {
        declared_charset: pre.declared_charset.clone(),
        script_content: pre.recovered_scripts.clone(),
    };

    let mut result = crate::extract_with_context(&pre.normalized_html, &metadata, &context);
    warnings.append(&mut result.warnings);
    result.warnings = warnings;
    Ok(result)
}
