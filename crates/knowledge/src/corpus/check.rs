//! Startup self-checks for index/passage alignment.

use super::index::VectorIndex;
use super::passages::PassageStore;
use relief_core::config::CorpusSettings;
use relief_core::{AppError, AppResult};
use serde::Serialize;

/// Summary of a verified corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusReport {
    pub passages: usize,
    pub dimensions: usize,
    pub checksum: String,
}

/// Verify that the index and passage store can serve queries together.
///
/// Checks, in order:
/// 1. index length equals passage count (co-indexing)
/// 2. index dimension equals the embedding provider's dimension
/// 3. the corpus is non-empty, unless `allow_empty` is set
/// 4. the passage checksum matches `expected_checksum`, when configured
pub fn verify_alignment(
    index: &dyn VectorIndex,
    passages: &PassageStore,
    embedding_dimensions: usize,
    settings: &CorpusSettings,
) -> AppResult<CorpusReport> {
    if index.len() != passages.len() {
        return Err(AppError::CorpusUnavailable(format!(
            "Index holds {} vectors but passage store holds {} passages",
            index.len(),
            passages.len()
        )));
    }

    if index.dimensions() != embedding_dimensions {
        return Err(AppError::CorpusUnavailable(format!(
            "Index dimension {} does not match embedding dimension {}",
            index.dimensions(),
            embedding_dimensions
        )));
    }

    if passages.is_empty() {
        if !settings.allow_empty {
            return Err(AppError::CorpusUnavailable(
                "Corpus is empty (set corpus.allowEmpty to serve fallback-only answers)"
                    .to_string(),
            ));
        }
        tracing::warn!("Corpus is empty, every query will use the fallback prompt");
    }

    if let Some(expected) = &settings.expected_checksum {
        if !expected.eq_ignore_ascii_case(passages.checksum()) {
            return Err(AppError::CorpusUnavailable(format!(
                "Passage checksum {} does not match expected {}",
                passages.checksum(),
                expected
            )));
        }
    }

    Ok(CorpusReport {
        passages: passages.len(),
        dimensions: index.dimensions(),
        checksum: passages.checksum().to_string(),
    })
}
