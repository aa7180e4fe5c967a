//! Passage store aligned with the vector index.

use relief_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// A retrievable unit of corpus text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Text injected into grounded prompts
    pub content: String,

    /// Any other fields of the metadata record, kept as-is
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Passage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attributes: serde_json::Map::new(),
        }
    }
}

/// Ordered, immutable passage collection.
#[derive(Debug, Clone)]
pub struct PassageStore {
    passages: Vec<Passage>,
    checksum: String,
}

impl PassageStore {
    pub fn from_passages(passages: Vec<Passage>) -> Self {
        let checksum = content_checksum(&passages);
        Self {
            passages,
            checksum,
        }
    }

    /// Load a JSON array of `{"content": ...}` records.
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::CorpusUnavailable(format!("Failed to read passages {:?}: {}", path, e))
        })?;

        let passages: Vec<Passage> = serde_json::from_str(&contents).map_err(|e| {
            AppError::CorpusUnavailable(format!("Failed to parse passages {:?}: {}", path, e))
        })?;

        tracing::info!(passages = passages.len(), "Loaded passage store from {:?}", path);

        Ok(Self::from_passages(passages))
    }

    pub fn get(&self, position: usize) -> Option<&Passage> {
        self.passages.get(position)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Hex SHA-256 over every passage's content, in order.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

/// Each content is length-prefixed so boundaries between passages count.
fn content_checksum(passages: &[Passage]) -> String {
    let mut hasher = Sha256::new();
    for passage in passages {
        hasher.update((passage.content.len() as u64).to_le_bytes());
        hasher.update(passage.content.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
