//! Offline feature-hashing embedding provider.

use crate::embeddings::provider::EmbeddingProvider;
use relief_core::AppResult;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "what", "should", "do", "i", "you", "your", "my", "during",
];

/// Deterministic embedder for development, tests and air-gapped demos.
///
/// Each content word contributes its whole-word hash plus the hashes of its
/// boundary-marked character trigrams; the sign of every contribution comes
/// from the hash as well, which keeps collisions from piling up in one
/// direction. Vectors are L2-normalised. Texts sharing vocabulary score high
/// under cosine similarity, unrelated texts score near zero.
#[derive(Debug)]
pub struct HashProvider {
    dimensions: usize,
}

impl HashProvider {
    /// Create a new hash provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let words = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1 && !STOP_WORDS.contains(w));

        for word in words {
            self.accumulate(&mut embedding, word.as_bytes(), 1.0);

            let marked: Vec<char> = format!("^{}$", word).chars().collect();
            for window in marked.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut embedding, trigram.as_bytes(), 0.5);
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }

        embedding
    }

    fn accumulate(&self, embedding: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let slot = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        embedding[slot] += sign * weight;
    }
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |acc, &b| {
        (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashProvider {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn model_name(&self) -> &str {
        "hash-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[tokio::test]
    async fn test_hash_provider_unit_norm() {
        let provider = HashProvider::new(384);
        let embedding = provider.embed("Boil water before drinking").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_hash_provider_deterministic() {
        let provider = HashProvider::new(384);

        let first = provider.embed("earthquake drop cover hold").await.unwrap();
        let second = provider.embed("earthquake drop cover hold").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_hash_provider_batch_order() {
        let provider = HashProvider::new(64);
        let texts = vec!["flood".to_string(), "wildfire".to_string()];

        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], provider.embed("flood").await.unwrap());
        assert_eq!(batch[1], provider.embed("wildfire").await.unwrap());
    }

    #[tokio::test]
    async fn test_hash_provider_shared_vocabulary_scores_higher() {
        let provider = HashProvider::new(384);

        let passage = provider
            .embed("Evacuate low-lying areas during flood warnings.")
            .await
            .unwrap();
        let related = provider.embed("flood warnings evacuate").await.unwrap();
        let unrelated = provider.embed("favorite color").await.unwrap();

        let related_score = cosine_similarity(&passage, &related);
        let unrelated_score = cosine_similarity(&passage, &unrelated);
        assert!(related_score > 0.5, "related score {}", related_score);
        assert!(related_score > unrelated_score);
    }

    #[tokio::test]
    async fn test_hash_provider_empty_text_is_zero_vector() {
        let provider = HashProvider::new(32);
        let embedding = provider.embed("   ").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }
}
