//! Deterministic embedding provider for tests and offline development.

use crate::embeddings::provider::EmbeddingProvider;
use askdoc_core::AppResult;

/// Words too common to carry any ranking signal.
const SKIP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "of", "in", "on", "at", "to", "for", "with", "from",
    "is", "are", "was", "were", "be", "been", "it", "its", "this", "that", "they", "them",
    "their", "has", "have", "had", "as", "by",
];

/// Hash-projected bag-of-words embedder.
///
/// Every remaining word and adjacent word pair is hashed onto one of
/// the vector's dimensions and weighted by occurrence, then the vector
/// is normalized. Texts sharing vocabulary land close together under
/// cosine similarity, which is all the ranking and determinism tests
/// need from a stand-in capability.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    /// Create a new mock provider with the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2 && !SKIP_WORDS.contains(w))
            .collect();

        for (i, word) in words.iter().enumerate() {
            let slot = hash_feature(word) as usize % self.dimensions;
            vector[slot] += 1.0;

            // Adjacent pairs add a weaker phrase signal
            if let Some(next) = words.get(i + 1) {
                let pair = format!("{} {}", word, next);
                let slot = hash_feature(&pair) as usize % self.dimensions;
                vector[slot] += 0.5;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

/// FNV-1a over the feature bytes.
fn hash_feature(feature: &str) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for byte in feature.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "bag-of-words-v1"
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

    #[tokio::test]
    async fn test_provider_metadata() {
        let provider = MockProvider::new(384);
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.model_name(), "bag-of-words-v1");
    }

    #[tokio::test]
    async fn test_vectors_are_unit_length() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_same_text_same_vector() {
        let provider = MockProvider::new(384);

        let first = provider.embed("a deterministic sentence").await.unwrap();
        let second = provider.embed("a deterministic sentence").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let provider = MockProvider::new(384);

        let hello = provider.embed("hello world").await.unwrap();
        let goodbye = provider.embed("goodbye world").await.unwrap();
        assert_ne!(hello, goodbye);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let provider = MockProvider::new(256);

        let query = provider.embed("boarding procedure for ferries").await.unwrap();
        let related = provider
            .embed("the boarding procedure starts at the ferry dock")
            .await
            .unwrap();
        let unrelated = provider
            .embed("volcanic eruptions reshape coastlines")
            .await
            .unwrap();

        let dot = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
        };

        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let provider = MockProvider::new(128);
        let texts = vec![
            "first text".to_string(),
            "second text".to_string(),
            "third text".to_string(),
        ];

        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 3);
        for (text, embedding) in texts.iter().zip(&batch) {
            let single = provider.embed(text).await.unwrap();
            assert_eq!(&single, embedding);
        }
    }
}
