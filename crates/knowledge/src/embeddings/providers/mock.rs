//! Deterministic offline embedding provider.

use crate::embeddings::provider::EmbeddingProvider;
use std::collections::HashMap;
use yaseen_core::AppResult;

/// Words that carry no topical signal.
const STOP_WORDS: &[&str] = &[
    "the", "is", "are", "was", "were", "who", "what", "how", "why", "does", "did", "and", "for",
    "with", "from", "this", "that", "about", "into", "his", "her", "its", "their", "they",
];

/// Mock provider for tests and offline runs.
///
/// Hashes character trigrams and whole words into a fixed number of
/// buckets and normalizes the result. Similar wording yields similar
/// vectors, which is enough to exercise ranking and the confidence gate
/// without a network.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, token: &str, seed: u64) -> usize {
        let hash = token
            .bytes()
            .fold(seed, |acc, b| acc.wrapping_mul(1_099_511_628_211).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return vector;
        }

        let lower = text.to_lowercase();
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *counts.entry(word).or_default() += 1;
        }

        for (word, count) in counts {
            let weight = count as f32;
            vector[self.bucket(word, 17)] += weight;

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(&trigram, 31)] += weight.sqrt();
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = MockProvider::new(128);
        let a = provider.embed("Patience in hardship").await.unwrap();
        let b = provider.embed("Patience in hardship").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_similar_text_scores_higher() {
        let provider = MockProvider::new(256);
        let query = provider.embed("What is patience?").await.unwrap();
        let related = provider
            .embed("Patience is half of faith, and patience brings reward.")
            .await
            .unwrap();
        let unrelated = provider.embed("Trading camels at the market").await.unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_unicode_is_normalized() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("الصبر مفتاح الفرج").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_stop_words_only_is_zero_vector() {
        let provider = MockProvider::new(64);
        let embedding = provider.embed("who is the").await.unwrap();
        assert!(embedding.iter().all(|v| *v == 0.0));
    }
}
