//! Vector index abstraction.
//!
//! Defines a trait for provider-agnostic similarity search over an
//! already-populated index. Writing to the index is the ingestion
//! tooling's job and is not part of this trait.

use serde::{Deserialize, Serialize};
use yaseen_core::AppResult;

/// What the index service reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: usize,
    #[serde(rename = "totalVectors")]
    pub total_vectors: u64,
}

/// One nearest-neighbor hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// Trait for vector index backends.
///
/// Implementations must:
/// - Report `AppError::IndexNotFound` from `dimension` when the index is absent
/// - Return at most `top_k` matches, ordered by descending cosine similarity
/// - Return an empty list, not an error, when nothing matches
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Configured index name.
    fn name(&self) -> &str;

    /// Check existence and fetch the vector dimension.
    async fn dimension(&self) -> AppResult<usize>;

    /// Number of stored vectors.
    async fn total_vectors(&self) -> AppResult<u64>;

    /// Dimension and size together. Fails if either lookup fails.
    async fn describe(&self) -> AppResult<IndexDescription> {
        let dimension = self.dimension().await?;
        let total_vectors = self.total_vectors().await?;
        Ok(IndexDescription {
            name: self.name().to_string(),
            dimension,
            total_vectors,
        })
    }

    /// Search for the top-k most similar entries to `embedding`.
    async fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<IndexMatch>>;
}
