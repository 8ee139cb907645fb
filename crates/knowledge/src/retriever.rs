//! Context retrieval: embed the question, search the index, rank.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Query, RetrievalResult, RetrievedPassage};
use crate::vector_index::VectorIndex;
use std::sync::Arc;
use tokio::sync::OnceCell;
use yaseen_core::{AppError, AppResult};

/// Retrieves ranked passages for a question.
///
/// The index handle is injected and shared; the retriever only adds a
/// one-time existence and dimension check on top of it.
pub struct ContextRetriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    verified: OnceCell<usize>,
}

impl ContextRetriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            top_k,
            verified: OnceCell::new(),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve with the configured `top_k`.
    pub async fn retrieve(&self, query: &Query) -> AppResult<RetrievalResult> {
        self.retrieve_context(query, self.top_k).await
    }

    /// Retrieve the `k` nearest passages, most similar first.
    ///
    /// An index with no matches yields an empty result with
    /// `top_similarity == 0.0`.
    pub async fn retrieve_context(&self, query: &Query, k: usize) -> AppResult<RetrievalResult> {
        self.verify_index().await?;

        let embedding = self.embedder.embed(query.as_str()).await?;
        if embedding.len() != self.embedder.dimensions() {
            return Err(AppError::Retrieval(format!(
                "Embedding model '{}' returned {} dimensions, expected {}",
                self.embedder.model_name(),
                embedding.len(),
                self.embedder.dimensions()
            )));
        }

        let matches = self.index.query(&embedding, k).await?;

        let passages: Vec<RetrievedPassage> = matches
            .into_iter()
            .map(|m| RetrievedPassage {
                text: m.text,
                similarity_score: m.score,
            })
            .collect();

        let result = RetrievalResult::from_passages(passages);

        if result.is_empty() {
            tracing::info!(index = %self.index.name(), "No matches returned by the index");
        } else {
            let scores: Vec<f32> = result.passages.iter().map(|p| p.similarity_score).collect();
            tracing::debug!(
                "Retrieved {} passages - scores: {:?}, max similarity: {:.3}",
                scores.len(),
                scores,
                result.top_similarity
            );
        }

        Ok(result)
    }

    /// Check once that the index exists and matches the embedding model.
    ///
    /// The vector count is only logged; failing to fetch it does not stop
    /// retrieval.
    async fn verify_index(&self) -> AppResult<usize> {
        self.verified
            .get_or_try_init(|| async {
                let dimension = self.index.dimension().await?;

                if dimension != self.embedder.dimensions() {
                    return Err(AppError::Config(format!(
                        "Index '{}' has dimension {} but embedding model '{}' produces {}",
                        self.index.name(),
                        dimension,
                        self.embedder.model_name(),
                        self.embedder.dimensions()
                    )));
                }

                match self.index.total_vectors().await {
                    Ok(total_vectors) => tracing::debug!(
                        index = %self.index.name(),
                        dimension,
                        total_vectors,
                        "Index stats"
                    ),
                    Err(e) => tracing::warn!(
                        index = %self.index.name(),
                        error = %e,
                        "Could not fetch index stats"
                    ),
                }

                Ok::<_, AppError>(dimension)
            })
            .await
            .copied()
    }
}
