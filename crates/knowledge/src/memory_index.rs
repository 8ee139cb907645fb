//! In-memory vector index using cosine similarity.
//!
//! Used by tests and offline demos. Entries are loaded with `upsert`; the
//! production index is populated out of band by the ingestion tooling.

use crate::vector_index::{IndexMatch, VectorIndex};
use std::collections::HashMap;
use tokio::sync::RwLock;
use yaseen_core::{AppError, AppResult};

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    embedding: Vec<f32>,
}

/// An in-memory index keyed by entry id.
#[derive(Debug)]
pub struct InMemoryIndex {
    name: String,
    dimension: usize,
    present: bool,
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryIndex {
    /// Create an empty index.
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            present: true,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// An index handle whose index was never created.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            present: false,
            ..Self::new(name, 0)
        }
    }

    /// Insert or replace an entry.
    pub async fn upsert(
        &self,
        id: impl Into<String>,
        embedding: Vec<f32>,
        text: impl Into<String>,
    ) -> AppResult<()> {
        self.ensure_present()?;

        if embedding.len() != self.dimension {
            return Err(AppError::Knowledge(format!(
                "Embedding has {} dimensions, index '{}' expects {}",
                embedding.len(),
                self.name,
                self.dimension
            )));
        }

        self.entries.write().await.insert(
            id.into(),
            Entry {
                text: text.into(),
                embedding,
            },
        );
        Ok(())
    }

    fn ensure_present(&self) -> AppResult<()> {
        if self.present {
            Ok(())
        } else {
            Err(AppError::IndexNotFound {
                index: self.name.clone(),
            })
        }
    }
}

/// Cosine similarity; 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn dimension(&self) -> AppResult<usize> {
        self.ensure_present()?;
        Ok(self.dimension)
    }

    async fn total_vectors(&self) -> AppResult<u64> {
        self.ensure_present()?;
        Ok(self.entries.read().await.len() as u64)
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<IndexMatch>> {
        self.ensure_present()?;

        let entries = self.entries.read().await;
        let mut matches: Vec<IndexMatch> = entries
            .iter()
            .map(|(id, entry)| IndexMatch {
                id: id.clone(),
                text: entry.text.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        // Tie-break on id so equal scores come back in a stable order.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }
}
