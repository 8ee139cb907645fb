//! Retrieval and confidence-gated answering for Yaseen.
//!
//! - [`retriever`]: embeds a question and ranks passages from a vector index
//! - [`rag`]: the answering pipeline built on top of it
//!
//! Index backends are Pinecone (production) and an in-memory cosine index
//! (tests and offline runs). Embeddings come from OpenAI or a deterministic
//! mock provider.

pub mod embeddings;
pub mod memory_index;
pub mod pinecone_index;
pub mod rag;
pub mod retriever;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use memory_index::InMemoryIndex;
pub use pinecone_index::PineconeIndex;
pub use rag::{AnswerPipeline, ChatResponse, Citation, CitationKind};
pub use retriever::ContextRetriever;
pub use types::{Query, RetrievalResult, RetrievedPassage};
pub use vector_index::{IndexDescription, IndexMatch, VectorIndex};

use yaseen_core::{AppResult, Settings};

/// Describe the configured index.
pub async fn stats(settings: &Settings) -> AppResult<IndexDescription> {
    tracing::info!("Getting stats for index '{}'", settings.index_name);

    let index = PineconeIndex::from_settings(settings)?;

    index.describe().await
}
