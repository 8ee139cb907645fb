//! Query embedding.
//!
//! Provider-agnostic text-to-vector conversion used by the retriever.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockProvider, OpenAiEmbeddingProvider};
