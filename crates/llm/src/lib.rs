//! LLM integration crate for Yaseen.
//!
//! This crate provides a provider-agnostic abstraction over the hosted
//! model services the answering pipeline depends on: chat completion and
//! content moderation.
//!
//! # Providers
//! - **OpenAI**: chat completions and moderation (default)
//! - **Ollama**: local chat completions
//!
//! # Example
//! ```no_run
//! use yaseen_llm::{ChatMessage, LlmClient, LlmRequest, providers::OpenAiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new("sk-...")?;
//! let request = LlmRequest::new(vec![ChatMessage::user("Salaam")], "gpt-4o-mini");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod moderation;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use moderation::{ModerationClient, ModerationVerdict};
pub use providers::{OllamaClient, OpenAiClient};
pub use types::{ChatMessage, ChatRole, ProviderType};
