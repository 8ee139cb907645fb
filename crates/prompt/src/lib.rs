//! Persona system for Yaseen.
//!
//! This crate turns the assistant persona into configuration data:
//! - YAML-based persona definitions (built-in default, file override)
//! - Handlebars template rendering
//! - Assembly of persona, retrieved context and question into prompt parts

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, render_persona};
pub use loader::{default_persona, load_persona, resolve_persona};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PersonaBehavior, PersonaDefinition};
