//! Persona and prompt types.
//!
//! This module defines the domain entities for the persona system.

use serde::{Deserialize, Serialize};

/// A persona definition loaded from YAML.
///
/// The persona is configuration data: it decides how the model speaks and
/// what it may refuse, not how the pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaDefinition {
    /// Unique persona identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Behavioral settings
    pub behavior: PersonaBehavior,

    /// System prompt template with Handlebars syntax
    pub template: String,

    /// Optional text placed before the retrieved passages
    #[serde(rename = "contextHeader", default, skip_serializing_if = "Option::is_none")]
    pub context_header: Option<String>,
}

/// Behavioral settings exposed to the template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaBehavior {
    /// Tone (e.g., "respectful", "neutral")
    pub tone: String,

    /// Style (e.g., "concise", "detailed")
    pub style: String,
}

/// A fully built prompt ready to be turned into chat messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Rendered persona (first system message)
    pub system: String,

    /// Concatenated passages (second system message)
    pub context: String,

    /// The user's question, verbatim
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source persona ID
    #[serde(rename = "sourcePersonaId")]
    pub source_persona_id: String,

    /// Number of passages placed in the context
    #[serde(rename = "passageCount")]
    pub passage_count: usize,
}
