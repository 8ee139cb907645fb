//! Error types for the Yaseen answering service.
//!
//! This module defines a unified error enum covering every failure the
//! answer pipeline can surface, plus the mapping from an error to the
//! message a caller is allowed to see.

use thiserror::Error;

/// Unified error type for Yaseen.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credentials, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configured vector index does not exist
    #[error("Vector index '{index}' not found. Did you run the ingestion script?")]
    IndexNotFound { index: String },

    /// Malformed or too-short input, rejected before any external call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Input flagged by the moderation service
    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    /// Embedding or vector search failed while answering a request
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// The completion call failed while answering a request
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The moderation service itself failed (absorbed by the gate)
    #[error("Moderation service error: {0}")]
    Moderation(String),

    /// LLM provider transport errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding and vector index provider errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Persona and prompt errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A response violated one of its construction invariants
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Which side of the boundary an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something we refuse to process
    Client,
    /// Something on our side (or a collaborator) failed
    Server,
}

/// Shown for every infrastructure failure; the cause stays in the logs.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while answering your question. Please try again later.";

/// Shown when the service cannot run because of operator configuration.
pub const CONFIGURATION_FAILURE_MESSAGE: &str =
    "The service is not configured correctly. Please try again later.";

impl AppError {
    /// Classify the error as client-side or server-side.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) | AppError::PolicyViolation(_) => ErrorKind::Client,
            _ => ErrorKind::Server,
        }
    }

    /// Short stable label, used in logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            AppError::Config(_) | AppError::IndexNotFound { .. } => "configuration_error",
            AppError::Validation(_) => "validation_error",
            AppError::PolicyViolation(_) => "policy_violation",
            AppError::Retrieval(_) => "retrieval_failure",
            AppError::Generation(_) => "generation_failure",
            AppError::Moderation(_) => "moderation_degraded",
            AppError::Llm(_) => "llm_error",
            AppError::Knowledge(_) => "knowledge_error",
            AppError::Prompt(_) => "prompt_error",
            AppError::InvalidResponse(_) => "invalid_response",
            AppError::Io(_) => "io_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::Other(_) => "internal_error",
        }
    }

    /// The message a caller may see.
    ///
    /// Client-side failures carry an actionable message. Server-side
    /// failures never expose their cause.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::PolicyViolation(msg) => msg.clone(),
            AppError::Config(_) | AppError::IndexNotFound { .. } => {
                CONFIGURATION_FAILURE_MESSAGE.to_string()
            }
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = AppError::PolicyViolation(
            "Your question violates content policy. Please rephrase.".to_string(),
        );
        assert_eq!(err.kind(), ErrorKind::Client);
        assert!(err.user_message().contains("Please rephrase"));

        let err = AppError::Validation("Query must be at least 3 characters".to_string());
        assert_eq!(err.kind(), ErrorKind::Client);
        assert_eq!(err.user_message(), "Query must be at least 3 characters");
    }

    #[test]
    fn test_server_errors_hide_their_cause() {
        let err = AppError::Generation("upstream 500: secret stack trace".to_string());
        assert_eq!(err.kind(), ErrorKind::Server);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert!(!err.user_message().contains("secret"));

        let err = AppError::IndexNotFound {
            index: "islamic-kb".to_string(),
        };
        assert_eq!(err.user_message(), CONFIGURATION_FAILURE_MESSAGE);
        assert!(err.to_string().contains("ingestion"));
    }

    #[test]
    fn test_retrieval_and_generation_are_distinct() {
        let retrieval = AppError::Retrieval("timeout".to_string());
        let generation = AppError::Generation("timeout".to_string());
        let config = AppError::IndexNotFound {
            index: "kb".to_string(),
        };

        assert_ne!(retrieval.label(), generation.label());
        assert_ne!(retrieval.label(), config.label());
        assert_ne!(generation.label(), config.label());
    }
}
