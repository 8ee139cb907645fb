//! Content moderation abstraction.

use serde::{Deserialize, Serialize};
use yaseen_core::AppResult;

/// Outcome of classifying a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Whether the text violates policy
    pub flagged: bool,

    /// Names of the categories that triggered, for logging
    #[serde(default)]
    pub categories: Vec<String>,
}

impl ModerationVerdict {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn flagged(categories: Vec<String>) -> Self {
        Self {
            flagged: true,
            categories,
        }
    }
}

/// Trait for moderation classifiers.
#[async_trait::async_trait]
pub trait ModerationClient: Send + Sync {
    /// Get the provider name.
    fn provider_name(&self) -> &str;

    /// Classify `text`. Errors are returned, never swallowed, here.
    async fn classify(&self, text: &str) -> AppResult<ModerationVerdict>;
}
