//! Moderation gate.
//!
//! Every other pipeline stage propagates its failures. This one does not:
//! when the moderation service itself fails, the gate lets the request
//! through and logs a warning. Keeping that rule here, in one function,
//! keeps it auditable.

use std::sync::Arc;
use yaseen_llm::ModerationClient;

/// Decides whether a question is blocked by content policy.
pub struct ModerationGate {
    client: Option<Arc<dyn ModerationClient>>,
}

impl ModerationGate {
    /// A gate that consults `client` on every question.
    pub fn new(client: Arc<dyn ModerationClient>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// A gate that never blocks and never calls out.
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Returns `true` when the text is flagged.
    ///
    /// Fails open: a service error yields `false`.
    pub async fn moderate(&self, text: &str) -> bool {
        let Some(client) = &self.client else {
            return false;
        };

        match client.classify(text).await {
            Ok(verdict) => {
                if verdict.flagged {
                    tracing::info!(
                        categories = ?verdict.categories,
                        "Question flagged by moderation"
                    );
                }
                verdict.flagged
            }
            Err(e) => {
                tracing::warn!(
                    provider = client.provider_name(),
                    error = %e,
                    "Moderation check failed; allowing request"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use yaseen_core::{AppError, AppResult};
    use yaseen_llm::ModerationVerdict;

    struct ScriptedModeration {
        verdict: Option<ModerationVerdict>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ModerationClient for ScriptedModeration {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn classify(&self, _text: &str) -> AppResult<ModerationVerdict> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict
                .clone()
                .ok_or_else(|| AppError::Moderation("connection reset".to_string()))
        }
    }

    fn scripted(verdict: Option<ModerationVerdict>) -> Arc<ScriptedModeration> {
        Arc::new(ScriptedModeration {
            verdict,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_disabled_gate_never_blocks() {
        let gate = ModerationGate::disabled();
        assert!(!gate.is_enabled());
        assert!(!gate.moderate("anything").await);
    }

    #[tokio::test]
    async fn test_flagged_text_is_blocked() {
        let client = scripted(Some(ModerationVerdict::flagged(vec!["hate".to_string()])));
        let gate = ModerationGate::new(client.clone());

        assert!(gate.moderate("bad text").await);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clean_text_passes() {
        let gate = ModerationGate::new(scripted(Some(ModerationVerdict::clean())));
        assert!(!gate.moderate("What is zakat?").await);
    }

    #[tokio::test]
    async fn test_service_failure_fails_open() {
        let client = scripted(None);
        let gate = ModerationGate::new(client.clone());

        assert!(!gate.moderate("What is zakat?").await);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
