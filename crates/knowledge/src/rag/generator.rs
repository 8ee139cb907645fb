//! Answer generation conditioned on retrieved passages.

use crate::rag::citations::HADITH_COLLECTIONS;
use crate::rag::types::GenerationResult;
use std::sync::Arc;
use yaseen_core::config::GenerationSettings;
use yaseen_core::AppResult;
use yaseen_llm::{ChatMessage, LlmClient, LlmRequest};
use yaseen_prompt::{build_prompt, render_persona, PersonaDefinition};

/// Confidence reported for every well-formed completion.
///
/// Placeholder until the provider exposes a per-response likelihood. Any
/// replacement must stay in `[0, 1]`; the combiner averages it with the
/// retrieval score as is.
pub const GENERATION_CONFIDENCE: f32 = 0.9;

/// Sends one completion request per question.
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    persona: PersonaDefinition,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnswerGenerator {
    /// Create a generator; fails if the persona template does not render.
    pub fn new(
        client: Arc<dyn LlmClient>,
        persona: PersonaDefinition,
        settings: &GenerationSettings,
    ) -> AppResult<Self> {
        render_persona(&persona, HADITH_COLLECTIONS)?;

        Ok(Self {
            client,
            persona,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    /// Build the message sequence: persona, context, question.
    pub fn build_messages(&self, passages: &[String], query: &str) -> AppResult<Vec<ChatMessage>> {
        let prompt = build_prompt(&self.persona, passages, query, HADITH_COLLECTIONS)?;

        Ok(vec![
            ChatMessage::system(prompt.system),
            ChatMessage::system(prompt.context),
            ChatMessage::user(prompt.user),
        ])
    }

    /// Generate an answer. Errors from the provider are returned as is.
    pub async fn generate(&self, passages: &[String], query: &str) -> AppResult<GenerationResult> {
        let messages = self.build_messages(passages, query)?;

        let request = LlmRequest::new(messages, &self.model)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);

        tracing::debug!(
            provider = self.client.provider_name(),
            model = %self.model,
            passages = passages.len(),
            "Generating answer"
        );

        let response = self.client.complete(&request).await?;

        tracing::debug!(
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Answer generated"
        );

        Ok(GenerationResult {
            answer_text: response.content,
            model_confidence: GENERATION_CONFIDENCE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use yaseen_core::AppError;
    use yaseen_llm::{ChatRole, LlmResponse, LlmUsage};

    /// Records the last request and replies with a fixed answer.
    struct RecordingClient {
        reply: AppResult<String>,
        last: Mutex<Option<LlmRequest>>,
    }

    impl RecordingClient {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for RecordingClient {
        fn provider_name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            *self.last.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::new(10, 5),
                    finish_reason: Some("stop".to_string()),
                }),
                Err(e) => Err(AppError::Llm(e.to_string())),
            }
        }
    }

    fn generator(client: Arc<RecordingClient>) -> AnswerGenerator {
        let persona = yaseen_prompt::default_persona().unwrap();
        AnswerGenerator::new(client, persona, &GenerationSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_message_order_and_request_bounds() {
        let client = RecordingClient::replying("Answer [[Q 2:255]]");
        let generator = generator(client.clone());

        let passages = vec!["Ayat al-Kursi".to_string(), "Al-Ikhlas".to_string()];
        let result = generator.generate(&passages, "Who is Allah?").await.unwrap();

        assert_eq!(result.answer_text, "Answer [[Q 2:255]]");
        assert_eq!(result.model_confidence, GENERATION_CONFIDENCE);

        let request = client.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert!(request.messages[0].content.contains("[[Bukhari book:number]]"));
        assert_eq!(request.messages[1].role, ChatRole::System);
        assert_eq!(request.messages[1].content, "Ayat al-Kursi\nAl-Ikhlas");
        assert_eq!(request.messages[2].role, ChatRole::User);
        assert_eq!(request.messages[2].content, "Who is Allah?");
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let client = Arc::new(RecordingClient {
            reply: Err(AppError::Other("timeout".to_string())),
            last: Mutex::new(None),
        });
        let generator = generator(client);

        assert!(generator.generate(&[], "Who is Allah?").await.is_err());
    }

    #[test]
    fn test_bad_template_rejected_at_construction() {
        let mut persona = yaseen_prompt::default_persona().unwrap();
        persona.template = "{{#each collections}}unclosed".to_string();

        let result = AnswerGenerator::new(
            RecordingClient::replying("x"),
            persona,
            &GenerationSettings::default(),
        );
        assert!(result.is_err());
    }
}
