//! Answer pipeline orchestration.
//!
//! Runs one question through moderation, retrieval, the confidence gate,
//! generation, citation extraction and confidence blending. Stages run
//! strictly in sequence and each external call is attempted once.

use crate::embeddings::create_provider;
use crate::pinecone_index::PineconeIndex;
use crate::rag::citations::CitationExtractor;
use crate::rag::confidence::combine;
use crate::rag::generator::AnswerGenerator;
use crate::rag::moderation::ModerationGate;
use crate::rag::policy::ConfidencePolicy;
use crate::rag::types::{ChatResponse, POLICY_VIOLATION_MESSAGE};
use crate::retriever::ContextRetriever;
use crate::types::Query;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use yaseen_core::{AppError, AppResult, Settings};
use yaseen_llm::{create_client, OpenAiClient};
use yaseen_prompt::resolve_persona;

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Moderating,
    Rejected,
    Retrieving,
    Deferred,
    Generating,
    ExtractingCitations,
    Combining,
    Completed,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Moderating => "moderating",
            Stage::Rejected => "rejected",
            Stage::Retrieving => "retrieving",
            Stage::Deferred => "deferred",
            Stage::Generating => "generating",
            Stage::ExtractingCitations => "extracting_citations",
            Stage::Combining => "combining",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        }
    }
}

fn enter(stage: Stage) {
    tracing::debug!(stage = stage.as_str(), "Pipeline stage");
}

/// The answering pipeline.
///
/// Holds only shared, immutable collaborators, so one instance serves
/// concurrent requests.
pub struct AnswerPipeline {
    moderation: ModerationGate,
    retriever: ContextRetriever,
    policy: ConfidencePolicy,
    generator: AnswerGenerator,
    citations: CitationExtractor,
}

impl AnswerPipeline {
    pub fn new(
        moderation: ModerationGate,
        retriever: ContextRetriever,
        policy: ConfidencePolicy,
        generator: AnswerGenerator,
        citations: CitationExtractor,
    ) -> Self {
        Self {
            moderation,
            retriever,
            policy,
            generator,
            citations,
        }
    }

    /// Build the pipeline and its service clients from settings.
    ///
    /// This is the composition root: the index handle is created here,
    /// once, and shared with the retriever.
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        settings.validate()?;

        let timeout = Duration::from_secs(settings.generation.timeout_secs);
        let openai_key = settings.openai_api_key.expose();

        let moderation = if settings.moderation_enabled {
            let client = OpenAiClient::with_base_url(&settings.openai_base_url, openai_key, timeout)?
                .with_moderation_model(&settings.moderation_model);
            ModerationGate::new(Arc::new(client))
        } else {
            ModerationGate::disabled()
        };

        let index = PineconeIndex::from_settings(settings)?;
        let embedder = create_provider(
            &settings.embedding,
            &settings.openai_base_url,
            openai_key,
            timeout,
        )?;
        let retriever = ContextRetriever::new(Arc::new(index), embedder, settings.top_k);

        // OpenAI generation shares the base URL with embeddings and moderation.
        let endpoint = settings.generation.endpoint.as_deref().or_else(|| {
            (settings.generation.provider == "openai").then_some(settings.openai_base_url.as_str())
        });
        let client = create_client(
            &settings.generation.provider,
            endpoint,
            Some(openai_key),
            timeout,
        )
        .map_err(|e| AppError::Config(format!("Failed to create generation client: {}", e)))?;

        let persona = resolve_persona(settings.persona_file.as_deref())?;
        let generator = AnswerGenerator::new(client, persona, &settings.generation)?;

        tracing::info!(
            index = %settings.index_name,
            moderation = settings.moderation_enabled,
            threshold = settings.confidence_threshold,
            model = %settings.generation.model,
            "Answer pipeline ready"
        );

        Ok(Self::new(
            moderation,
            retriever,
            ConfidencePolicy::new(settings.confidence_threshold)?,
            generator,
            CitationExtractor::new()?,
        ))
    }

    pub fn retriever(&self) -> &ContextRetriever {
        &self.retriever
    }

    /// Validate raw input, then answer it.
    pub async fn ask(&self, raw_query: &str) -> AppResult<ChatResponse> {
        let query = Query::parse(raw_query)?;
        self.answer(&query).await
    }

    /// Answer a validated question.
    pub async fn answer(&self, query: &Query) -> AppResult<ChatResponse> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("answer", %request_id);

        async {
            let result = self.run(query).await;
            if let Err(e) = &result {
                match e.kind() {
                    yaseen_core::ErrorKind::Client => {
                        tracing::info!(error = e.label(), "Request rejected: {}", e)
                    }
                    yaseen_core::ErrorKind::Server => {
                        tracing::error!(error = e.label(), "Request failed: {}", e)
                    }
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, query: &Query) -> AppResult<ChatResponse> {
        enter(Stage::Received);
        tracing::info!(query_len = query.as_str().chars().count(), "Question received");
        tracing::debug!(query = %query, "Question text");

        enter(Stage::Moderating);
        if self.moderation.moderate(query.as_str()).await {
            enter(Stage::Rejected);
            return Err(AppError::PolicyViolation(POLICY_VIOLATION_MESSAGE.to_string()));
        }

        enter(Stage::Retrieving);
        let retrieval = self
            .retriever
            .retrieve(query)
            .await
            .map_err(|e| fail(classify_retrieval_error(e)))?;

        if !self.policy.should_answer(retrieval.top_similarity) {
            enter(Stage::Deferred);
            tracing::info!(
                top_similarity = retrieval.top_similarity,
                threshold = self.policy.threshold(),
                "Low retrieval confidence; deferring"
            );
            return ChatResponse::deferral(retrieval.top_similarity).map_err(fail);
        }

        enter(Stage::Generating);
        let generation = self
            .generator
            .generate(&retrieval.texts(), query.as_str())
            .await
            .map_err(|e| fail(AppError::Generation(e.to_string())))?;

        enter(Stage::ExtractingCitations);
        let citations = self.citations.extract(&generation.answer_text);

        enter(Stage::Combining);
        let confidence = combine(retrieval.top_similarity, generation.model_confidence);

        let response =
            ChatResponse::new(generation.answer_text, citations, confidence).map_err(fail)?;

        enter(Stage::Completed);
        tracing::info!(
            citations = response.citations().len(),
            confidence = response.confidence(),
            "Answer completed"
        );

        Ok(response)
    }
}

fn fail(error: AppError) -> AppError {
    enter(Stage::Failed);
    error
}

/// Keep configuration problems distinct; everything else is a retrieval failure.
fn classify_retrieval_error(error: AppError) -> AppError {
    match error {
        AppError::IndexNotFound { .. } | AppError::Config(_) | AppError::Retrieval(_) => error,
        other => AppError::Retrieval(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_retrieval_error() {
        let err = classify_retrieval_error(AppError::Knowledge("timeout".to_string()));
        assert!(matches!(err, AppError::Retrieval(_)));

        let err = classify_retrieval_error(AppError::IndexNotFound {
            index: "kb".to_string(),
        });
        assert!(matches!(err, AppError::IndexNotFound { .. }));

        let err = classify_retrieval_error(AppError::Config("dims".to_string()));
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::ExtractingCitations.as_str(), "extracting_citations");
        assert_eq!(Stage::Failed.as_str(), "failed");
    }
}
