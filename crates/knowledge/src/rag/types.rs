//! Answer pipeline response types.

use serde::{Deserialize, Serialize};
use yaseen_core::{AppError, AppResult};

/// Fixed answer returned when retrieval confidence is below the threshold.
pub const DEFERRAL_ANSWER: &str =
    "I'm not sure about that. It may be best to consult a qualified scholar.";

/// Message returned when moderation flags the question.
pub const POLICY_VIOLATION_MESSAGE: &str =
    "Your question violates content policy. Please rephrase.";

/// Source category of a citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationKind {
    /// Primary scripture, referenced as `chapter:verse`
    Quran,
    /// Secondary tradition, referenced by collection and number
    Hadith,
}

/// A structured reference parsed from generated text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "type")]
    pub kind: CitationKind,

    #[serde(rename = "ref")]
    pub reference: String,
}

impl Citation {
    pub fn quran(reference: impl Into<String>) -> Self {
        Self {
            kind: CitationKind::Quran,
            reference: reference.into(),
        }
    }

    pub fn hadith(reference: impl Into<String>) -> Self {
        Self {
            kind: CitationKind::Hadith,
            reference: reference.into(),
        }
    }

    /// Render back into the inline marker grammar.
    pub fn to_marker(&self) -> String {
        match self.kind {
            CitationKind::Quran => format!("[[Q {}]]", self.reference),
            CitationKind::Hadith => format!("[[{}]]", self.reference),
        }
    }
}

/// Raw output of the answer generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Model output, verbatim
    pub answer_text: String,

    /// Confidence proxy in `[0, 1]`
    pub model_confidence: f32,
}

/// Final response for one question.
///
/// Fields are private so the confidence bound is checked on every path
/// that creates one, deserialization included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedChatResponse")]
pub struct ChatResponse {
    answer: String,
    citations: Vec<Citation>,
    confidence: f32,
}

#[derive(Deserialize)]
struct UncheckedChatResponse {
    answer: String,
    #[serde(default)]
    citations: Vec<Citation>,
    confidence: f32,
}

impl TryFrom<UncheckedChatResponse> for ChatResponse {
    type Error = AppError;

    fn try_from(raw: UncheckedChatResponse) -> AppResult<Self> {
        ChatResponse::new(raw.answer, raw.citations, raw.confidence)
    }
}

impl ChatResponse {
    /// Build a response, rejecting confidence outside `[0, 1]`.
    pub fn new(answer: String, citations: Vec<Citation>, confidence: f32) -> AppResult<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AppError::InvalidResponse(format!(
                "confidence must be in [0, 1], got {}",
                confidence
            )));
        }

        Ok(Self {
            answer,
            citations,
            confidence,
        })
    }

    /// The low-confidence response: fixed text, no citations.
    pub fn deferral(top_similarity: f32) -> AppResult<Self> {
        Self::new(DEFERRAL_ANSWER.to_string(), Vec::new(), top_similarity)
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn is_deferral(&self) -> bool {
        self.answer == DEFERRAL_ANSWER && self.citations.is_empty()
    }
}
