//! Confidence-gated answering.
//!
//! Moderation, retrieval, the answer-or-defer policy, generation,
//! citation extraction and confidence blending, sequenced by
//! [`AnswerPipeline`].

pub mod ask;
pub mod citations;
pub mod confidence;
pub mod generator;
pub mod moderation;
pub mod policy;
pub mod types;

pub use ask::{AnswerPipeline, Stage};
pub use citations::{CitationExtractor, HADITH_COLLECTIONS};
pub use confidence::combine;
pub use generator::{AnswerGenerator, GENERATION_CONFIDENCE};
pub use moderation::ModerationGate;
pub use policy::ConfidencePolicy;
pub use types::{
    ChatResponse, Citation, CitationKind, GenerationResult, DEFERRAL_ANSWER,
    POLICY_VIOLATION_MESSAGE,
};
