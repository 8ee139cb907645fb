//! Confidence policy: answer or defer.

use yaseen_core::config::DEFAULT_CONFIDENCE_THRESHOLD;
use yaseen_core::{AppError, AppResult};

/// Threshold gate on retrieval confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidencePolicy {
    threshold: f32,
}

impl ConfidencePolicy {
    /// Create a policy; the threshold must lie in `[0, 1]`.
    pub fn new(threshold: f32) -> AppResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::Config(format!(
                "Confidence threshold must be in [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Proceed to generation only when `top_similarity >= threshold`.
    pub fn should_answer(&self, top_similarity: f32) -> bool {
        should_answer(top_similarity, self.threshold)
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

pub fn should_answer(top_similarity: f32, threshold: f32) -> bool {
    top_similarity >= threshold
}
