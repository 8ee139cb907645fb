//! Confidence combination.

/// Unweighted mean of retrieval and generation confidence.
///
/// Inputs are expected in `[0, 1]` and are not clamped; an out-of-range
/// result is rejected when the response is built.
pub fn combine(retrieval_confidence: f32, generation_confidence: f32) -> f32 {
    (retrieval_confidence + generation_confidence) / 2.0
}
