//! Core retrieval types.

use serde::{Deserialize, Serialize};
use yaseen_core::{AppError, AppResult};

/// Minimum length of a question after trimming.
pub const MIN_QUERY_CHARS: usize = 3;

/// A validated user question.
///
/// Construction is the only place the length rule is checked, so every
/// `Query` that reaches the pipeline is already trimmed and long enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Trim and validate raw input.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return Err(AppError::Validation(format!(
                "Question must be at least {} characters long.",
                MIN_QUERY_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A passage returned by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage text as stored at ingestion time
    pub text: String,

    /// Cosine similarity to the query, higher is closer
    #[serde(rename = "similarityScore")]
    pub similarity_score: f32,
}

/// Ranked passages plus the best-match similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Most similar first
    pub passages: Vec<RetrievedPassage>,

    /// Similarity of the first passage, `0.0` when there is none
    #[serde(rename = "topSimilarity")]
    pub top_similarity: f32,
}

impl RetrievalResult {
    /// Build a result, ranking passages and deriving `top_similarity`.
    pub fn from_passages(mut passages: Vec<RetrievedPassage>) -> Self {
        passages.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        let top_similarity = passages.first().map(|p| p.similarity_score).unwrap_or(0.0);
        Self {
            passages,
            top_similarity,
        }
    }

    pub fn empty() -> Self {
        Self::from_passages(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Passage texts in rank order.
    pub fn texts(&self) -> Vec<String> {
        self.passages.iter().map(|p| p.text.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(text: &str, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            text: text.to_string(),
            similarity_score: score,
        }
    }

    #[test]
    fn test_query_is_trimmed() {
        let query = Query::parse("   Who is Allah?  ").unwrap();
        assert_eq!(query.as_str(), "Who is Allah?");
    }

    #[test]
    fn test_query_too_short() {
        assert!(matches!(Query::parse("hi"), Err(AppError::Validation(_))));
        assert!(matches!(Query::parse("  ab   "), Err(AppError::Validation(_))));
        assert!(matches!(Query::parse(""), Err(AppError::Validation(_))));
        assert!(Query::parse("abc").is_ok());
    }

    #[test]
    fn test_query_length_counts_characters() {
        // Three multi-byte characters are long enough.
        assert!(Query::parse("صبر").is_ok());
    }

    #[test]
    fn test_result_is_ranked() {
        let result = RetrievalResult::from_passages(vec![
            passage("low", 0.2),
            passage("high", 0.9),
            passage("mid", 0.5),
        ]);

        assert_eq!(result.top_similarity, 0.9);
        assert_eq!(result.texts(), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_empty_result() {
        let result = RetrievalResult::empty();
        assert!(result.is_empty());
        assert_eq!(result.top_similarity, 0.0);
    }

    #[test]
    fn test_serialized_shape() {
        let result = RetrievalResult::from_passages(vec![passage("text", 0.5)]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["topSimilarity"], 0.5);
        assert_eq!(json["passages"][0]["similarityScore"], 0.5);
    }
}
