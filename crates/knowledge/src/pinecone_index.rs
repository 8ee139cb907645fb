//! Pinecone vector index over its REST API.
//!
//! The control plane (`GET /indexes/{name}`) tells us whether the index
//! exists and which data-plane host serves it. That lookup happens once per
//! handle; the host is cached and every later call goes straight to the
//! data plane.

use crate::vector_index::{IndexMatch, VectorIndex};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use yaseen_core::{AppError, AppResult, Settings};

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

/// Control-plane view of an index.
#[derive(Debug, Clone, Deserialize)]
struct IndexModel {
    name: String,
    dimension: usize,
    host: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: u64,
}

/// Handle to one Pinecone index.
///
/// Cheap to share behind an `Arc`; all state after construction is either
/// immutable or the write-once host cache.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    namespace: Option<String>,
    control_plane_url: String,
    timeout: Duration,
    model: OnceCell<IndexModel>,
}

impl PineconeIndex {
    /// Handle for the configured index, bounded by the shared request timeout.
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Self::with_control_plane_url(
            CONTROL_PLANE_URL,
            settings.pinecone_api_key.expose(),
            &settings.index_name,
            settings.namespace.clone(),
            Duration::from_secs(settings.generation.timeout_secs),
        )
    }

    /// Create a handle against a custom control plane.
    pub fn with_control_plane_url(
        control_plane_url: impl Into<String>,
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        namespace: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Config("Pinecone requires an API key".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::Knowledge(format!("Failed to create HTTP client for Pinecone: {}", e))
            })?;

        Ok(Self {
            client,
            api_key,
            index_name: index_name.into(),
            namespace: namespace.filter(|ns| !ns.is_empty()),
            control_plane_url: control_plane_url.into().trim_end_matches('/').to_string(),
            timeout,
            model: OnceCell::new(),
        })
    }

    /// Resolve the index on first use and cache the result.
    async fn model(&self) -> AppResult<&IndexModel> {
        self.model.get_or_try_init(|| self.fetch_model()).await
    }

    async fn fetch_model(&self) -> AppResult<IndexModel> {
        let url = format!("{}/indexes/{}", self.control_plane_url, self.index_name);
        tracing::debug!(
            index = %self.index_name,
            timeout_secs = self.timeout.as_secs(),
            "Resolving Pinecone index host"
        );

        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to reach Pinecone: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::IndexNotFound {
                index: self.index_name.clone(),
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Knowledge(format!(
                "Pinecone describe_index error ({}): {}",
                status, body
            )));
        }

        let model: IndexModel = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse Pinecone index: {}", e)))?;

        tracing::info!(
            index = %model.name,
            host = %model.host,
            dimension = model.dimension,
            "Pinecone index resolved"
        );

        Ok(model)
    }

    async fn post_data_plane<B, R>(&self, path: &str, body: &B) -> AppResult<R>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let model = self.model().await?;
        let url = data_plane_url(&model.host, path);

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Pinecone request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Knowledge(format!(
                "Pinecone {} error ({}): {}",
                path, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse Pinecone response: {}", e)))
    }
}

fn data_plane_url(host: &str, path: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}{}", host.trim_end_matches('/'), path)
    } else {
        format!("https://{}{}", host.trim_end_matches('/'), path)
    }
}

fn convert_matches(response: QueryResponse) -> Vec<IndexMatch> {
    response
        .matches
        .into_iter()
        .map(|m| IndexMatch {
            text: m.metadata.and_then(|meta| meta.text).unwrap_or_default(),
            id: m.id,
            score: m.score,
        })
        .collect()
}

#[async_trait::async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.index_name
    }

    async fn dimension(&self) -> AppResult<usize> {
        Ok(self.model().await?.dimension)
    }

    async fn total_vectors(&self) -> AppResult<u64> {
        let stats: IndexStats = self
            .post_data_plane("/describe_index_stats", &serde_json::json!({}))
            .await?;
        Ok(stats.total_vector_count)
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<IndexMatch>> {
        let request = QueryRequest {
            vector: embedding,
            top_k,
            include_metadata: true,
            namespace: self.namespace.as_deref(),
        };

        let response: QueryResponse = self.post_data_plane("/query", &request).await?;
        Ok(convert_matches(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_shape() {
        let vector = [0.1, 0.2];
        let request = QueryRequest {
            vector: &vector,
            top_k: 5,
            include_metadata: true,
            namespace: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 5);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn test_matches_read_metadata_text() {
        let json = r#"{
            "matches": [
                {"id": "q-2-255", "score": 0.91, "metadata": {"text": "Allah - there is no deity except Him"}},
                {"id": "no-meta", "score": 0.40}
            ],
            "namespace": ""
        }"#;
        let response: QueryResponse = serde_json::from_str(json).unwrap();
        let matches = convert_matches(response);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "q-2-255");
        assert!(matches[0].text.starts_with("Allah"));
        assert!(matches[1].text.is_empty());
    }

    #[test]
    fn test_empty_matches() {
        let response: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(convert_matches(response).is_empty());
    }

    #[test]
    fn test_index_model_parse() {
        let json = r#"{"name":"islamic-kb","dimension":1536,"metric":"cosine",
            "host":"islamic-kb-abc.svc.pinecone.io","status":{"ready":true,"state":"Ready"}}"#;
        let model: IndexModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.dimension, 1536);
        assert_eq!(
            data_plane_url(&model.host, "/query"),
            "https://islamic-kb-abc.svc.pinecone.io/query"
        );
    }

    #[test]
    fn test_data_plane_url_keeps_scheme() {
        assert_eq!(
            data_plane_url("http://localhost:5080/", "/query"),
            "http://localhost:5080/query"
        );
    }

    fn handle(api_key: &str, namespace: Option<String>) -> AppResult<PineconeIndex> {
        PineconeIndex::with_control_plane_url(
            CONTROL_PLANE_URL,
            api_key,
            "kb",
            namespace,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_requires_api_key() {
        assert!(handle("", None).is_err());
    }

    #[test]
    fn test_empty_namespace_is_dropped() {
        let index = handle("pc-key", Some(String::new())).unwrap();
        assert!(index.namespace.is_none());
        assert_eq!(index.name(), "kb");
    }

    #[test]
    fn test_from_settings_uses_configured_timeout() {
        let mut settings = Settings::default();
        settings.pinecone_api_key = yaseen_core::config::Secret::new("pc-key");
        settings.generation.timeout_secs = 7;

        let index = PineconeIndex::from_settings(&settings).unwrap();
        assert_eq!(index.timeout, Duration::from_secs(7));
        assert_eq!(index.control_plane_url, CONTROL_PLANE_URL);
        assert_eq!(index.name(), settings.index_name);
    }
}
