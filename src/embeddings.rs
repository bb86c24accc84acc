//! Vector Embeddings for Similarity Search
//!
//! Embeddings come from an Azure OpenAI deployment when one is fully
//! configured. Otherwise a stub provider returns a zero vector for every
//! input. The choice is made once, when the embedder is built, and is never
//! revisited for the life of the process.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{AzureOpenAiConfig, EMBEDDING_DIMENSION};
use crate::error::{ToolError, ToolResult};

/// Source of text embeddings
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed already-normalized text
    async fn embed(&self, text: &str) -> ToolResult<Vec<f32>>;

    /// Length of vectors this provider returns
    fn dimension(&self) -> usize;

    /// Whether this provider talks to a real endpoint
    fn is_live(&self) -> bool;
}

/// Shared embedder handle
pub type Embedder = Arc<dyn EmbeddingProvider>;

/// Pick the embedding provider for this process.
///
/// Falls back to [`ZeroEmbeddingProvider`] when any Azure setting is missing or
/// the HTTP client cannot be built.
pub fn embedder_from_config(azure: &AzureOpenAiConfig, timeout: Duration) -> Embedder {
    match AzureEmbeddingProvider::new(azure, timeout) {
        Ok(provider) => {
            info!("Embedding deployment '{}' enabled", provider.deployment);
            Arc::new(provider)
        }
        Err(e) => {
            warn!("Embedding client unavailable ({}), using zero vectors", e);
            Arc::new(ZeroEmbeddingProvider::default())
        }
    }
}

/// Embed text after collapsing newlines to spaces
pub async fn get_embedding(provider: &dyn EmbeddingProvider, text: &str) -> ToolResult<Vec<f32>> {
    let normalized = text.replace('\n', " ");
    provider.embed(&normalized).await
}

/// Azure OpenAI embeddings response
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Live provider backed by an Azure OpenAI embedding deployment
pub struct AzureEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
    deployment: String,
}

impl AzureEmbeddingProvider {
    pub fn new(config: &AzureOpenAiConfig, timeout: Duration) -> ToolResult<Self> {
        let missing = config.missing();
        if !missing.is_empty() {
            return Err(ToolError::Internal(format!(
                "missing settings: {}",
                missing.join(", ")
            )));
        }

        // All four are present after the check above
        let endpoint = config.endpoint.as_deref().unwrap_or_default().trim_end_matches('/');
        let api_key = config.api_key.clone().unwrap_or_default();
        let api_version = config.api_version.as_deref().unwrap_or_default();
        let deployment = config.embedding_deployment.clone().unwrap_or_default();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let url = format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            endpoint, deployment, api_version
        );

        Ok(Self {
            client,
            url,
            api_key,
            deployment,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for AzureEmbeddingProvider {
    async fn embed(&self, text: &str) -> ToolResult<Vec<f32>> {
        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&serde_json::json!({ "input": [text] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Internal(format!(
                "Embedding request failed: {}",
                status
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ToolError::Internal("Embedding response had no data".to_string()))
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    fn is_live(&self) -> bool {
        true
    }
}

/// Stub provider used when no live client could be built
#[derive(Debug, Clone)]
pub struct ZeroEmbeddingProvider {
    dimension: usize,
}

impl Default for ZeroEmbeddingProvider {
    fn default() -> Self {
        Self {
            dimension: EMBEDDING_DIMENSION,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ZeroEmbeddingProvider {
    async fn embed(&self, _text: &str) -> ToolResult<Vec<f32>> {
        Ok(vec![0.0; self.dimension])
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Cosine similarity; exactly 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Rank candidates by similarity to the query, best first
pub fn rank_by_similarity<T: Clone>(
    query: &[f32],
    candidates: &[(T, Vec<f32>)],
    top_k: usize,
) -> Vec<(T, f32)> {
    let mut scores: Vec<(T, f32)> = candidates
        .iter()
        .map(|(item, emb)| (item.clone(), cosine_similarity(query, emb)))
        .collect();

    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores.truncate(top_k);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records what it was asked to embed
    struct RecordingProvider {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        async fn embed(&self, text: &str) -> ToolResult<Vec<f32>> {
            self.seen.lock().unwrap().push(text.to_string());
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn is_live(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let v = vec![0.3, -2.0, 7.5];
        let zero = vec![0.0; 3];
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_rank_by_similarity() {
        let query = vec![1.0, 0.0, 0.0];
        let candidates = vec![
            ("a", vec![1.0, 0.0, 0.0]),
            ("b", vec![0.0, 1.0, 0.0]),
            ("c", vec![0.7, 0.7, 0.0]),
        ];

        let results = rank_by_similarity(&query, &candidates, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert_eq!(results[1].0, "c");
    }

    #[test]
    fn test_incomplete_config_falls_back_to_stub() {
        let azure = AzureOpenAiConfig {
            endpoint: Some("https://contoso.openai.azure.com".to_string()),
            ..Default::default()
        };
        let embedder = embedder_from_config(&azure, Duration::from_secs(1));
        assert!(!embedder.is_live());
        assert_eq!(embedder.dimension(), EMBEDDING_DIMENSION);
    }

    #[test]
    fn test_complete_config_builds_live_provider() {
        let azure = AzureOpenAiConfig {
            endpoint: Some("https://contoso.openai.azure.com/".to_string()),
            api_key: Some("key".to_string()),
            api_version: Some("2024-02-01".to_string()),
            embedding_deployment: Some("text-embedding-ada-002".to_string()),
        };
        let provider = AzureEmbeddingProvider::new(&azure, Duration::from_secs(1)).unwrap();
        assert!(provider.is_live());
        assert_eq!(
            provider.url,
            "https://contoso.openai.azure.com/openai/deployments/text-embedding-ada-002/embeddings?api-version=2024-02-01"
        );
    }

    #[tokio::test]
    async fn test_stub_returns_zero_vector_every_call() {
        let embedder = embedder_from_config(&AzureOpenAiConfig::default(), Duration::from_secs(1));
        for text in ["roaming fees", "", "line one\nline two"] {
            let v = get_embedding(embedder.as_ref(), text).await.unwrap();
            assert_eq!(v.len(), 1536);
            assert!(v.iter().all(|x| *x == 0.0));
        }
    }

    #[tokio::test]
    async fn test_get_embedding_collapses_newlines() {
        let provider = RecordingProvider {
            seen: Mutex::new(Vec::new()),
        };
        get_embedding(&provider, "first\nsecond\n").await.unwrap();
        assert_eq!(provider.seen.lock().unwrap()[0], "first second ");
    }
}
