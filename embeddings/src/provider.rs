//! Embedding providers.
//!
//! A provider turns an ordered batch of texts into an equally long, equally
//! ordered batch of vectors. The OpenAI-compatible provider is the one used
//! in production; tests plug in their own implementations of the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::{DEFAULT_ENGINE, Embedding};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Request for generating embeddings for a batch of texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Texts to embed, in order.
    pub texts: Vec<String>,

    /// Model to use (provider-specific).
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(texts: Vec<String>) -> Self {
        Self { texts, model: None }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Number of texts in the request.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the request carries no texts.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// One embedding per requested text, in request order.
    pub embeddings: Vec<Embedding>,

    /// Model used to generate the embeddings.
    pub model: String,

    /// Token usage (if available).
    pub tokens_used: Option<u64>,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Generate embeddings for every text in the request.
    ///
    /// Implementations must return exactly one embedding per input text, in
    /// the order the texts were given.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// OpenAI embedding provider.
pub struct OpenAIProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider.
    ///
    /// Reads `OPENAI_API_KEY` and, if set, `OPENAI_API_BASE` from the
    /// environment.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: std::env::var("OPENAI_API_BASE")
                .ok()
                .filter(|base| !base.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client: reqwest::Client::new(),
            default_model: DEFAULT_ENGINE.to_string(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        if request.is_empty() {
            return Ok(EmbeddingResponse {
                embeddings: Vec::new(),
                model,
                tokens_used: None,
            });
        }

        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        debug!(
            "Generating batch embeddings for {} texts with model: {model}",
            request.len()
        );

        let body = serde_json::json!({
            "input": request.texts,
            "model": model
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let mut result: OpenAIEmbeddingResponse = response.json().await?;
        result.data.sort_by_key(|item| item.index);

        if result.data.len() != request.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "{} embeddings returned for {} inputs",
                result.data.len(),
                request.len()
            )));
        }

        // After sorting, indices must be exactly 0..n.
        if let Some((position, item)) = result
            .data
            .iter()
            .enumerate()
            .find(|(position, item)| item.index != *position)
        {
            return Err(EmbeddingError::InvalidResponse(format!(
                "embedding index {} found at position {position}",
                item.index
            )));
        }

        let embeddings: Vec<Embedding> = result
            .data
            .into_iter()
            .map(|item| item.embedding)
            .collect();

        debug!("Generated {} batch embeddings", embeddings.len());

        Ok(EmbeddingResponse {
            embeddings,
            model: result.model,
            tokens_used: result.usage.map(|u| u.total_tokens),
        })
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    model: String,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAIProvider {
        OpenAIProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri())
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new(texts(&["a", "b"])).with_model("text-embedding-3-small");

        assert_eq!(request.len(), 2);
        assert_eq!(request.model, Some("text-embedding-3-small".to_string()));
    }

    #[test]
    fn test_openai_provider_defaults_to_default_engine() {
        let provider = OpenAIProvider::new().with_api_key("k");
        assert_eq!(provider.default_model(), DEFAULT_ENGINE);
        assert!(provider.is_available());
    }

    #[tokio::test]
    async fn test_embed_restores_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "input": ["first", "second"],
                "model": "engine-x"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"embedding": [2.0, 2.0], "index": 1},
                    {"embedding": [1.0, 1.0], "index": 0}
                ],
                "model": "engine-x",
                "usage": {"prompt_tokens": 4, "total_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider_for(&server)
            .embed(EmbeddingRequest::new(texts(&["first", "second"])).with_model("engine-x"))
            .await
            .unwrap();

        assert_eq!(response.embeddings, vec![vec![1.0, 1.0], vec![2.0, 2.0]]);
        assert_eq!(response.model, "engine-x");
        assert_eq!(response.tokens_used, Some(4));
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .embed(EmbeddingRequest::new(texts(&["x"])))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::RateLimited {
                retry_after_secs: 7
            }
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_api_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .embed(EmbeddingRequest::new(texts(&["x"])))
            .await
            .unwrap_err();

        match err {
            EmbeddingError::ApiRequest(message) => assert!(message.contains("bad key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_count_mismatch_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [1.0], "index": 0}],
                "model": "m"
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .embed(EmbeddingRequest::new(texts(&["a", "b"])))
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_duplicate_or_missing_index_is_invalid_response() {
        for indices in [[0, 0], [0, 2]] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/embeddings"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "data": [
                        {"embedding": [1.0], "index": indices[0]},
                        {"embedding": [9.0], "index": indices[1]}
                    ],
                    "model": "m"
                })))
                .expect(1)
                .mount(&server)
                .await;

            let err = provider_for(&server)
                .embed(EmbeddingRequest::new(texts(&["a", "b"])))
                .await
                .unwrap_err();

            assert!(
                matches!(err, EmbeddingError::InvalidResponse(_)),
                "indices {indices:?} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let provider = OpenAIProvider {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            default_model: DEFAULT_ENGINE.to_string(),
        };

        let err = provider
            .embed(EmbeddingRequest::new(texts(&["a"])))
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::ProviderNotConfigured));
    }

    #[tokio::test]
    async fn test_empty_request_skips_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let response = provider_for(&server)
            .embed(EmbeddingRequest::new(Vec::new()))
            .await
            .unwrap();

        assert!(response.embeddings.is_empty());
        assert_eq!(response.model, DEFAULT_ENGINE);
    }
}
