//! HTTP embedding adapter.
//!
//! Talks to any server exposing the OpenAI-compatible embeddings API
//! (`POST {base_url}/embeddings`), such as text-embeddings-inference,
//! Ollama or vLLM serving a BGE model.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AdapterError, ApiCredential, Embedder, RetryPolicy};
use crate::config::EmbeddingSettings;

/// Scale `vector` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Embedding client for OpenAI-compatible endpoints
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
    normalize: bool,
    timeout: Duration,
    retry: RetryPolicy,
    credential: Option<ApiCredential>,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("credential", &self.credential)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    /// Create a client from embedding settings
    pub fn new(settings: &EmbeddingSettings, retry: RetryPolicy) -> Result<Self, AdapterError> {
        let timeout = settings.timeout();
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            dimension: settings.dimension,
            normalize: settings.normalize,
            timeout,
            retry,
            credential: None,
        })
    }

    /// Send a bearer token with every request
    pub fn with_credential(mut self, credential: ApiCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AdapterError> {
        let url = format!("{}/embeddings", self.base_url);
        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(ref credential) = self.credential {
            request = request.bearer_auth(credential.expose());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::from_request(e, self.timeout))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AdapterError::RateLimited {
                retry_after: retry_after(&response),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(format!("embeddings body: {}", e)))?;

        if body.data.len() != texts.len() {
            return Err(AdapterError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        body.data
            .into_iter()
            .map(|d| self.finish(d.embedding))
            .collect()
    }

    fn finish(&self, mut vector: Vec<f32>) -> Result<Vec<f32>, AdapterError> {
        if vector.len() != self.dimension {
            return Err(AdapterError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if self.normalize {
            l2_normalize(&mut vector);
        }
        Ok(vector)
    }
}

/// Parse a `retry-after` header given in seconds
pub(crate) fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AdapterError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = texts.len(), model = %self.model, "Embedding texts");
        self.retry.run("embedding", || self.request(texts)).await
    }
}
