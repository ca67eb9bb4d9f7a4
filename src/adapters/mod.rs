//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the two network backends
//! the fact checker depends on: an embedding service and a language
//! model. Production implementations speak HTTP; tests substitute
//! deterministic stubs through the same traits.

pub mod anthropic;
pub mod credential;
pub mod embedding;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use anthropic::{AnthropicClient, ANTHROPIC_API_KEY_ENV};
pub use credential::ApiCredential;
pub use embedding::{l2_normalize, HttpEmbedder};
pub use retry::RetryPolicy;

/// Errors raised by backend adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl AdapterError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Map a reqwest error, folding timeouts into [`AdapterError::Timeout`]
    pub(crate) fn from_request(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Http(e)
        }
    }
}

/// Maps text to fixed-dimension dense vectors.
///
/// Query and document vectors share one normalized space, so the two
/// entry points must apply identical preprocessing.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Dimension of every vector this embedder returns
    fn dimension(&self) -> usize;

    /// Embed a batch of documents, one vector per input, in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AdapterError>;

    /// Embed a single query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AdapterError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AdapterError::InvalidResponse("empty embedding response".to_string()))
    }
}

/// Text generation capability used for extraction, reranking and verdicts
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`, optionally under a system prompt
    async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AdapterError>;
}
