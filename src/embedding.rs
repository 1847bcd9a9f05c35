//! Embedding capability: provider trait, OpenAI-compatible HTTP backend,
//! and the enabled/disabled switch.
//!
//! # Retry Strategy
//!
//! The HTTP provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Retry here is transport plumbing inside the capability; the pipeline
//! itself never retries a failed operation.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// An external capability that turns text into a unit-normalized vector
/// of fixed dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Vector dimensionality, fixed for the provider's lifetime.
    fn dims(&self) -> usize;
    /// Embed a single text. The returned vector is unit-normalized.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Whether an embedding backend is configured.
///
/// Call sites branch on the variant explicitly; there is no nullable
/// global. With `Disabled`, any embed attempt fails with
/// [`Error::EmbeddingUnavailable`] and retrieval is unavailable.
pub enum EmbeddingCapability {
    Enabled(Box<dyn EmbeddingProvider>),
    Disabled,
}

impl EmbeddingCapability {
    /// Build the capability from configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        match config.provider.as_str() {
            "disabled" => Ok(Self::Disabled),
            "openai" => Ok(Self::Enabled(Box::new(OpenAiEmbeddings::new(config)?))),
            other => Err(Error::Config(format!(
                "unknown embedding provider: '{other}'"
            ))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Dimension of the enabled provider, if any.
    pub fn dims(&self) -> Option<usize> {
        match self {
            Self::Enabled(p) => Some(p.dims()),
            Self::Disabled => None,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            Self::Enabled(p) => p.embed(text).await,
            Self::Disabled => Err(Error::EmbeddingUnavailable(
                "embedding capability is disabled".to_string(),
            )),
        }
    }
}

/// Scale a vector to unit length. Zero vectors are returned unchanged.
pub fn unit_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

/// Embedding provider for OpenAI-compatible `POST /embeddings` APIs.
///
/// Requires the `OPENAI_API_KEY` environment variable. Vectors returned
/// by the API are normalized to unit length before being handed to the
/// caller, so the index's inner product equals cosine similarity.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

impl OpenAiEmbeddings {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::Config("embedding.model required for openai provider".into()))?;
        let dims = config
            .dims
            .ok_or_else(|| Error::Config("embedding.dims required for openai provider".into()))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Config("OPENAI_API_KEY environment variable not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            dims,
            max_retries: config.max_retries,
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(format!("{}/embeddings", self.api_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;
                        return parse_embedding_response(&json, self.dims);
                    }

                    // Rate limited or server error: retry.
                    if status.as_u16() == 429 || status.is_server_error() {
                        let text = response.text().await.unwrap_or_default();
                        last_err = Some(Error::EmbeddingUnavailable(format!(
                            "embedding API error {status}: {text}"
                        )));
                        continue;
                    }

                    // Other client errors are not retryable.
                    let text = response.text().await.unwrap_or_default();
                    return Err(Error::EmbeddingUnavailable(format!(
                        "embedding API error {status}: {text}"
                    )));
                }
                Err(e) => {
                    last_err = Some(Error::EmbeddingUnavailable(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::EmbeddingUnavailable("embedding failed after retries".to_string())
        }))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(text).await
    }
}

/// Extract `data[0].embedding` from an embeddings API response and
/// normalize it to unit length.
fn parse_embedding_response(json: &serde_json::Value, dims: usize) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| {
            Error::EmbeddingUnavailable("invalid embedding response: missing embedding".into())
        })?;

    let vector: Vec<f32> = embedding
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect();

    if vector.len() != dims {
        return Err(Error::EmbeddingUnavailable(format!(
            "provider returned {} dims, expected {dims}",
            vector.len()
        )));
    }

    Ok(unit_normalize(vector))
}
