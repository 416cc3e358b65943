//! Embedding provider implementations and worker offload.
//!
//! - **[`OllamaEmbedder`]** calls `POST {url}/api/embeddings` once per text,
//!   with a bounded timeout and optional retry. A text that cannot be
//!   embedded gets a zero vector of the configured dimensionality, so a
//!   batch never fails as a whole.
//! - [`embed_offloaded`] and [`embed_query_offloaded`] run any
//!   [`Embedder`] on tokio's blocking pool and await the result.
//!
//! # Retry Strategy
//!
//! With `embedding.max_retries > 0`, each text is retried with exponential
//! backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! A text whose retries are exhausted degrades to the zero vector.

use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use coderag_core::embedding::{conform, zero_vector, Embedder};

use crate::config::EmbeddingConfig;

/// Embedder backed by an Ollama server.
pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    dims: usize,
    timeout: Duration,
    max_retries: u32,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            endpoint: format!("{}/api/embeddings", config.url.trim_end_matches('/')),
            model: config.model.clone(),
            dims: config.dims,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request one embedding, retrying transient failures.
    fn request_embedding(
        &self,
        client: &reqwest::blocking::Client,
        text: &str,
    ) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": text,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1u64 << (attempt - 1).min(5));
                std::thread::sleep(delay);
            }

            match client.post(&self.endpoint).json(&body).send() {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .context("Invalid Ollama response: body is not JSON")?;
                        return parse_ollama_response(&json, self.dims);
                    }

                    let body_text = response.text().unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow!("Ollama API error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("Ollama API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Embedding failed after retries")))
    }
}

impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn embed(&self, texts: &[String]) -> Vec<Vec<f32>> {
        // Built per batch so the blocking client lives and dies on the worker.
        let client = match reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "failed to build embedding client; using zero vectors");
                return texts.iter().map(|_| zero_vector(self.dims)).collect();
            }
        };

        texts
            .iter()
            .enumerate()
            .map(|(i, text)| match self.request_embedding(&client, text) {
                Ok(vector) => vector,
                Err(err) => {
                    warn!(
                        model = %self.model,
                        item = i,
                        error = %err,
                        "embedding failed; substituting zero vector"
                    );
                    zero_vector(self.dims)
                }
            })
            .collect()
    }
}

/// Parse an Ollama `/api/embeddings` response body.
///
/// The `embedding` field must be an array of exactly `dims` finite numbers.
fn parse_ollama_response(json: &serde_json::Value, dims: usize) -> Result<Vec<f32>> {
    let embedding = json
        .get("embedding")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing embedding"))?;

    let vector = embedding
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| anyhow!("Invalid Ollama response: non-numeric embedding value"))?;

    let len = vector.len();
    conform(vector, dims).ok_or_else(|| {
        anyhow!(
            "Invalid Ollama response: expected {} finite values, got {}",
            dims,
            len
        )
    })
}

/// Create the configured [`Embedder`].
///
/// # Supported Providers
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"ollama"` | [`OllamaEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(config))),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

/// Run `embedder.embed(texts)` on the blocking pool and await the result.
///
/// A panic inside the embedder surfaces as an error.
pub async fn embed_offloaded(
    embedder: Arc<dyn Embedder>,
    texts: Vec<String>,
) -> Result<Vec<Vec<f32>>> {
    tokio::task::spawn_blocking(move || embedder.embed(&texts))
        .await
        .context("Embedding worker failed")
}

/// Embed a single text on the blocking pool.
pub async fn embed_query_offloaded(embedder: Arc<dyn Embedder>, text: &str) -> Result<Vec<f32>> {
    embed_offloaded(embedder, vec![text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Empty embedding response"))
}
