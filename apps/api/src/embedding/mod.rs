//! Embedding Provider — maps text batches to fixed-dimension vectors.
//!
//! The provider is a trait object so the engine and tests can swap backends;
//! the production implementation talks to an OpenAI-compatible
//! `/v1/embeddings` endpoint over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::errors::AppError;

const EMBEDDINGS_PATH: &str = "/v1/embeddings";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Batched text → vector interface. Implementations must return one vector
/// per input text, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError>;

    /// Output dimension, used to validate against the loaded index.
    fn dimensions(&self) -> usize;
}

/// HTTP embedding client for OpenAI-compatible embedding APIs.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build HTTP client: {e}")))?;

        Ok(HttpEmbedder {
            client,
            api_base: config.embedding_api_base.trim_end_matches('/').to_string(),
            api_key: config.embedding_api_key.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "dimensions": self.dimensions,
        });

        let response = self
            .client
            .post(format!("{}{EMBEDDINGS_PATH}", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "Provider returned {status}: {body}"
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Invalid response body: {e}")))?;

        let vectors = parse_embedding_response(&json, texts.len())?;
        debug!("Embedded {} texts (dim {})", vectors.len(), self.dimensions);
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Extracts vectors from the `data` array, re-sorted by the provider's
/// `index` field so output order always matches input order.
fn parse_embedding_response(json: &Value, expected: usize) -> Result<Vec<Vec<f32>>, AppError> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| AppError::Embedding("Response is missing the data array".to_string()))?;

    if data.len() != expected {
        return Err(AppError::Embedding(format!(
            "Expected {expected} embeddings, got {}",
            data.len()
        )));
    }

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                AppError::Embedding("Embedding item is missing the embedding array".to_string())
            })?;

        let mut vec = Vec::with_capacity(embedding.len());
        for value in embedding {
            let number = value.as_f64().ok_or_else(|| {
                AppError::Embedding("Embedding values must be numeric".to_string())
            })?;
            vec.push(number as f32);
        }
        indexed.push((index, vec));
    }

    indexed.sort_by_key(|(index, _)| *index);

    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embeddings_in_index_order() {
        let json = serde_json::json!({
            "data": [
                { "index": 1, "embedding": [2.0, 3.0] },
                { "index": 0, "embedding": [0.5, 1.5] }
            ]
        });
        let parsed = parse_embedding_response(&json, 2).unwrap();
        assert_eq!(parsed[0], vec![0.5, 1.5]);
        assert_eq!(parsed[1], vec![2.0, 3.0]);
    }

    #[test]
    fn test_parse_rejects_missing_data_array() {
        let json = serde_json::json!({ "error": "nope" });
        assert!(parse_embedding_response(&json, 1).is_err());
    }

    #[test]
    fn test_parse_rejects_count_mismatch() {
        let json = serde_json::json!({
            "data": [ { "index": 0, "embedding": [1.0] } ]
        });
        assert!(parse_embedding_response(&json, 2).is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric_values() {
        let json = serde_json::json!({
            "data": [ { "index": 0, "embedding": ["x"] } ]
        });
        assert!(parse_embedding_response(&json, 1).is_err());
    }
}
