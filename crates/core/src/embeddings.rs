use crate::config::ServiceConfig;
use crate::error::EmbeddingServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Opaque text-to-vector boundary. Implementations must either return one
/// non-empty vector per input or fail; a silent zero vector is never a
/// valid outcome.
#[async_trait]
pub trait EmbeddingModel {
    async fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError>;

    async fn embed(&self, input: &str) -> Result<Vec<f32>, EmbeddingServiceError> {
        let mut vectors = self.embed_batch(&[input]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingServiceError::BadResponse("service returned no embedding".to_string()))
    }
}

/// Embeddings client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(config: &ServiceConfig) -> Result<Self, EmbeddingServiceError> {
        let headers = config
            .header_map()
            .map_err(EmbeddingServiceError::InvalidConfig)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint("embeddings"),
            model: config.model_name.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbeddings {
    async fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingServiceError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != inputs.len() {
            return Err(EmbeddingServiceError::BadResponse(format!(
                "service returned {} embeddings for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }
        if parsed.data.iter().any(|entry| entry.embedding.is_empty()) {
            return Err(EmbeddingServiceError::BadResponse(
                "service returned an empty embedding vector".to_string(),
            ));
        }

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
