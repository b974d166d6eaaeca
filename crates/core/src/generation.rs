use crate::config::ServiceConfig;
use crate::error::ExtractionServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Opaque text-generation boundary: one prompt in, the model's raw text
/// reply out. The service is treated as stateless; nothing here retries.
#[async_trait]
pub trait ChatModel {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionServiceError>;
}

/// Chat client for OpenAI-compatible `/chat/completions` endpoints. Extra
/// headers from the config (e.g. `HTTP-Referer` for OpenRouter) ride on
/// every request.
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(config: &ServiceConfig) -> Result<Self, ExtractionServiceError> {
        let headers = config
            .header_map()
            .map_err(ExtractionServiceError::InvalidConfig)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint("chat/completions"),
            model: config.model_name.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractionServiceError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ExtractionServiceError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                ExtractionServiceError::BadResponse("response contained no choices".to_string())
            })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}
