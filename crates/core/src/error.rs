use thiserror::Error;

/// Failure to turn uploaded PDF bytes into page text.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("invalid chunking config: {0}")]
    InvalidConfig(String),
}

/// Failure of the external embedding service.
#[derive(Debug, Error)]
pub enum EmbeddingServiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding request rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid embedding response: {0}")]
    BadResponse(String),

    #[error("invalid embedding client config: {0}")]
    InvalidConfig(String),
}

/// Failure of the vector index, distinct from embedding faults.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding service error: {0}")]
    Embedding(#[from] EmbeddingServiceError),
}

/// Failure of the remote generation service (transport, timeout, non-2xx).
#[derive(Debug, Error)]
pub enum ExtractionServiceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation request rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid generation response: {0}")]
    BadResponse(String),

    #[error("invalid generation client config: {0}")]
    InvalidConfig(String),
}

/// The model's reply did not conform to the output schema. Carries the raw
/// response so callers can diagnose what the model actually said.
#[derive(Debug, Error)]
#[error("model response failed schema validation: {reason}")]
pub struct SchemaValidationError {
    pub reason: String,
    pub raw_response: String,
}

impl SchemaValidationError {
    pub fn new(reason: impl Into<String>, raw_response: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw_response: raw_response.into(),
        }
    }
}

/// Any failure inside one extraction request.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ExtractionServiceError),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

/// Umbrella error for a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Chunking(#[from] ChunkError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
