pub mod chunking;
pub mod collection;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod generation;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod store;

pub use chunking::{
    chunk_id_for, split_pages, Chunk, ChunkingConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};
pub use collection::derive_collection_name;
pub use config::ServiceConfig;
pub use embeddings::{EmbeddingModel, OpenAiEmbeddings};
pub use engine::{ExtractionEngine, RETRIEVAL_QUERY};
pub use error::{
    ChunkError, EmbeddingServiceError, ExtractError, ExtractionServiceError, LoadError,
    PipelineError, SchemaValidationError, StoreError,
};
pub use generation::{ChatModel, OpenAiChat};
pub use loader::{LopdfLoader, PageRecord, PdfLoader};
pub use pipeline::ExtractionPipeline;
pub use schema::{format_instructions, parse_model_response, LineItem, PartyInfo, PoBillData};
pub use store::{
    DiskVectorStore, IndexedVector, RetrievedChunk, VectorIndex, DEFAULT_DB_ROOT, DEFAULT_TOP_K,
};
