use clap::Parser;
use po_extract_core::{
    ChunkingConfig, DiskVectorStore, ExtractionEngine, ExtractionPipeline, OpenAiChat,
    OpenAiEmbeddings, ServiceConfig, DEFAULT_DB_ROOT,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "po-extract", version, about = "Extract structured JSON from a PO/bill PDF")]
struct Cli {
    /// PDF file to extract
    #[arg(long)]
    file: PathBuf,

    /// Also write the extracted JSON to this path
    #[arg(long)]
    out: Option<PathBuf>,

    /// API key for the OpenAI-compatible endpoint
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "OPENROUTER_BASE_URL", default_value = "https://openrouter.ai/api/v1")]
    base_url: String,

    /// Embedding model name
    #[arg(long, default_value = "text-embedding-3-small")]
    embedding_model: String,

    /// Chat model name
    #[arg(long, default_value = "openai/gpt-oss-20b")]
    chat_model: String,

    /// Value for the HTTP-Referer header some gateways require
    #[arg(long, env = "OPENROUTER_REFERER")]
    referer: Option<String>,

    /// Root directory of the on-disk vector store
    #[arg(long, default_value = DEFAULT_DB_ROOT)]
    db_root: PathBuf,

    /// Maximum characters per chunk
    #[arg(long, default_value = "1000")]
    chunk_size: usize,

    /// Characters of overlap between consecutive chunks
    #[arg(long, default_value = "100")]
    chunk_overlap: usize,

    /// Number of chunks retrieved as extraction context
    #[arg(long, default_value = "4")]
    top_k: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut embedding_config =
        ServiceConfig::new(&cli.api_key, &cli.base_url, &cli.embedding_model);
    let mut chat_config = ServiceConfig::new(&cli.api_key, &cli.base_url, &cli.chat_model);
    if let Some(referer) = &cli.referer {
        embedding_config = embedding_config.with_header("HTTP-Referer", referer);
        chat_config = chat_config.with_header("HTTP-Referer", referer);
    }

    let embedder = OpenAiEmbeddings::new(&embedding_config)?;
    let chat = OpenAiChat::new(&chat_config)?;

    let pipeline = ExtractionPipeline::new(
        DiskVectorStore::new(&cli.db_root, embedder),
        ExtractionEngine::new(chat).with_top_k(cli.top_k),
    )
    .with_chunking(ChunkingConfig {
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
    });

    let file_name = cli
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("path has no file name: {}", cli.file.display()))?
        .to_string();
    let bytes = tokio::fs::read(&cli.file).await?;
    info!(file = %cli.file.display(), size = bytes.len(), "read input pdf");

    let record = pipeline.run(&bytes, &file_name).await?;
    let json = serde_json::to_string_pretty(&record)?;
    println!("{json}");

    if let Some(out) = &cli.out {
        tokio::fs::write(out, json.as_bytes()).await?;
        info!(path = %out.display(), "wrote extracted json");
    }

    Ok(())
}
