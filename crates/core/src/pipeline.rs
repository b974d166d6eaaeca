use crate::chunking::{split_pages, ChunkingConfig};
use crate::collection::derive_collection_name;
use crate::embeddings::EmbeddingModel;
use crate::engine::ExtractionEngine;
use crate::error::PipelineError;
use crate::generation::ChatModel;
use crate::loader::{LopdfLoader, PdfLoader};
use crate::schema::PoBillData;
use crate::store::{DiskVectorStore, VectorIndex};
use tracing::info;

/// End-to-end pipeline for one uploaded document: load pages, chunk,
/// index into the file's collection, then run the extraction engine
/// against it. One upload, one synchronous run; independent documents get
/// independent collections, so separate runs never contend.
pub struct ExtractionPipeline<E, C> {
    loader: LopdfLoader,
    store: DiskVectorStore<E>,
    engine: ExtractionEngine<C>,
    chunking: ChunkingConfig,
}

impl<E, C> ExtractionPipeline<E, C>
where
    E: EmbeddingModel + Send + Sync,
    C: ChatModel + Send + Sync,
{
    pub fn new(store: DiskVectorStore<E>, engine: ExtractionEngine<C>) -> Self {
        Self {
            loader: LopdfLoader,
            store,
            engine,
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn with_chunking(mut self, config: ChunkingConfig) -> Self {
        self.chunking = config;
        self
    }

    pub async fn run(&self, pdf_bytes: &[u8], file_name: &str) -> Result<PoBillData, PipelineError> {
        let collection = derive_collection_name(file_name);
        info!(file = file_name, collection = %collection, "starting extraction run");

        let pages = self.loader.load_pages(pdf_bytes, file_name)?;
        let chunks = split_pages(&pages, self.chunking)?;
        info!(pages = pages.len(), chunks = chunks.len(), "indexing document");

        self.store.upsert_chunks(&collection, &chunks).await?;
        let record = self.engine.extract(&self.store, &collection).await?;

        info!(collection = %collection, "extraction succeeded");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::ExtractionPipeline;
    use crate::engine::ExtractionEngine;
    use crate::error::{ExtractionServiceError, PipelineError};
    use crate::generation::ChatModel;
    use crate::loader::tests::pdf_with_text;
    use crate::store::tests::FakeEmbedder;
    use crate::store::DiskVectorStore;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct CannedChat(&'static str);

    #[async_trait]
    impl ChatModel for CannedChat {
        async fn complete(&self, _prompt: &str) -> Result<String, ExtractionServiceError> {
            Ok(self.0.to_string())
        }
    }

    fn pipeline(
        root: &std::path::Path,
        reply: &'static str,
    ) -> ExtractionPipeline<FakeEmbedder, CannedChat> {
        ExtractionPipeline::new(
            DiskVectorStore::new(root, FakeEmbedder),
            ExtractionEngine::new(CannedChat(reply)),
        )
    }

    #[tokio::test]
    async fn runs_end_to_end_on_a_real_pdf() {
        let dir = tempdir().expect("tempdir");
        let bytes = pdf_with_text("PO Number: PO-9001, Total: 450.00");
        let pipeline = pipeline(dir.path(), r#"{"po_number":"PO-9001","line_items":[]}"#);

        let record = pipeline
            .run(&bytes, "Invoice #1.pdf")
            .await
            .expect("pipeline run");

        assert_eq!(record.po_number.as_deref(), Some("PO-9001"));
        assert!(record.line_items.is_empty());

        // collection derived from the filename, persisted under the root
        let collection_dir = dir.path().join("invoice-1");
        assert!(collection_dir.is_dir());
        assert!(std::fs::read_dir(&collection_dir).expect("read dir").count() >= 1);
    }

    #[tokio::test]
    async fn rerunning_the_same_file_does_not_grow_the_collection() {
        let dir = tempdir().expect("tempdir");
        let bytes = pdf_with_text("PO Number: PO-9001");
        let pipeline = pipeline(dir.path(), r#"{"line_items":[]}"#);

        pipeline.run(&bytes, "order.pdf").await.expect("first run");
        let first = std::fs::read_dir(dir.path().join("order")).expect("read dir").count();
        pipeline.run(&bytes, "order.pdf").await.expect("second run");
        let second = std::fs::read_dir(dir.path().join("order")).expect("read dir").count();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn corrupt_pdf_fails_with_load_error() {
        let dir = tempdir().expect("tempdir");
        let pipeline = pipeline(dir.path(), r#"{"line_items":[]}"#);

        let result = pipeline.run(b"%PDF-1.4\n%broken", "broken.pdf").await;
        assert!(matches!(result, Err(PipelineError::Load(_))));
    }

    #[tokio::test]
    async fn unparseable_model_reply_fails_the_run() {
        let dir = tempdir().expect("tempdir");
        let bytes = pdf_with_text("PO Number: PO-9001");
        let pipeline = pipeline(dir.path(), "no json here");

        let result = pipeline.run(&bytes, "order.pdf").await;
        assert!(matches!(result, Err(PipelineError::Extraction(_))));
    }
}
