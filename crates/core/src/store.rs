use crate::chunking::Chunk;
use crate::embeddings::EmbeddingModel;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_DB_ROOT: &str = "db";

/// One stored embedding with the text it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedVector {
    pub chunk_id: String,
    pub collection: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub source_id: String,
    pub indexed_at: DateTime<Utc>,
}

/// A chunk returned from a similarity query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub content: String,
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex {
    /// Embeds and stores the chunks in the named collection, keyed by
    /// `chunk_id`. Upsert semantics: repeating the call with the same
    /// chunks never grows the collection. Returns the number written.
    async fn upsert_chunks(&self, collection: &str, chunks: &[Chunk]) -> Result<usize, StoreError>;

    /// Embeds `query_text` and returns the `top_k` nearest chunks by
    /// cosine similarity, best first. Stable for identical inputs against
    /// an identical index state.
    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError>;
}

/// Embedded on-disk vector store: one directory per collection under a
/// fixed root, one JSON record per chunk id. Overwriting the record file
/// is the upsert, which also makes interleaved writers to the same
/// collection converge.
pub struct DiskVectorStore<E> {
    root: PathBuf,
    embedder: E,
}

impl<E> DiskVectorStore<E> {
    pub fn new(root: impl Into<PathBuf>, embedder: E) -> Self {
        Self {
            root: root.into(),
            embedder,
        }
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }
}

#[async_trait]
impl<E> VectorIndex for DiskVectorStore<E>
where
    E: EmbeddingModel + Send + Sync,
{
    async fn upsert_chunks(&self, collection: &str, chunks: &[Chunk]) -> Result<usize, StoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let dir = self.collection_dir(collection);
        tokio::fs::create_dir_all(&dir).await?;

        let inputs: Vec<&str> = chunks.iter().map(|chunk| chunk.content.as_str()).collect();
        let vectors = self.embedder.embed_batch(&inputs).await.map_err(StoreError::from)?;

        for (chunk, vector) in chunks.iter().zip(vectors) {
            let record = IndexedVector {
                chunk_id: chunk.chunk_id.clone(),
                collection: collection.to_string(),
                vector,
                content: chunk.content.clone(),
                source_id: chunk.source_id.clone(),
                indexed_at: Utc::now(),
            };
            let path = dir.join(format!("{}.json", chunk.chunk_id));
            let payload = serde_json::to_vec(&record)?;
            tokio::fs::write(&path, payload).await?;
        }

        debug!(collection, written = chunks.len(), "upserted chunks");
        Ok(chunks.len())
    }

    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError> {
        let dir = self.collection_dir(collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(StoreError::Io(error)),
        };

        let query_vector = self.embedder.embed(query_text).await.map_err(StoreError::from)?;

        let mut hits = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let payload = tokio::fs::read(&path).await?;
            let record: IndexedVector = serde_json::from_slice(&payload)?;
            hits.push(RetrievedChunk {
                score: cosine_similarity(&query_vector, &record.vector),
                chunk_id: record.chunk_id,
                content: record.content,
            });
        }

        hits.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then_with(|| left.chunk_id.cmp(&right.chunk_id))
        });
        hits.truncate(top_k);

        debug!(collection, returned = hits.len(), "similarity query");
        Ok(hits)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{cosine_similarity, DiskVectorStore, VectorIndex, DEFAULT_TOP_K};
    use crate::chunking::{chunk_id_for, Chunk};
    use crate::embeddings::EmbeddingModel;
    use crate::error::EmbeddingServiceError;
    use async_trait::async_trait;
    use tempfile::tempdir;

    const DIMENSIONS: usize = 16;

    /// Deterministic stand-in for the embedding service: hashes character
    /// trigrams into a fixed number of buckets.
    pub(crate) struct FakeEmbedder;

    pub(crate) fn fake_vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; DIMENSIONS];
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        for window in chars.windows(3) {
            let token: String = window.iter().collect();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
        }
        vector
    }

    #[async_trait]
    impl EmbeddingModel for FakeEmbedder {
        async fn embed_batch(
            &self,
            inputs: &[&str],
        ) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
            Ok(inputs.iter().map(|text| fake_vector(text)).collect())
        }
    }

    pub(crate) fn chunk(content: &str) -> Chunk {
        Chunk {
            chunk_id: chunk_id_for(content),
            content: content.to_string(),
            source_id: "doc.pdf".to_string(),
        }
    }

    fn stored_count(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| entries.filter_map(|e| e.ok()).count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn upsert_is_idempotent_across_repeated_writes() {
        let dir = tempdir().expect("tempdir");
        let store = DiskVectorStore::new(dir.path(), FakeEmbedder);
        let chunks = vec![chunk("vendor: ABC Suppliers"), chunk("total: 1770.00")];

        store.upsert_chunks("invoice-1", &chunks).await.expect("first write");
        store.upsert_chunks("invoice-1", &chunks).await.expect("second write");

        assert_eq!(stored_count(&dir.path().join("invoice-1")), 2);
    }

    #[tokio::test]
    async fn duplicate_content_stores_one_record() {
        let dir = tempdir().expect("tempdir");
        let store = DiskVectorStore::new(dir.path(), FakeEmbedder);
        let chunks = vec![chunk("repeated text"), chunk("repeated text")];

        store.upsert_chunks("invoice-1", &chunks).await.expect("write");

        assert_eq!(stored_count(&dir.path().join("invoice-1")), 1);
    }

    #[tokio::test]
    async fn query_returns_nearest_chunk_first() {
        let dir = tempdir().expect("tempdir");
        let store = DiskVectorStore::new(dir.path(), FakeEmbedder);
        let chunks = vec![
            chunk("purchase order number and vendor address"),
            chunk("unrelated shipping manifest gibberish"),
        ];
        store.upsert_chunks("invoice-1", &chunks).await.expect("write");

        let hits = store
            .query("invoice-1", "purchase order number and vendor address", DEFAULT_TOP_K)
            .await
            .expect("query");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "purchase order number and vendor address");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn query_respects_top_k() {
        let dir = tempdir().expect("tempdir");
        let store = DiskVectorStore::new(dir.path(), FakeEmbedder);
        let chunks: Vec<_> = (0..6)
            .map(|i| chunk(&format!("line item number {i} with details")))
            .collect();
        store.upsert_chunks("invoice-1", &chunks).await.expect("write");

        let hits = store.query("invoice-1", "line item", 3).await.expect("query");
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn querying_a_missing_collection_returns_nothing() {
        let dir = tempdir().expect("tempdir");
        let store = DiskVectorStore::new(dir.path(), FakeEmbedder);

        let hits = store.query("nope", "anything", DEFAULT_TOP_K).await.expect("query");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let dir = tempdir().expect("tempdir");
        let store = DiskVectorStore::new(dir.path(), FakeEmbedder);
        store
            .upsert_chunks("invoice-1", &[chunk("first document text")])
            .await
            .expect("write");
        store
            .upsert_chunks("invoice-2", &[chunk("second document text")])
            .await
            .expect("write");

        let hits = store.query("invoice-2", "text", DEFAULT_TOP_K).await.expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "second document text");
    }

    #[test]
    fn cosine_similarity_handles_degenerate_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}
