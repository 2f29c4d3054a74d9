//! In-memory vector store implementation.
//!
//! Brute-force cosine similarity over every stored chunk. Transcripts are a
//! few hundred chunks per video, so a linear scan is enough.

use super::{cosine_similarity, Document, SearchResult, VectorStore};
use crate::error::{AssistError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, Document>>> {
        self.documents
            .read()
            .map_err(|_| AssistError::VectorStore("index lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, Document>>> {
        self.documents
            .write()
            .map_err(|_| AssistError::VectorStore("index lock poisoned".to_string()))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            store.insert(doc.id, doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(
        &self,
        video_id: Option<&str>,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.read()?;

        let mut results: Vec<SearchResult> = docs
            .values()
            .filter(|doc| video_id.map_or(true, |id| doc.video_id == id))
            .map(|doc| SearchResult {
                document: doc.clone(),
                score: cosine_similarity(query_embedding, &doc.embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.document.chunk_order.cmp(&b.document.chunk_order))
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn delete_by_video_id(&self, video_id: &str) -> Result<usize> {
        let mut docs = self.write()?;
        let initial_len = docs.len();
        docs.retain(|_, doc| doc.video_id != video_id);
        Ok(initial_len - docs.len())
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    async fn clear(&self) -> Result<usize> {
        let mut docs = self.write()?;
        let count = docs.len();
        docs.clear();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(video: &str, content: &str, embedding: Vec<f32>, order: i32) -> Document {
        Document::new(
            video.to_string(),
            "Test Video".to_string(),
            content.to_string(),
            order as f64 * 30.0,
            (order + 1) as f64 * 30.0,
            embedding,
            order,
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_batch(&[
                doc("video1", "Hello world", vec![1.0, 0.0, 0.0], 0),
                doc("video1", "Goodbye world", vec![0.0, 1.0, 0.0], 1),
                doc("video2", "Other video", vec![1.0, 0.1, 0.0], 0),
            ])
            .await
            .unwrap();

        assert_eq!(store.document_count().await.unwrap(), 3);

        let results = store.search(Some("video1"), &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "Hello world");
        assert!(results[0].score > results[1].score);

        let everywhere = store.search(None, &[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(everywhere.len(), 2);
        assert!(everywhere.iter().all(|r| r.document.content != "Goodbye world"));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                doc("a", "one", vec![1.0], 0),
                doc("a", "two", vec![1.0], 1),
                doc("b", "three", vec![1.0], 0),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_by_video_id("a").await.unwrap(), 2);
        assert_eq!(store.delete_by_video_id("a").await.unwrap(), 0);
        assert!(store.search(Some("a"), &[1.0], 10).await.unwrap().is_empty());
        assert_eq!(store.search(Some("b"), &[1.0], 10).await.unwrap().len(), 1);

        assert_eq!(store.clear().await.unwrap(), 1);
        assert_eq!(store.document_count().await.unwrap(), 0);
    }
}
