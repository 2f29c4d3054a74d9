//! Context building for RAG responses.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorStore};
use std::sync::Arc;
use tracing::debug;

/// Retrieves the chunks of a video most similar to a question.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    search_k: usize,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            search_k: 12,
        }
    }

    /// Set how many chunks are retrieved per question.
    pub fn with_search_k(mut self, search_k: usize) -> Self {
        self.search_k = search_k.max(1);
        self
    }

    /// Retrieve chunks of `video_id` for a query, most similar first.
    pub async fn retrieve(&self, video_id: &str, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self
            .vector_store
            .search(Some(video_id), &query_embedding, self.search_k)
            .await?;

        debug!("Retrieved {} chunks for {}", results.len(), video_id);
        Ok(results)
    }
}

/// Format retrieved chunks for a prompt.
pub fn format_context_for_prompt(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.document.content.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::{Document, MemoryVectorStore};
    use async_trait::async_trait;

    /// Embeds text as counts of the letters a, b and c.
    struct LetterEmbedder;

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(['a', 'b', 'c']
                .iter()
                .map(|l| text.chars().filter(|c| c == l).count() as f32)
                .collect())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> Option<usize> {
            Some(3)
        }
    }

    #[tokio::test]
    async fn test_retrieve_stays_inside_video() {
        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(LetterEmbedder);

        let mut docs = Vec::new();
        for (video, content, order) in [("v1", "aaa", 0), ("v1", "bbb", 1), ("v2", "aaaa", 0)] {
            let embedding = embedder.embed(content).await.unwrap();
            docs.push(Document::new(
                video.to_string(),
                "T".to_string(),
                content.to_string(),
                0.0,
                1.0,
                embedding,
                order,
            ));
        }
        store.upsert_batch(&docs).await.unwrap();

        let builder = ContextBuilder::new(store, embedder).with_search_k(5);
        let results = builder.retrieve("v1", "a").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "aaa");
        assert!(results.iter().all(|r| r.document.video_id == "v1"));

        assert_eq!(format_context_for_prompt(&results), "aaa\n\nbbb");
    }
}
