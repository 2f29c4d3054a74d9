//! RAG (Retrieval-Augmented Generation) for chatting with a video.
//!
//! Questions are embedded, matched against the chunks of one video, and the
//! best chunks are handed to the language model as context.

pub mod context;
mod response;

pub use context::ContextBuilder;
pub use response::{RagEngine, RagResponse};

use crate::vector_store::SearchResult;
use serde::{Deserialize, Serialize};

/// A transcript excerpt returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Leading characters of the chunk.
    pub snippet: String,
    /// Formatted timestamp (e.g., "02:34").
    pub timestamp: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Cosine similarity to the question.
    pub score: f32,
    /// Watch URL starting at this chunk.
    pub url: String,
}

impl Source {
    pub fn from_result(result: &SearchResult, snippet_chars: usize) -> Self {
        let doc = &result.document;
        Self {
            snippet: snippet(&doc.content, snippet_chars),
            timestamp: doc.format_timestamp(),
            start_seconds: doc.start_seconds,
            score: result.score,
            url: format!(
                "https://youtube.com/watch?v={}&t={}s",
                doc.video_id, doc.start_seconds as u32
            ),
        }
    }
}

/// First `max_chars` characters of `content`, with `...` appended when cut.
pub fn snippet(content: &str, max_chars: usize) -> String {
    if content.chars().count() > max_chars {
        let head: String = content.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}
