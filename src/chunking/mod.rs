//! Transcript chunking for embedding and retrieval.
//!
//! Transcripts are split into overlapping, character-bounded chunks. Each chunk
//! remembers the time span of the captions it was built from.

mod splitter;

pub use splitter::TextSplitter;

use serde::{Deserialize, Serialize};

/// A chunk of content from a video transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Order of this chunk in the video.
    pub order: i32,
}

impl ContentChunk {
    /// Create a new content chunk.
    pub fn new(content: String, start_seconds: f64, end_seconds: f64, order: i32) -> Self {
        Self {
            content,
            start_seconds,
            end_seconds,
            order,
        }
    }

    /// Duration of this chunk in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Format timestamp for display.
    pub fn format_timestamp(&self) -> String {
        format_timestamp(self.start_seconds)
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Join chunk contents, e.g. to build a prompt from the leading part of a video.
pub fn join_chunks(chunks: &[ContentChunk], limit: Option<usize>) -> String {
    let take = limit.unwrap_or(chunks.len());
    chunks
        .iter()
        .take(take)
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(125.0), "02:05");
        assert_eq!(format_timestamp(3725.0), "01:02:05");
    }

    #[test]
    fn test_join_chunks_limit() {
        let chunks = vec![
            ContentChunk::new("a".to_string(), 0.0, 1.0, 0),
            ContentChunk::new("b".to_string(), 1.0, 2.0, 1),
            ContentChunk::new("c".to_string(), 2.0, 3.0, 2),
        ];
        assert_eq!(join_chunks(&chunks, Some(2)), "a b");
        assert_eq!(join_chunks(&chunks, None), "a b c");
        assert_eq!(join_chunks(&chunks, Some(10)), "a b c");
    }
}
