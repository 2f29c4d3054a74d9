//! Character-bounded chunking with overlap.
//!
//! Words are packed greedily until the next word would push the chunk past
//! `chunk_size` characters. The following chunk starts with the trailing words
//! of the previous one, up to `chunk_overlap` characters.

use super::ContentChunk;
use crate::config::ChunkingSettings;
use crate::error::{AssistError, Result};
use crate::youtube::Transcript;

/// A word with the time span of the caption it came from.
#[derive(Debug, Clone)]
struct TimedWord {
    text: String,
    chars: usize,
    start: f64,
    end: f64,
}

/// Overlapping text splitter.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(AssistError::Config(format!(
                "Invalid chunking: size {} overlap {}",
                chunk_size, chunk_overlap
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Split a transcript into chunks.
    pub fn split(&self, transcript: &Transcript) -> Vec<ContentChunk> {
        let words = self.timed_words(transcript);
        self.pack(&words)
    }

    fn timed_words(&self, transcript: &Transcript) -> Vec<TimedWord> {
        let mut words = Vec::new();
        for snippet in &transcript.snippets {
            for word in snippet.text.split_whitespace() {
                let chars: Vec<char> = word.chars().collect();
                // Words longer than a chunk are cut into chunk-sized pieces.
                for piece in chars.chunks(self.chunk_size) {
                    words.push(TimedWord {
                        text: piece.iter().collect(),
                        chars: piece.len(),
                        start: snippet.start,
                        end: snippet.end(),
                    });
                }
            }
        }
        words
    }

    fn pack(&self, words: &[TimedWord]) -> Vec<ContentChunk> {
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < words.len() {
            let mut end = start;
            let mut len = 0;
            while end < words.len() {
                let add = if end == start {
                    words[end].chars
                } else {
                    words[end].chars + 1
                };
                if end > start && len + add > self.chunk_size {
                    break;
                }
                len += add;
                end += 1;
            }

            let slice = &words[start..end];
            let content = slice
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let start_seconds = slice.iter().map(|w| w.start).fold(f64::INFINITY, f64::min);
            let end_seconds = slice.iter().map(|w| w.end).fold(0.0, f64::max);
            chunks.push(ContentChunk::new(
                content,
                start_seconds,
                end_seconds,
                chunks.len() as i32,
            ));

            if end >= words.len() {
                break;
            }

            // Step back over trailing words that fit in the overlap budget.
            let mut next = end;
            let mut overlap = 0;
            while next > start + 1 {
                let add = words[next - 1].chars + 1;
                if overlap + add > self.chunk_overlap {
                    break;
                }
                overlap += add;
                next -= 1;
            }
            start = next;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::TranscriptSnippet;

    fn transcript_of(words: usize) -> Transcript {
        let snippets = (0..words)
            .map(|i| TranscriptSnippet::new(format!("word{:03}", i), i as f64, 1.0))
            .collect();
        Transcript::new("vid", "en", snippets)
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(100, 10).is_ok());
    }

    #[test]
    fn test_short_transcript_is_one_chunk() {
        let splitter = TextSplitter::new(1000, 100).unwrap();
        let chunks = splitter.split(&transcript_of(10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].order, 0);
        assert_eq!(chunks[0].start_seconds, 0.0);
        assert_eq!(chunks[0].end_seconds, 10.0);
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        // Each word is 7 chars; 8 chars with the joining space.
        let splitter = TextSplitter::new(40, 16).unwrap();
        let chunks = splitter.split(&transcript_of(20));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 40, "chunk too long: {}", chunk.content);
        }

        // Consecutive chunks share their boundary words.
        for pair in chunks.windows(2) {
            let last_word = pair[0].content.split(' ').last().unwrap();
            assert!(pair[1].content.starts_with(pair[0].content.split(' ').nth(3).unwrap()));
            assert!(pair[1].content.contains(last_word));
            assert!(pair[1].start_seconds <= pair[0].end_seconds);
        }

        // Every word appears somewhere.
        let all: String = chunks.iter().map(|c| c.content.clone()).collect::<Vec<_>>().join(" ");
        for i in 0..20 {
            assert!(all.contains(&format!("word{:03}", i)));
        }

        let orders: Vec<i32> = chunks.iter().map(|c| c.order).collect();
        assert_eq!(orders, (0..chunks.len() as i32).collect::<Vec<_>>());
    }

    #[test]
    fn test_long_word_is_hard_split() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        let transcript = Transcript::new(
            "vid",
            "en",
            vec![TranscriptSnippet::new("a".repeat(25), 0.0, 5.0)],
        );
        let chunks = splitter.split(&transcript);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 10));
    }

    #[test]
    fn test_empty_transcript() {
        let splitter = TextSplitter::new(100, 10).unwrap();
        let transcript = Transcript::new("vid", "en", vec![]);
        assert!(splitter.split(&transcript).is_empty());
    }
}
