//! YouTube video access.
//!
//! URL parsing, transcript retrieval and lightweight metadata lookup.

mod source;

pub use source::YoutubeSource;

use crate::error::{AssistError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use url::Url;

/// Metadata about a YouTube video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    /// Channel name.
    pub author_name: String,
    pub author_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Canonical watch URL.
    pub video_url: String,
    /// True when oEmbed was unavailable and placeholder values are used.
    pub fallback: bool,
}

impl VideoMetadata {
    /// Placeholder metadata used when the lookup fails.
    pub fn fallback(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: format!("YouTube Video: {}", video_id),
            author_name: "Unknown Channel".to_string(),
            author_url: None,
            thumbnail_url: Some(format!(
                "https://img.youtube.com/vi/{}/maxresdefault.jpg",
                video_id
            )),
            video_url: watch_url(video_id),
            fallback: true,
        }
    }

    /// Create a URL with timestamp for a specific point in the video.
    pub fn url_with_timestamp(&self, seconds: f64) -> String {
        format!("https://youtube.com/watch?v={}&t={}s", self.video_id, seconds as u32)
    }
}

/// A timed piece of caption text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSnippet {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl TranscriptSnippet {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A fetched video transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    /// Language code of the captions.
    pub language: String,
    pub snippets: Vec<TranscriptSnippet>,
}

impl Transcript {
    pub fn new(video_id: impl Into<String>, language: impl Into<String>, snippets: Vec<TranscriptSnippet>) -> Self {
        Self {
            video_id: video_id.into(),
            language: language.into(),
            snippets,
        }
    }

    /// Whole transcript as a single space-joined string.
    pub fn text(&self) -> String {
        self.snippets
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.iter().all(|s| s.text.trim().is_empty())
    }
}

/// Trait for video providers.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Fetch title/channel metadata. Never fails: falls back to placeholders.
    async fn fetch_metadata(&self, video_id: &str) -> VideoMetadata;

    /// Fetch the transcript for a video.
    async fn fetch_transcript(&self, video_id: &str) -> Result<Transcript>;
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static regex"))
}

fn valid_id(candidate: &str) -> Option<String> {
    video_id_regex()
        .is_match(candidate)
        .then(|| candidate.to_string())
}

/// Extract the video ID from a YouTube URL or a bare 11-character ID.
pub fn parse_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    let invalid = || AssistError::InvalidInput(format!("Invalid YouTube URL format: {}", input));

    if input.is_empty() {
        return Err(invalid());
    }
    if let Some(id) = valid_id(input) {
        return Ok(id);
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;

    let host = url.host_str().ok_or_else(invalid)?;
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .or_else(|| host.strip_prefix("music."))
        .unwrap_or(host);

    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("embed") | Some("shorts") | Some("v") | Some("live") => {
                segments.next().map(str::to_string)
            }
            _ => None,
        },
        _ => None,
    };

    candidate.as_deref().and_then(valid_id).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_id_formats() {
        let expected = "dQw4w9WgXcQ";
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ&t=30s",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "  dQw4w9WgXcQ  ",
        ] {
            assert_eq!(parse_video_id(input).unwrap(), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_parse_video_id_rejects_other_input() {
        for input in [
            "",
            "not-a-video-id",
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/playlist?list=PLtest",
            "https://www.youtube.com/watch?v=short",
            "https://youtu.be/",
        ] {
            let err = parse_video_id(input).unwrap_err();
            assert!(matches!(err, AssistError::InvalidInput(_)), "input: {}", input);
        }
    }

    #[test]
    fn test_transcript_text() {
        let transcript = Transcript::new(
            "abc",
            "en",
            vec![
                TranscriptSnippet::new("hello ", 0.0, 2.0),
                TranscriptSnippet::new("", 2.0, 1.0),
                TranscriptSnippet::new("world", 3.0, 2.5),
            ],
        );
        assert_eq!(transcript.text(), "hello world");
        assert!(!transcript.is_empty());
    }

    #[test]
    fn test_fallback_metadata() {
        let meta = VideoMetadata::fallback("dQw4w9WgXcQ");
        assert!(meta.fallback);
        assert_eq!(meta.title, "YouTube Video: dQw4w9WgXcQ");
        assert_eq!(meta.video_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(meta.url_with_timestamp(65.4), "https://youtube.com/watch?v=dQw4w9WgXcQ&t=65s");
    }
}
