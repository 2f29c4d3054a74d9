//! YouTube source implementation: captions via `yt-transcript-rs`, metadata via oEmbed.

use super::{watch_url, Transcript, TranscriptSnippet, VideoMetadata, VideoSource};
use crate::config::TranscriptSettings;
use crate::error::{AssistError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use yt_transcript_rs::api::YouTubeTranscriptApi;

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    author_url: Option<String>,
    thumbnail_url: Option<String>,
}

/// YouTube video source.
pub struct YoutubeSource {
    http: reqwest::Client,
    languages: Vec<String>,
    preserve_formatting: bool,
}

impl YoutubeSource {
    pub fn new(settings: &TranscriptSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            http,
            languages: settings.languages.clone(),
            preserve_formatting: settings.preserve_formatting,
        })
    }

    async fn fetch_oembed(&self, video_id: &str) -> Result<VideoMetadata> {
        let response = self
            .http
            .get(OEMBED_ENDPOINT)
            .query(&[("url", watch_url(video_id).as_str()), ("format", "json")])
            .send()
            .await?
            .error_for_status()?;

        let data: OEmbedResponse = response.json().await?;
        let fallback = VideoMetadata::fallback(video_id);

        Ok(VideoMetadata {
            video_id: video_id.to_string(),
            title: data.title.unwrap_or(fallback.title),
            author_name: data.author_name.unwrap_or(fallback.author_name),
            author_url: data.author_url,
            thumbnail_url: data.thumbnail_url.or(fallback.thumbnail_url),
            video_url: fallback.video_url,
            fallback: false,
        })
    }
}

#[async_trait]
impl VideoSource for YoutubeSource {
    #[instrument(skip(self))]
    async fn fetch_metadata(&self, video_id: &str) -> VideoMetadata {
        match self.fetch_oembed(video_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("oEmbed lookup failed for {}, using placeholder metadata: {}", video_id, e);
                VideoMetadata::fallback(video_id)
            }
        }
    }

    #[instrument(skip(self))]
    async fn fetch_transcript(&self, video_id: &str) -> Result<Transcript> {
        let api = YouTubeTranscriptApi::new(None, None, None).map_err(|e| {
            AssistError::Transcript(format!("Failed to initialize transcript client: {}", e))
        })?;

        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        let fetched = api
            .fetch_transcript(video_id, &languages, self.preserve_formatting)
            .await
            .map_err(|e| AssistError::Transcript(format!("{}: {}", video_id, e)))?;

        let snippets: Vec<TranscriptSnippet> = fetched
            .snippets
            .into_iter()
            .map(|s| TranscriptSnippet::new(s.text, s.start, s.duration))
            .collect();

        let transcript = Transcript::new(video_id, fetched.language_code, snippets);
        if transcript.is_empty() {
            return Err(AssistError::Transcript(format!(
                "No transcript data retrieved for {}",
                video_id
            )));
        }

        debug!(
            "Fetched {} snippets ({}) for {}",
            transcript.snippets.len(),
            transcript.language,
            video_id
        );
        Ok(transcript)
    }
}
