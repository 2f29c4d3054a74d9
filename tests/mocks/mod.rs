#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ytassist::embedding::Embedder;
use ytassist::llm::{ChatMessage, LanguageModel};
use ytassist::youtube::{Transcript, TranscriptSnippet, VideoMetadata, VideoSource};
use ytassist::{AssistError, Result};

/// Serves a canned transcript for any video. Videos in `failing` have no captions.
#[derive(Clone, Default)]
pub struct MockSource {
    pub failing: HashSet<String>,
    /// Time every transcript fetch takes.
    pub delay: Option<Duration>,
    pub transcript_calls: Arc<Mutex<Vec<String>>>,
}

impl MockSource {
    pub fn failing_for(video_id: &str) -> Self {
        Self {
            failing: HashSet::from([video_id.to_string()]),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Number of transcript fetches made for `video_id`.
    pub fn fetches_for(&self, video_id: &str) -> usize {
        self.transcript_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| *id == video_id)
            .count()
    }
}

#[async_trait]
impl VideoSource for MockSource {
    async fn fetch_metadata(&self, video_id: &str) -> VideoMetadata {
        VideoMetadata {
            title: format!("Video {}", video_id),
            author_name: "Mock Channel".to_string(),
            ..VideoMetadata::fallback(video_id)
        }
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<Transcript> {
        self.transcript_calls.lock().unwrap().push(video_id.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(video_id) {
            return Err(AssistError::Transcript(format!(
                "No transcript available for {}",
                video_id
            )));
        }

        let lines = [
            "Welcome to this video about sourdough bread.",
            "First we feed the starter with flour and water.",
            "Then the dough rests overnight in the fridge.",
            "Baking happens at a high temperature with steam.",
            "The crust gets dark and the crumb stays open.",
        ];
        let snippets = lines
            .iter()
            .enumerate()
            .map(|(i, text)| TranscriptSnippet::new(*text, i as f64 * 30.0, 30.0))
            .collect();
        Ok(Transcript::new(video_id, "en", snippets))
    }
}

/// Hashes lowercase words into a small bag-of-words vector.
#[derive(Clone, Default)]
pub struct BagOfWordsEmbedder;

const DIMS: usize = 32;

fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIMS];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let bucket = word
            .to_lowercase()
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        vector[bucket % DIMS] += 1.0;
    }
    vector
}

#[async_trait]
impl Embedder for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(bag_of_words(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    fn dimensions(&self) -> Option<usize> {
        Some(DIMS)
    }
}

/// Answers according to which default prompt it was given.
#[derive(Clone, Default)]
pub struct MockModel {
    pub summaries: Arc<AtomicUsize>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    /// Time every completion takes.
    pub delay: Option<Duration>,
    /// Reject every request.
    pub failing: bool,
}

impl MockModel {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, _system: Option<&str>, _history: &[ChatMessage], prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(AssistError::Llm("model is overloaded".to_string()));
        }

        let reply = if prompt.contains("most important topics or themes") {
            "**Topic 1: Sourdough Starter**\nFeeding and caring for the starter.\n**Topic 2: Baking**\nOven temperature and steam.".to_string()
        } else if prompt.contains("Analyze the sentiment") {
            "**Overall Sentiment:** Positive\n- Confidence level: High".to_string()
        } else if prompt.contains("questions a viewer might want to ask") {
            "1. How often is the starter fed?\n2. Why use steam when baking?".to_string()
        } else if prompt.contains("**Question:**") {
            "The dough rests overnight.".to_string()
        } else if prompt.contains("Compare the following") {
            "**Overview Summary** Both videos cover bread.".to_string()
        } else if prompt.contains("Analyze trends") {
            "**Trend Overview** Bread is popular.".to_string()
        } else if prompt.contains("actionable insights") {
            "1. Film the crumb shot\n2. Explain the starter early".to_string()
        } else {
            let n = self.summaries.fetch_add(1, Ordering::SeqCst) + 1;
            format!("**Main Topic:** Sourdough bread, take {}. **Key Points:** starter, rest, bake.", n)
        };
        Ok(reply)
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
