//! Multi-video comparison and trend reports.
//!
//! Report generation runs in the background like video analysis. This module
//! holds the request and result types, the report book-keeping and the
//! helpers that turn analyzed videos into prompt text.

use crate::analysis::{Sentiment, SummaryType, Topic};
use crate::cache::VideoAnalysis;
use crate::error::{AssistError, Result};
use crate::rag::snippet;
use crate::youtube::VideoMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{PoisonError, RwLock};

/// Allowed number of videos in a comparison.
pub const COMPARISON_VIDEOS: std::ops::RangeInclusive<usize> = 2..=10;
/// Allowed number of videos in a trend analysis.
pub const TREND_VIDEOS: std::ops::RangeInclusive<usize> = 3..=50;
/// Maximum number of insights kept from a trend analysis.
pub const MAX_INSIGHTS: usize = 10;

fn default_comparison_aspects() -> Vec<String> {
    ["topics", "sentiment", "key_points", "conclusions"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_trend_aspects() -> Vec<String> {
    ["topics", "sentiment", "engagement_patterns"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_depth() -> String {
    "comprehensive".to_string()
}

fn default_time_period() -> String {
    "all".to_string()
}

fn default_grouping() -> String {
    "temporal".to_string()
}

/// Request to compare several videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub video_urls: Vec<String>,
    #[serde(default = "default_comparison_aspects")]
    pub comparison_aspects: Vec<String>,
    #[serde(default = "default_depth")]
    pub analysis_depth: String,
}

/// Request to analyze trends across videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRequest {
    pub video_urls: Vec<String>,
    #[serde(default = "default_time_period")]
    pub time_period: String,
    #[serde(default = "default_trend_aspects")]
    pub trend_aspects: Vec<String>,
    #[serde(default = "default_grouping")]
    pub grouping: String,
}

/// How trend videos are grouped before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Upload dates are not available, so everything lands in one group.
    Temporal,
    /// Keyword buckets over the extracted topics.
    Topical,
    /// One group per channel.
    Channel,
    /// Anything else: a single group.
    All,
}

impl Grouping {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "temporal" => Grouping::Temporal,
            "topical" => Grouping::Topical,
            "channel" => Grouping::Channel,
            _ => Grouping::All,
        }
    }
}

/// Per-video input to a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportVideo {
    pub video_id: String,
    pub url: String,
    pub metadata: VideoMetadata,
    pub summary: String,
    pub topics: Vec<Topic>,
    pub sentiment: Option<Sentiment>,
}

impl ReportVideo {
    pub fn from_analysis(url: &str, analysis: &VideoAnalysis) -> Self {
        Self {
            video_id: analysis.video_id.clone(),
            url: url.to_string(),
            metadata: analysis.metadata.clone(),
            summary: analysis
                .summary(SummaryType::Comprehensive)
                .unwrap_or_default()
                .to_string(),
            topics: analysis.topics.clone(),
            sentiment: analysis.sentiment.clone(),
        }
    }

    /// Topic names and descriptions as one line of text.
    pub fn topics_text(&self) -> String {
        self.topics
            .iter()
            .map(|t| {
                if t.description.is_empty() {
                    t.name.clone()
                } else {
                    format!("{}: {}", t.name, t.description)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn sentiment_text(&self) -> String {
        self.sentiment
            .as_ref()
            .map(|s| s.analysis.clone())
            .unwrap_or_default()
    }
}

/// A named set of videos within a trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoGroup {
    pub name: String,
    pub video_ids: Vec<String>,
}

/// Aggregate numbers for a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonStats {
    pub total_videos: usize,
    pub channels: usize,
    /// Distinct words across all topic lists.
    pub topics_covered: usize,
}

/// Result of a finished comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub comparison_analysis: String,
    pub videos_count: usize,
    pub aspects_analyzed: Vec<String>,
    pub analysis_depth: String,
    pub summary_stats: ComparisonStats,
}

/// Aggregate numbers for a trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSummary {
    pub total_videos: usize,
    pub groups_analyzed: usize,
    pub channels_involved: usize,
    pub analysis_date: DateTime<Utc>,
}

/// Result of a finished trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResult {
    pub trend_analysis: String,
    pub analysis_period: String,
    pub aspects_analyzed: Vec<String>,
    pub grouping_method: String,
    pub data_summary: TrendSummary,
    pub groups: Vec<VideoGroup>,
    pub insights: Vec<String>,
}

/// Lifecycle of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportState {
    Processing,
    Complete,
    Failed,
}

/// Book-keeping for one report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report<T> {
    pub id: String,
    pub state: ReportState,
    pub videos_requested: usize,
    /// Videos analyzed so far.
    pub videos: Vec<ReportVideo>,
    pub result: Option<T>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Report ID to report, process-local.
#[derive(Debug)]
pub struct ReportStore<T> {
    reports: RwLock<HashMap<String, Report<T>>>,
}

impl<T> Default for ReportStore<T> {
    fn default() -> Self {
        Self {
            reports: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> ReportStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or restart a report in the processing state.
    ///
    /// A report that is still processing is left alone and returned as the error.
    pub fn try_start(&self, id: &str, videos_requested: usize) -> std::result::Result<Report<T>, Report<T>> {
        let mut reports = self.reports.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = reports.get(id) {
            if current.state == ReportState::Processing {
                return Err(current.clone());
            }
        }

        let now = Utc::now();
        let report = Report {
            id: id.to_string(),
            state: ReportState::Processing,
            videos_requested,
            videos: Vec::new(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        reports.insert(id.to_string(), report.clone());
        Ok(report)
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut Report<T>)) {
        let mut reports = self.reports.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(report) = reports.get_mut(id) {
            f(report);
            report.updated_at = Utc::now();
        }
    }

    pub fn push_video(&self, id: &str, video: ReportVideo) {
        self.update(id, |r| r.videos.push(video));
    }

    pub fn complete(&self, id: &str, result: T) {
        self.update(id, |r| {
            r.state = ReportState::Complete;
            r.result = Some(result);
        });
    }

    pub fn fail(&self, id: &str, error: impl Into<String>) {
        let error = error.into();
        self.update(id, |r| {
            r.state = ReportState::Failed;
            r.error = Some(error);
        });
    }

    pub fn get(&self, id: &str) -> Option<Report<T>> {
        self.reports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> usize {
        let mut reports = self.reports.write().unwrap_or_else(PoisonError::into_inner);
        let count = reports.len();
        reports.clear();
        count
    }
}

/// Reject URL lists outside `allowed`.
pub fn validate_video_count(
    what: &str,
    urls: &[String],
    allowed: std::ops::RangeInclusive<usize>,
) -> Result<()> {
    if urls.len() < *allowed.start() {
        return Err(AssistError::InvalidInput(format!(
            "At least {} videos required for {}",
            allowed.start(),
            what
        )));
    }
    if urls.len() > *allowed.end() {
        return Err(AssistError::InvalidInput(format!(
            "Maximum {} videos allowed for {}",
            allowed.end(),
            what
        )));
    }
    Ok(())
}

/// Deterministic report ID for a URL list.
pub fn report_id(urls: &[String]) -> String {
    let mut hasher = DefaultHasher::new();
    urls.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn distinct_channels(videos: &[ReportVideo]) -> usize {
    videos
        .iter()
        .map(|v| v.metadata.author_name.as_str())
        .collect::<HashSet<_>>()
        .len()
}

pub fn comparison_stats(videos: &[ReportVideo]) -> ComparisonStats {
    let topic_words: HashSet<String> = videos
        .iter()
        .flat_map(|v| {
            v.topics_text()
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .collect();

    ComparisonStats {
        total_videos: videos.len(),
        channels: distinct_channels(videos),
        topics_covered: topic_words.len(),
    }
}

/// Split videos into groups, keeping first-seen group order.
pub fn group_videos(videos: &[ReportVideo], grouping: Grouping) -> Vec<VideoGroup> {
    let mut groups: Vec<VideoGroup> = Vec::new();

    for video in videos {
        let name = match grouping {
            Grouping::Temporal => "All Videos (temporal grouping requires upload dates)".to_string(),
            Grouping::Topical => topical_group(&video.topics_text()).to_string(),
            Grouping::Channel => video.metadata.author_name.clone(),
            Grouping::All => "All Videos".to_string(),
        };

        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.video_ids.push(video.video_id.clone()),
            None => groups.push(VideoGroup {
                name,
                video_ids: vec![video.video_id.clone()],
            }),
        }
    }

    groups
}

fn topical_group(topics: &str) -> &'static str {
    let topics = topics.to_lowercase();
    if topics.contains("technology") || topics.contains("tech") {
        "Technology"
    } else if topics.contains("education") || topics.contains("learning") {
        "Education"
    } else if topics.contains("business") || topics.contains("marketing") {
        "Business"
    } else {
        "General Content"
    }
}

/// Per-video block of the comparison prompt.
pub fn format_comparison_videos(videos: &[ReportVideo]) -> String {
    videos
        .iter()
        .enumerate()
        .map(|(i, v)| {
            format!(
                "**Video {}: {}**\n- Channel: {}\n- URL: {}\n- Summary: {}\n- Topics: {}\n- Sentiment: {}",
                i + 1,
                v.metadata.title,
                v.metadata.author_name,
                v.url,
                snippet(&v.summary, 300),
                snippet(&v.topics_text(), 200),
                snippet(&v.sentiment_text(), 150),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Per-group block of the trend prompt.
pub fn format_trend_groups(groups: &[VideoGroup], videos: &[ReportVideo]) -> String {
    groups
        .iter()
        .map(|group| {
            let lines = group
                .video_ids
                .iter()
                .filter_map(|id| videos.iter().find(|v| &v.video_id == id))
                .map(|v| {
                    format!(
                        "- {}\n  Topics: {}\n  Sentiment: {}",
                        snippet(&v.metadata.title, 100),
                        snippet(&v.topics_text(), 150),
                        snippet(&v.sentiment_text(), 100),
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!("**{}** ({} videos):\n{}", group.name, group.video_ids.len(), lines)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn trend_summary(videos: &[ReportVideo], groups: &[VideoGroup]) -> TrendSummary {
    TrendSummary {
        total_videos: videos.len(),
        groups_analyzed: groups.len(),
        channels_involved: distinct_channels(videos),
        analysis_date: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, channel: &str, topic: &str) -> ReportVideo {
        ReportVideo {
            video_id: id.to_string(),
            url: format!("https://youtu.be/{}", id),
            metadata: VideoMetadata {
                author_name: channel.to_string(),
                ..VideoMetadata::fallback(id)
            },
            summary: "A summary.".to_string(),
            topics: vec![Topic {
                name: topic.to_string(),
                description: String::new(),
            }],
            sentiment: None,
        }
    }

    #[test]
    fn test_validate_video_count() {
        let urls = |n: usize| vec!["u".to_string(); n];
        assert!(validate_video_count("comparison", &urls(1), COMPARISON_VIDEOS).is_err());
        assert!(validate_video_count("comparison", &urls(2), COMPARISON_VIDEOS).is_ok());
        assert!(validate_video_count("comparison", &urls(11), COMPARISON_VIDEOS).is_err());
        assert!(validate_video_count("trend analysis", &urls(2), TREND_VIDEOS).is_err());
        assert!(validate_video_count("trend analysis", &urls(50), TREND_VIDEOS).is_ok());
    }

    #[test]
    fn test_report_id_is_deterministic() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string(), "x".to_string()];
        assert_eq!(report_id(&a), report_id(&a.clone()));
        assert_ne!(report_id(&a), report_id(&b));
        assert_eq!(report_id(&a).len(), 16);
    }

    #[test]
    fn test_grouping() {
        let videos = vec![
            video("a", "Chan1", "Tech News"),
            video("b", "Chan2", "Online Learning"),
            video("c", "Chan1", "Cooking"),
            video("d", "Chan2", "Marketing Funnels"),
        ];

        let topical = group_videos(&videos, Grouping::Topical);
        let names: Vec<&str> = topical.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Technology", "Education", "General Content", "Business"]);

        let channel = group_videos(&videos, Grouping::Channel);
        assert_eq!(channel.len(), 2);
        assert_eq!(channel[0].video_ids, vec!["a".to_string(), "c".to_string()]);

        assert_eq!(group_videos(&videos, Grouping::Temporal).len(), 1);
        assert_eq!(group_videos(&videos, Grouping::parse("weekly"))[0].name, "All Videos");
    }

    #[test]
    fn test_stats_and_prompt_text() {
        let videos = vec![video("a", "Chan1", "Rust Tips"), video("b", "Chan1", "rust async")];
        let stats = comparison_stats(&videos);
        assert_eq!(stats.total_videos, 2);
        assert_eq!(stats.channels, 1);
        assert_eq!(stats.topics_covered, 3);

        let text = format_comparison_videos(&videos);
        assert!(text.contains("**Video 2: YouTube Video: b**"));
        assert!(text.contains("- Channel: Chan1"));

        let groups = group_videos(&videos, Grouping::Channel);
        let text = format_trend_groups(&groups, &videos);
        assert!(text.starts_with("**Chan1** (2 videos):"));
    }

    #[test]
    fn test_report_store_lifecycle() {
        let store: ReportStore<String> = ReportStore::new();
        store.try_start("r1", 3).unwrap();
        store.push_video("r1", video("a", "c", "t"));
        assert_eq!(store.get("r1").unwrap().state, ReportState::Processing);

        store.complete("r1", "done".to_string());
        let report = store.get("r1").unwrap();
        assert_eq!(report.state, ReportState::Complete);
        assert_eq!(report.videos.len(), 1);
        assert_eq!(report.result.as_deref(), Some("done"));

        store.fail("missing", "ignored");
        assert!(store.get("missing").is_none());
        assert_eq!(store.clear(), 1);
    }

    #[test]
    fn test_processing_report_is_not_restarted() {
        let store: ReportStore<String> = ReportStore::new();
        store.try_start("r1", 2).unwrap();
        store.push_video("r1", video("a", "c", "t"));

        let running = store.try_start("r1", 2).unwrap_err();
        assert_eq!(running.state, ReportState::Processing);
        assert_eq!(store.get("r1").unwrap().videos.len(), 1);

        // Finished reports can be run again.
        store.fail("r1", "model down");
        let restarted = store.try_start("r1", 2).unwrap();
        assert_eq!(restarted.state, ReportState::Processing);
        assert!(restarted.videos.is_empty());
        assert!(restarted.error.is_none());
    }
}
