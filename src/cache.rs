//! Bounded cache of finished video analyses.
//!
//! Entries are evicted in insertion order once the cache grows past its
//! capacity. Re-inserting a video replaces its record and makes it the newest.

use crate::analysis::{Sentiment, SummaryType, Topic};
use crate::youtube::VideoMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

/// Everything produced by analyzing one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub video_id: String,
    pub metadata: VideoMetadata,
    /// Full transcript text.
    pub transcript: String,
    /// Caption language code.
    pub language: String,
    pub summaries: BTreeMap<SummaryType, String>,
    pub sentiment: Option<Sentiment>,
    pub topics: Vec<Topic>,
    pub suggested_questions: Vec<String>,
    /// Number of chunks indexed for retrieval.
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
    /// Wall-clock seconds spent analyzing.
    pub processing_time: f64,
}

impl VideoAnalysis {
    pub fn summary(&self, summary_type: SummaryType) -> Option<&str> {
        self.summaries.get(&summary_type).map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Arc<VideoAnalysis>>,
    /// Video IDs, oldest insertion first.
    order: VecDeque<String>,
}

/// Video ID to analysis record, with a fixed maximum size.
#[derive(Debug)]
pub struct AnalysisCache {
    max_entries: usize,
    inner: RwLock<CacheInner>,
}

impl AnalysisCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            inner: RwLock::new(CacheInner::default()),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Insert or replace a record. Returns the video IDs evicted to make room.
    pub fn insert(&self, analysis: impl Into<Arc<VideoAnalysis>>) -> Vec<String> {
        let analysis = analysis.into();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let video_id = analysis.video_id.clone();

        if inner.entries.insert(video_id.clone(), analysis).is_some() {
            inner.order.retain(|id| id != &video_id);
        }
        inner.order.push_back(video_id);

        let mut evicted = Vec::new();
        while inner.order.len() > self.max_entries {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn get(&self, video_id: &str) -> Option<Arc<VideoAnalysis>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(video_id)
            .cloned()
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(video_id)
    }

    /// Remove one record. Returns whether it was present.
    pub fn remove(&self, video_id: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let removed = inner.entries.remove(video_id).is_some();
        if removed {
            inner.order.retain(|id| id != video_id);
        }
        removed
    }

    /// Remove everything. Returns the number of records dropped.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let count = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, summary: &str) -> VideoAnalysis {
        let mut summaries = BTreeMap::new();
        summaries.insert(SummaryType::Comprehensive, summary.to_string());
        VideoAnalysis {
            video_id: id.to_string(),
            metadata: VideoMetadata::fallback(id),
            transcript: "text".to_string(),
            language: "en".to_string(),
            summaries,
            sentiment: None,
            topics: vec![],
            suggested_questions: vec![],
            chunk_count: 1,
            created_at: Utc::now(),
            processing_time: 0.5,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = AnalysisCache::new(10);
        assert!(cache.insert(record("a", "first")).is_empty());

        let entry = cache.get("a").unwrap();
        assert_eq!(entry.summary(SummaryType::Comprehensive), Some("first"));
        assert_eq!(entry.summary(SummaryType::Executive), None);
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_reinsert_overwrites() {
        let cache = AnalysisCache::new(10);
        cache.insert(record("a", "first"));
        cache.insert(record("a", "second"));

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get("a").unwrap().summary(SummaryType::Comprehensive),
            Some("second")
        );
    }

    #[test]
    fn test_evicts_oldest_inserted() {
        let cache = AnalysisCache::new(2);
        cache.insert(record("a", ""));
        cache.insert(record("b", ""));
        // Re-inserting "a" makes "b" the oldest.
        cache.insert(record("a", ""));

        let evicted = cache.insert(record("c", ""));
        assert_eq!(evicted, vec!["b".to_string()]);
        assert!(cache.contains("a") && cache.contains("c"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = AnalysisCache::new(5);
        cache.insert(record("a", ""));
        cache.insert(record("b", ""));

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));

        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
        assert!(cache.get("b").is_none());
    }
}
