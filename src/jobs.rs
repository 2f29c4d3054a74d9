//! Background analysis job tracking.
//!
//! One status record per video ID. Records are created on submit, updated by
//! the background task and never removed.

use crate::youtube::VideoMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// State of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted, not yet started.
    Pending,
    /// Transcript, indexing or model calls in progress.
    Processing,
    /// Finished and cached.
    Complete,
    /// Finished with an error.
    Failed,
}

impl JobState {
    /// Whether a background task currently owns this job.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, JobState::Pending | JobState::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Complete => "complete",
            JobState::Failed => "failed",
        }
    }
}

/// Status record for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub video_id: String,
    pub state: JobState,
    pub error: Option<String>,
    pub metadata: Option<VideoMetadata>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    fn pending(video_id: &str) -> Self {
        let now = Utc::now();
        Self {
            video_id: video_id.to_string(),
            state: JobState::Pending,
            error: None,
            metadata: None,
            submitted_at: now,
            updated_at: now,
        }
    }
}

/// Thread-safe map of video ID to job status.
#[derive(Debug, Default)]
pub struct JobTracker {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or reset the record for `video_id` to pending, unless a job for
    /// it is already pending or processing.
    ///
    /// Returns the in-flight record as the error when nothing was submitted.
    pub fn try_submit(&self, video_id: &str) -> Result<JobStatus, JobStatus> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = jobs.get(video_id) {
            if current.state.is_in_flight() {
                return Err(current.clone());
            }
        }
        let mut status = JobStatus::pending(video_id);
        if let Some(previous) = jobs.get(video_id) {
            status.metadata = previous.metadata.clone();
        }
        jobs.insert(video_id.to_string(), status.clone());
        Ok(status)
    }

    fn update(&self, video_id: &str, f: impl FnOnce(&mut JobStatus)) {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let status = jobs
            .entry(video_id.to_string())
            .or_insert_with(|| JobStatus::pending(video_id));
        f(status);
        status.updated_at = Utc::now();
    }

    pub fn mark_processing(&self, video_id: &str) {
        self.update(video_id, |s| {
            s.state = JobState::Processing;
            s.error = None;
        });
    }

    pub fn attach_metadata(&self, video_id: &str, metadata: VideoMetadata) {
        self.update(video_id, |s| s.metadata = Some(metadata));
    }

    pub fn complete(&self, video_id: &str) {
        self.update(video_id, |s| {
            s.state = JobState::Complete;
            s.error = None;
        });
    }

    pub fn fail(&self, video_id: &str, error: impl Into<String>) {
        let error = error.into();
        self.update(video_id, |s| {
            s.state = JobState::Failed;
            s.error = Some(error);
        });
    }

    pub fn get(&self, video_id: &str) -> Option<JobStatus> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(video_id)
            .cloned()
    }

    /// All records, oldest submission first.
    pub fn list(&self) -> Vec<JobStatus> {
        let mut all: Vec<JobStatus> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.video_id.cmp(&b.video_id))
        });
        all
    }

    /// Number of pending or processing jobs.
    pub fn in_flight(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.state.is_in_flight())
            .count()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_lifecycle() {
        let tracker = JobTracker::new();
        assert!(tracker.get("abc").is_none());

        let status = tracker.try_submit("abc").unwrap();
        assert_eq!(status.state, JobState::Pending);
        assert_eq!(tracker.in_flight(), 1);

        tracker.mark_processing("abc");
        tracker.attach_metadata("abc", VideoMetadata::fallback("abc"));
        assert_eq!(tracker.get("abc").unwrap().state, JobState::Processing);

        tracker.complete("abc");
        let status = tracker.get("abc").unwrap();
        assert_eq!(status.state, JobState::Complete);
        assert!(status.metadata.is_some());
        assert!(status.updated_at >= status.submitted_at);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_failure_keeps_message() {
        let tracker = JobTracker::new();
        tracker.try_submit("abc").unwrap();
        tracker.fail("abc", "no captions");

        let status = tracker.get("abc").unwrap();
        assert_eq!(status.state, JobState::Failed);
        assert_eq!(status.error.as_deref(), Some("no captions"));

        // Resubmitting clears the error but keeps known metadata.
        tracker.attach_metadata("abc", VideoMetadata::fallback("abc"));
        let status = tracker.try_submit("abc").unwrap();
        assert_eq!(status.state, JobState::Pending);
        assert!(status.error.is_none());
        assert!(status.metadata.is_some());
    }

    #[test]
    fn test_try_submit_rejects_in_flight() {
        let tracker = JobTracker::new();
        assert!(tracker.try_submit("abc").is_ok());
        let current = tracker.try_submit("abc").unwrap_err();
        assert_eq!(current.state, JobState::Pending);

        tracker.complete("abc");
        assert!(tracker.try_submit("abc").is_ok());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobState::Complete).unwrap(), "\"complete\"");
        assert_eq!(JobState::Processing.as_str(), "processing");
    }
}
