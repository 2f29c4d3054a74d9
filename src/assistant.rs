//! The assistant service.
//!
//! Coordinates the whole pipeline from transcript download to indexing and
//! analysis, and owns all process-local state: jobs, the analysis cache, chat
//! sessions and reports.

use crate::analysis::{parse_list_items, AnalysisOptions, Analyzer, SummaryType};
use crate::cache::{AnalysisCache, VideoAnalysis};
use crate::chunking::{ContentChunk, TextSplitter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{AssistError, Result};
use crate::jobs::{JobState, JobStatus, JobTracker};
use crate::llm::{LanguageModel, OpenAIChatModel};
use crate::openai::create_client;
use crate::rag::{ContextBuilder, RagEngine, Source};
use crate::reports::{
    comparison_stats, format_comparison_videos, format_trend_groups, group_videos, report_id,
    trend_summary, validate_video_count, ComparisonRequest, ComparisonResult, Grouping, Report,
    ReportStore, ReportVideo, TrendRequest, TrendResult, COMPARISON_VIDEOS, MAX_INSIGHTS,
    TREND_VIDEOS,
};
use crate::sessions::{video_id_from_session, ChatSessions, ChatTurn};
use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
use crate::youtube::{parse_video_id, VideoMetadata, VideoSource, YoutubeSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, instrument, warn, Instrument};

const JOB_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn default_true() -> bool {
    true
}

/// Request to analyze one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Video URL or bare video ID.
    pub url: String,
    #[serde(default)]
    pub summary_type: SummaryType,
    /// Additional summary variants to generate in the same run.
    #[serde(default)]
    pub extra_summaries: Vec<SummaryType>,
    #[serde(default)]
    pub include_sentiment: bool,
    #[serde(default = "default_true")]
    pub include_topics: bool,
    #[serde(default = "default_true")]
    pub include_questions: bool,
    /// Re-analyze even when a cached record exists.
    #[serde(default)]
    pub force: bool,
}

impl AnalyzeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            summary_type: SummaryType::default(),
            extra_summaries: Vec::new(),
            include_sentiment: false,
            include_topics: true,
            include_questions: true,
            force: false,
        }
    }

    pub fn options(&self) -> AnalysisOptions {
        let mut summary_types = vec![self.summary_type];
        summary_types.extend(self.extra_summaries.iter().copied());
        AnalysisOptions {
            summary_types,
            include_sentiment: self.include_sentiment,
            include_topics: self.include_topics,
            include_questions: self.include_questions,
        }
    }
}

/// Outcome of an analyze request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    /// A new background job was started.
    Pending,
    /// A job for this video was already running.
    Processing,
    /// A cached record exists; nothing was started.
    AlreadyProcessed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub video_id: String,
    pub status: SubmitStatus,
    pub metadata: Option<VideoMetadata>,
    /// Seconds spent handling the request itself.
    pub processing_time: f64,
}

/// A chat message about a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    /// Video to chat about. Defaults to the session's video.
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub use_external_sources: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub video_id: String,
    pub response: String,
    pub sources: Vec<Source>,
    pub processing_time: f64,
}

/// One entry of the video listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoListing {
    pub video_id: String,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub status: JobState,
    /// Whether an analysis record is currently cached.
    pub cached: bool,
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a cache clear removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearSummary {
    pub videos: usize,
    pub chunks: usize,
    pub sessions: usize,
    pub reports: usize,
}

/// Liveness information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub model: String,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub jobs: usize,
    pub jobs_in_flight: usize,
    pub active_sessions: usize,
    pub indexed_chunks: usize,
    pub timestamp: DateTime<Utc>,
}

/// The YouTube assistant.
pub struct Assistant {
    settings: Settings,
    prompts: Arc<Prompts>,
    source: Arc<dyn VideoSource>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    vector_store: Arc<dyn VectorStore>,
    splitter: TextSplitter,
    analyzer: Analyzer,
    rag: RagEngine,
    jobs: JobTracker,
    cache: AnalysisCache,
    sessions: ChatSessions,
    comparisons: ReportStore<ComparisonResult>,
    trends: ReportStore<TrendResult>,
}

impl Assistant {
    /// Create an assistant backed by YouTube and an OpenAI-compatible API.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let client = create_client(&settings.llm)?;
        let embedder = Arc::new(OpenAIEmbedder::new(client.clone(), &settings.embedding));
        let llm = Arc::new(OpenAIChatModel::new(client, &settings.llm));
        let source = Arc::new(YoutubeSource::new(&settings.transcript)?);
        let vector_store = Arc::new(MemoryVectorStore::new());

        info!(
            "Using {} for chat and {} for embeddings",
            settings.llm.model, settings.embedding.model
        );

        Self::with_components(settings, prompts, source, embedder, llm, vector_store)
    }

    /// Create an assistant with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        source: Arc<dyn VideoSource>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        settings.validate()?;

        let prompts = Arc::new(prompts);
        let splitter = TextSplitter::from_settings(&settings.chunking)?;
        let analyzer = Analyzer::new(llm.clone(), prompts.clone(), settings.analysis.clone());
        let rag = RagEngine::new(
            llm.clone(),
            ContextBuilder::new(vector_store.clone(), embedder.clone()),
            prompts.clone(),
            settings.rag.clone(),
        );
        let cache = AnalysisCache::new(settings.cache.max_entries);

        Ok(Self {
            settings,
            prompts,
            source,
            embedder,
            llm,
            vector_store,
            splitter,
            analyzer,
            rag,
            jobs: JobTracker::new(),
            cache,
            sessions: ChatSessions::new(),
            comparisons: ReportStore::new(),
            trends: ReportStore::new(),
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start a background analysis unless the video is cached or already running.
    pub fn submit_analysis(self: &Arc<Self>, request: AnalyzeRequest) -> Result<AnalyzeResponse> {
        let started = Instant::now();
        let video_id = parse_video_id(&request.url)?;

        if !request.force {
            if let Some(existing) = self.cache.get(&video_id) {
                info!("Video {} is already analyzed", video_id);
                return Ok(AnalyzeResponse {
                    video_id,
                    status: SubmitStatus::AlreadyProcessed,
                    metadata: Some(existing.metadata.clone()),
                    processing_time: started.elapsed().as_secs_f64(),
                });
            }
        }

        let status = match self.jobs.try_submit(&video_id) {
            Ok(status) => status,
            Err(current) => {
                info!("Video {} is already {}", video_id, current.state.as_str());
                return Ok(AnalyzeResponse {
                    video_id,
                    status: match current.state {
                        JobState::Pending => SubmitStatus::Pending,
                        _ => SubmitStatus::Processing,
                    },
                    metadata: current.metadata,
                    processing_time: started.elapsed().as_secs_f64(),
                });
            }
        };

        let assistant = Arc::clone(self);
        let options = request.options();
        let job_id = video_id.clone();
        tokio::spawn(
            async move {
                // Failures are recorded on the job.
                let _ = assistant.process(&job_id, &options).await;
            }
            .instrument(info_span!("analysis", video_id = %video_id)),
        );

        Ok(AnalyzeResponse {
            video_id,
            status: SubmitStatus::Pending,
            metadata: status.metadata,
            processing_time: started.elapsed().as_secs_f64(),
        })
    }

    /// Analyze a video in the current task and cache the result.
    ///
    /// When a job for the video is already in flight, waits for that job
    /// instead of starting a second pipeline.
    pub async fn analyze_now(&self, video_id: &str, options: &AnalysisOptions) -> Result<Arc<VideoAnalysis>> {
        match self.jobs.try_submit(video_id) {
            Ok(_) => self.process(video_id, options).await,
            Err(current) => {
                info!("Waiting for the {} job of {}", current.state.as_str(), video_id);
                self.wait_for_job(video_id).await
            }
        }
    }

    async fn wait_for_job(&self, video_id: &str) -> Result<Arc<VideoAnalysis>> {
        loop {
            match self.jobs.get(video_id) {
                Some(job) if job.state.is_in_flight() => {
                    tokio::time::sleep(JOB_POLL_INTERVAL).await;
                }
                Some(JobStatus {
                    state: JobState::Failed,
                    error,
                    ..
                }) => {
                    return Err(AssistError::NotFound(format!(
                        "Analysis of {} failed: {}",
                        video_id,
                        error.as_deref().unwrap_or("unknown error")
                    )));
                }
                _ => {
                    return self.cache.get(video_id).ok_or_else(|| {
                        AssistError::NotFound(format!("Video {} is no longer cached", video_id))
                    });
                }
            }
        }
    }

    async fn process(&self, video_id: &str, options: &AnalysisOptions) -> Result<Arc<VideoAnalysis>> {
        self.jobs.mark_processing(video_id);

        match self.run_pipeline(video_id, options).await {
            Ok(analysis) => {
                info!(
                    "Completed analysis for {} in {:.1}s",
                    video_id, analysis.processing_time
                );
                Ok(self.store(analysis).await)
            }
            Err(e) => {
                error!("Analysis of {} failed: {}", video_id, e);
                // Chunks indexed before the failure have no cache record to evict them.
                if !self.cache.contains(video_id) {
                    if let Err(e) = self.vector_store.delete_by_video_id(video_id).await {
                        warn!("Failed to drop chunks of {}: {}", video_id, e);
                    }
                }
                self.jobs.fail(video_id, e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch, chunk, index and analyze one video.
    #[instrument(skip(self, options))]
    async fn run_pipeline(&self, video_id: &str, options: &AnalysisOptions) -> Result<VideoAnalysis> {
        let started = Instant::now();

        info!("Fetching metadata for {}", video_id);
        let metadata = self.source.fetch_metadata(video_id).await;
        self.jobs.attach_metadata(video_id, metadata.clone());

        info!("Fetching transcript for: {}", metadata.title);
        let transcript = self.source.fetch_transcript(video_id).await?;

        let chunks = self.splitter.split(&transcript);
        if chunks.is_empty() {
            return Err(AssistError::Transcript(format!(
                "Transcript for {} has no text",
                video_id
            )));
        }
        info!("Created {} chunks", chunks.len());

        let text = transcript.text();
        let (chunk_count, output) = futures::try_join!(
            self.index_chunks(&metadata, &chunks),
            self.analyzer.run(&text, &chunks, options),
        )?;

        Ok(VideoAnalysis {
            video_id: video_id.to_string(),
            metadata,
            transcript: text,
            language: transcript.language,
            summaries: output.summaries,
            sentiment: output.sentiment,
            topics: output.topics,
            suggested_questions: output.suggested_questions,
            chunk_count,
            created_at: Utc::now(),
            processing_time: started.elapsed().as_secs_f64(),
        })
    }

    /// Generate embeddings and index chunks, replacing any earlier ones.
    async fn index_chunks(&self, metadata: &VideoMetadata, chunks: &[ContentChunk]) -> Result<usize> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AssistError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                Document::new(
                    metadata.video_id.clone(),
                    metadata.title.clone(),
                    chunk.content.clone(),
                    chunk.start_seconds,
                    chunk.end_seconds,
                    embedding,
                    chunk.order,
                )
            })
            .collect();

        self.vector_store.delete_by_video_id(&metadata.video_id).await?;
        self.vector_store.upsert_batch(&documents).await
    }

    /// Cache a finished analysis and mark its job complete.
    async fn store(&self, analysis: VideoAnalysis) -> Arc<VideoAnalysis> {
        let record = Arc::new(analysis);
        let evicted = self.cache.insert(record.clone());
        self.jobs.complete(&record.video_id);

        for video_id in evicted {
            info!("Evicting {} from the analysis cache", video_id);
            if !self.should_drop_evicted(&video_id) {
                info!("Keeping chunks of {}: it is being re-analyzed", video_id);
                continue;
            }
            if let Err(e) = self.vector_store.delete_by_video_id(&video_id).await {
                warn!("Failed to drop chunks of {}: {}", video_id, e);
            }
            self.sessions.remove_for_video(&video_id);
        }

        record
    }

    /// Whether an evicted video's chunks and sessions can go.
    ///
    /// A video that was re-cached or has a job in flight owns fresh chunks.
    fn should_drop_evicted(&self, video_id: &str) -> bool {
        !self.cache.contains(video_id)
            && !self
                .jobs
                .get(video_id)
                .is_some_and(|job| job.state.is_in_flight())
    }

    /// Job status for a video.
    pub fn status(&self, video_id: &str) -> Result<JobStatus> {
        self.jobs
            .get(video_id)
            .ok_or_else(|| AssistError::NotFound(format!("Video {} has not been submitted", video_id)))
    }

    /// Cached analysis, or the reason it is unavailable.
    fn ready_analysis(&self, video_id: &str) -> Result<Arc<VideoAnalysis>> {
        match self.jobs.get(video_id) {
            Some(job) if job.state.is_in_flight() => Err(AssistError::NotReady(format!(
                "Analysis of {} is still {}",
                video_id,
                job.state.as_str()
            ))),
            _ => self.cache.get(video_id).ok_or_else(|| {
                AssistError::NotFound(format!("Video {} not found. Analyze it first.", video_id))
            }),
        }
    }

    /// Cached analysis that includes the requested summary variant.
    pub fn analysis(&self, video_id: &str, summary_type: SummaryType) -> Result<Arc<VideoAnalysis>> {
        let analysis = self.ready_analysis(video_id)?;
        if analysis.summary(summary_type).is_none() {
            return Err(AssistError::NotFound(format!(
                "No {} summary for {}. Re-analyze with summary_type={} and force=true.",
                summary_type, video_id, summary_type
            )));
        }
        Ok(analysis)
    }

    fn resolve_chat_video(&self, request: &ChatRequest) -> Result<String> {
        if let Some(video) = request.video_id.as_deref().filter(|v| !v.trim().is_empty()) {
            return parse_video_id(video);
        }
        if let Some(video) = self.sessions.bound_video(&request.session_id) {
            return Ok(video);
        }
        video_id_from_session(&request.session_id)
            .map(str::to_string)
            .ok_or_else(|| {
                AssistError::InvalidInput(format!(
                    "Cannot determine the video for session {}. Pass video_id.",
                    request.session_id
                ))
            })
    }

    /// Answer a chat message about an analyzed video.
    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let started = Instant::now();

        if request.session_id.trim().is_empty() {
            return Err(AssistError::InvalidInput("session_id must not be empty".to_string()));
        }
        if request.message.trim().is_empty() {
            return Err(AssistError::InvalidInput("message must not be empty".to_string()));
        }

        let video_id = self.resolve_chat_video(&request)?;
        let analysis = self.ready_analysis(&video_id)?;
        self.sessions.ensure(&request.session_id, &video_id)?;

        let history = self
            .sessions
            .recent(&request.session_id, self.settings.rag.history_turns);
        let response = self
            .rag
            .answer(
                &analysis.metadata,
                &request.message,
                &history,
                request.use_external_sources,
            )
            .await?;

        self.sessions.append(
            &request.session_id,
            ChatTurn {
                timestamp: Utc::now(),
                user_message: request.message.clone(),
                assistant_response: response.answer.clone(),
                sources: response.sources.clone(),
                use_external_sources: request.use_external_sources,
            },
        );

        Ok(ChatReply {
            session_id: request.session_id,
            video_id,
            response: response.answer,
            sources: response.sources,
            processing_time: started.elapsed().as_secs_f64(),
        })
    }

    /// Video a chat session is bound to.
    pub fn bound_video(&self, session_id: &str) -> Option<String> {
        self.sessions.bound_video(session_id)
    }

    /// Turns of a chat session, oldest first.
    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        self.sessions.history(session_id)
    }

    /// Every submitted video with its job state.
    pub fn list_videos(&self) -> Vec<VideoListing> {
        self.jobs
            .list()
            .into_iter()
            .map(|job| VideoListing {
                cached: self.cache.contains(&job.video_id),
                title: job.metadata.as_ref().map(|m| m.title.clone()),
                channel: job.metadata.as_ref().map(|m| m.author_name.clone()),
                video_id: job.video_id,
                status: job.state,
                error: job.error,
                submitted_at: job.submitted_at,
                updated_at: job.updated_at,
            })
            .collect()
    }

    /// Drop every cached analysis, indexed chunk, session and report. Job records stay.
    pub async fn clear_cache(&self) -> Result<ClearSummary> {
        let summary = ClearSummary {
            videos: self.cache.clear(),
            chunks: self.vector_store.clear().await?,
            sessions: self.sessions.clear(),
            reports: self.comparisons.clear() + self.trends.clear(),
        };
        info!(
            "Cleared {} videos, {} chunks, {} sessions, {} reports",
            summary.videos, summary.chunks, summary.sessions, summary.reports
        );
        Ok(summary)
    }

    /// Drop the cached analysis, chunks and sessions of one video.
    pub async fn clear_video(&self, video_id: &str) -> Result<ClearSummary> {
        let summary = ClearSummary {
            videos: usize::from(self.cache.remove(video_id)),
            chunks: self.vector_store.delete_by_video_id(video_id).await?,
            sessions: self.sessions.remove_for_video(video_id),
            reports: 0,
        };
        info!("Cleared cache for {}", video_id);
        Ok(summary)
    }

    /// Start a background comparison of several videos.
    pub fn submit_comparison(self: &Arc<Self>, request: ComparisonRequest) -> Result<Report<ComparisonResult>> {
        validate_video_count("comparison", &request.video_urls, COMPARISON_VIDEOS)?;

        let id = report_id(&request.video_urls);
        let report = match self.comparisons.try_start(&id, request.video_urls.len()) {
            Ok(report) => report,
            Err(running) => {
                info!("Report {} is already processing", id);
                return Ok(running);
            }
        };

        let assistant = Arc::clone(self);
        tokio::spawn(
            async move { assistant.run_comparison(&id, request).await }
                .instrument(info_span!("comparison", report_id = %report.id)),
        );

        Ok(report)
    }

    pub fn comparison(&self, id: &str) -> Result<Report<ComparisonResult>> {
        self.comparisons
            .get(id)
            .ok_or_else(|| AssistError::NotFound(format!("Comparison {} not found", id)))
    }

    /// Start a background trend analysis over several videos.
    pub fn submit_trends(self: &Arc<Self>, request: TrendRequest) -> Result<Report<TrendResult>> {
        validate_video_count("trend analysis", &request.video_urls, TREND_VIDEOS)?;

        let id = report_id(&request.video_urls);
        let report = match self.trends.try_start(&id, request.video_urls.len()) {
            Ok(report) => report,
            Err(running) => {
                info!("Report {} is already processing", id);
                return Ok(running);
            }
        };

        let assistant = Arc::clone(self);
        tokio::spawn(
            async move { assistant.run_trends(&id, request).await }
                .instrument(info_span!("trends", report_id = %report.id)),
        );

        Ok(report)
    }

    pub fn trend_report(&self, id: &str) -> Result<Report<TrendResult>> {
        self.trends
            .get(id)
            .ok_or_else(|| AssistError::NotFound(format!("Trend analysis {} not found", id)))
    }

    /// Analyze (or reuse) every video of a report. Failing videos are skipped.
    async fn collect_report_videos(&self, urls: &[String], on_video: impl Fn(ReportVideo)) -> Vec<ReportVideo> {
        let options = AnalysisOptions {
            summary_types: vec![SummaryType::Comprehensive],
            include_sentiment: true,
            include_topics: true,
            include_questions: false,
        };

        let mut videos = Vec::with_capacity(urls.len());
        for url in urls {
            let video_id = match parse_video_id(url) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };

            let analysis = match self.cache.get(&video_id) {
                Some(cached) => cached,
                None => match self.analyze_now(&video_id, &options).await {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        warn!("Skipping {}: {}", url, e);
                        continue;
                    }
                },
            };

            let video = ReportVideo::from_analysis(url, &analysis);
            on_video(video.clone());
            videos.push(video);
        }
        videos
    }

    async fn run_comparison(&self, id: &str, request: ComparisonRequest) {
        info!("Starting video comparison {}", id);
        let videos = self
            .collect_report_videos(&request.video_urls, |v| self.comparisons.push_video(id, v))
            .await;

        if videos.is_empty() {
            self.comparisons.fail(id, "None of the videos could be analyzed");
            return;
        }

        let mut vars = HashMap::new();
        vars.insert("video_count".to_string(), videos.len().to_string());
        vars.insert("aspects".to_string(), request.comparison_aspects.join(", "));
        vars.insert("depth".to_string(), request.analysis_depth.clone());
        vars.insert("videos".to_string(), format_comparison_videos(&videos));
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.reports.comparison, &vars);

        match self.llm.complete(None, &[], &prompt).await {
            Ok(text) => {
                self.comparisons.complete(
                    id,
                    ComparisonResult {
                        comparison_analysis: text,
                        videos_count: videos.len(),
                        aspects_analyzed: request.comparison_aspects,
                        analysis_depth: request.analysis_depth,
                        summary_stats: comparison_stats(&videos),
                    },
                );
                info!("Completed video comparison {}", id);
            }
            Err(e) => {
                error!("Comparison {} failed: {}", id, e);
                self.comparisons.fail(id, format!("Failed to compare videos: {}", e));
            }
        }
    }

    async fn run_trends(&self, id: &str, request: TrendRequest) {
        info!("Starting trend analysis {}", id);
        let videos = self
            .collect_report_videos(&request.video_urls, |v| self.trends.push_video(id, v))
            .await;

        if videos.is_empty() {
            self.trends.fail(id, "None of the videos could be analyzed");
            return;
        }

        let groups = group_videos(&videos, Grouping::parse(&request.grouping));

        let mut vars = HashMap::new();
        vars.insert("video_count".to_string(), videos.len().to_string());
        vars.insert("time_period".to_string(), request.time_period.clone());
        vars.insert("aspects".to_string(), request.trend_aspects.join(", "));
        vars.insert("grouping".to_string(), request.grouping.clone());
        vars.insert("groups".to_string(), format_trend_groups(&groups, &videos));
        let prompt = self.prompts.render_with_custom(&self.prompts.reports.trends, &vars);

        let analysis = match self.llm.complete(None, &[], &prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("Trend analysis {} failed: {}", id, e);
                self.trends.fail(id, format!("Failed to analyze video trends: {}", e));
                return;
            }
        };

        let insights = self.trend_insights(&analysis, videos.len()).await;

        self.trends.complete(
            id,
            TrendResult {
                trend_analysis: analysis,
                analysis_period: request.time_period,
                aspects_analyzed: request.trend_aspects,
                grouping_method: request.grouping,
                data_summary: trend_summary(&videos, &groups),
                groups,
                insights,
            },
        );
        info!("Completed trend analysis {}", id);
    }

    /// Actionable insights from a trend analysis. Never fails.
    async fn trend_insights(&self, analysis: &str, video_count: usize) -> Vec<String> {
        let mut vars = HashMap::new();
        vars.insert("video_count".to_string(), video_count.to_string());
        vars.insert("analysis".to_string(), crate::rag::snippet(analysis, 1000));
        let prompt = self.prompts.render_with_custom(&self.prompts.reports.insights, &vars);

        match self.llm.complete(None, &[], &prompt).await {
            Ok(text) => {
                let insights = parse_list_items(&text, MAX_INSIGHTS);
                if insights.is_empty() {
                    vec!["Unable to generate insights at this time.".to_string()]
                } else {
                    insights
                }
            }
            Err(e) => {
                warn!("Insight generation failed: {}", e);
                vec![format!("Error generating insights: {}", e)]
            }
        }
    }

    /// Liveness and counters.
    pub async fn health(&self) -> Health {
        Health {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model: self.llm.model().to_string(),
            cache_size: self.cache.len(),
            cache_capacity: self.cache.max_entries(),
            jobs: self.jobs.len(),
            jobs_in_flight: self.jobs.in_flight(),
            active_sessions: self.sessions.len(),
            indexed_chunks: self.vector_store.document_count().await.unwrap_or_default(),
            timestamp: Utc::now(),
        }
    }
}
