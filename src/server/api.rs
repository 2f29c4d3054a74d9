//! REST handlers.

use super::{AppState, ENDPOINTS};
use crate::analysis::{key_points, Sentiment, SummaryType, Topic};
use crate::assistant::{
    AnalyzeRequest, AnalyzeResponse, ChatReply, ChatRequest, ClearSummary, VideoListing,
};
use crate::error::AssistError;
use crate::jobs::JobStatus;
use crate::reports::{ComparisonRequest, ComparisonResult, Report, TrendRequest, TrendResult};
use crate::sessions::ChatTurn;
use crate::youtube::VideoMetadata;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// An `AssistError` rendered as `{"error": ...}` with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub AssistError);

impl From<AssistError> for ApiError {
    fn from(err: AssistError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            AssistError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AssistError::NotFound(_) => StatusCode::NOT_FOUND,
            AssistError::NotReady(_) => StatusCode::CONFLICT,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// === Request/Response Types ===

#[derive(Deserialize)]
pub struct AnalysisQuery {
    #[serde(default)]
    summary_type: Option<String>,
}

/// One summary variant of a cached analysis.
#[derive(Serialize)]
pub struct AnalysisResponse {
    video_id: String,
    metadata: VideoMetadata,
    summary_type: SummaryType,
    summary: String,
    key_points: Vec<String>,
    available_summaries: Vec<SummaryType>,
    sentiment: Option<Sentiment>,
    topics: Vec<Topic>,
    suggested_questions: Vec<String>,
    transcript_language: String,
    chunk_count: usize,
    created_at: DateTime<Utc>,
    processing_time: f64,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    session_id: String,
    video_id: Option<String>,
    history: Vec<ChatTurn>,
}

#[derive(Serialize)]
pub struct VideosResponse<T> {
    videos: Vec<T>,
    total: usize,
}

#[derive(Serialize)]
pub struct ClearResponse<T> {
    message: String,
    cleared: T,
}

// === Handlers ===

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let endpoints: Vec<String> = ENDPOINTS.iter().map(|(_, route)| route.to_string()).collect();
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.settings().llm.model,
        "endpoints": endpoints,
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health().await)
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<AnalyzeResponse> {
    Ok(Json(state.submit_analysis(req)?))
}

pub async fn status(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<JobStatus> {
    Ok(Json(state.status(&video_id)?))
}

pub async fn analysis(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> ApiResult<AnalysisResponse> {
    let summary_type = match query.summary_type.as_deref() {
        Some(name) if !name.is_empty() => name
            .parse::<SummaryType>()
            .map_err(AssistError::InvalidInput)?,
        _ => SummaryType::default(),
    };

    let analysis = state.analysis(&video_id, summary_type)?;
    let summary = analysis.summary(summary_type).unwrap_or_default().to_string();

    Ok(Json(AnalysisResponse {
        video_id: analysis.video_id.clone(),
        metadata: analysis.metadata.clone(),
        summary_type,
        key_points: key_points(&summary),
        summary,
        available_summaries: analysis.summaries.keys().copied().collect(),
        sentiment: analysis.sentiment.clone(),
        topics: analysis.topics.clone(),
        suggested_questions: analysis.suggested_questions.clone(),
        transcript_language: analysis.language.clone(),
        chunk_count: analysis.chunk_count,
        created_at: analysis.created_at,
        processing_time: analysis.processing_time,
    }))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<ChatReply> {
    Ok(Json(state.chat(req).await?))
}

pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        video_id: state.bound_video(&session_id),
        history: state.history(&session_id),
        session_id,
    })
}

pub async fn videos(
    State(state): State<AppState>,
) -> Json<VideosResponse<VideoListing>> {
    let videos = state.list_videos();
    Json(VideosResponse {
        total: videos.len(),
        videos,
    })
}

pub async fn clear_cache(
    State(state): State<AppState>,
) -> ApiResult<ClearResponse<ClearSummary>> {
    let cleared = state.clear_cache().await?;
    Ok(Json(ClearResponse {
        message: "Cache cleared".to_string(),
        cleared,
    }))
}

pub async fn clear_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<ClearResponse<ClearSummary>> {
    let cleared = state.clear_video(&video_id).await?;
    Ok(Json(ClearResponse {
        message: format!("Cache cleared for video {}", video_id),
        cleared,
    }))
}

pub async fn compare(
    State(state): State<AppState>,
    Json(req): Json<ComparisonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.submit_comparison(req)?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}

pub async fn comparison(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Report<ComparisonResult>> {
    Ok(Json(state.comparison(&id)?))
}

pub async fn trends(
    State(state): State<AppState>,
    Json(req): Json<TrendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.submit_trends(req)?;
    Ok((StatusCode::ACCEPTED, Json(report)))
}

pub async fn trend_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Report<TrendResult>> {
    Ok(Json(state.trend_report(&id)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AssistError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (AssistError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AssistError::NotReady("x".into()), StatusCode::CONFLICT),
            (AssistError::Llm("x".into()), StatusCode::BAD_GATEWAY),
            (AssistError::Transcript("x".into()), StatusCode::BAD_GATEWAY),
            (AssistError::VectorStore("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status_code(), expected);
        }
    }
}
