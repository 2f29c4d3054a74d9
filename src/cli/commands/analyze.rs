//! Analyze command implementation.

use crate::analysis::{key_points, SummaryType};
use crate::assistant::{AnalyzeRequest, Assistant};
use crate::cli::output::format_duration;
use crate::cli::Output;
use crate::config::Settings;
use crate::openai::check_api_key;
use crate::youtube::parse_video_id;
use anyhow::Result;

/// Analyze one video in the foreground and print the result.
pub async fn run_analyze(
    url: &str,
    summary_type: &str,
    sentiment: bool,
    no_topics: bool,
    no_questions: bool,
    settings: Settings,
) -> Result<()> {
    check_api_key(&settings.llm)?;

    let summary_type: SummaryType = summary_type.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let video_id = parse_video_id(url)?;

    let mut request = AnalyzeRequest::new(url);
    request.summary_type = summary_type;
    request.include_sentiment = sentiment;
    request.include_topics = !no_topics;
    request.include_questions = !no_questions;

    let assistant = Assistant::from_settings(settings)?;

    let spinner = Output::spinner(&format!("Analyzing {}...", video_id));
    let result = assistant.analyze_now(&video_id, &request.options()).await;
    spinner.finish_and_clear();
    let analysis = result?;

    Output::header(&analysis.metadata.title);
    Output::kv("Channel", &analysis.metadata.author_name);
    Output::kv("URL", &analysis.metadata.video_url);
    Output::kv("Language", &analysis.language);
    Output::kv("Chunks", &analysis.chunk_count.to_string());
    Output::kv("Took", &format_duration(analysis.processing_time));

    if let Some(summary) = analysis.summary(summary_type) {
        Output::header(&format!("Summary ({})", summary_type));
        for point in key_points(summary) {
            Output::paragraph(&point);
        }
    }

    if let Some(sentiment) = &analysis.sentiment {
        Output::header("Sentiment");
        let confidence = sentiment
            .confidence
            .as_deref()
            .map(|c| format!(" ({} confidence)", c))
            .unwrap_or_default();
        Output::info(&format!("{:?}{}", sentiment.label, confidence));
    }

    if !analysis.topics.is_empty() {
        Output::header("Topics");
        for topic in &analysis.topics {
            Output::topic(&topic.name, &topic.description);
        }
    }

    if !analysis.suggested_questions.is_empty() {
        Output::header("Suggested questions");
        for question in &analysis.suggested_questions {
            Output::list_item(question);
        }
    }

    println!();
    Output::success("Analysis complete.");
    Ok(())
}
