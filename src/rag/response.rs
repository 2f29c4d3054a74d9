//! RAG response generation.

use super::{context::format_context_for_prompt, ContextBuilder, Source};
use crate::config::{Prompts, RagSettings};
use crate::error::Result;
use crate::llm::{ChatMessage, LanguageModel};
use crate::youtube::VideoMetadata;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const NO_CONTEXT_ANSWER: &str = "The answer to this question cannot be found in the provided context.";

/// RAG engine for question answering over one video.
pub struct RagEngine {
    llm: Arc<dyn LanguageModel>,
    context_builder: ContextBuilder,
    prompts: Arc<Prompts>,
    settings: RagSettings,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        context_builder: ContextBuilder,
        prompts: Arc<Prompts>,
        settings: RagSettings,
    ) -> Self {
        Self {
            llm,
            context_builder: context_builder.with_search_k(settings.search_k),
            prompts,
            settings,
        }
    }

    /// Answer a question about a video.
    ///
    /// `history` holds earlier turns of the conversation, oldest first.
    /// With `use_external_sources` the model may go beyond the transcript.
    #[instrument(skip(self, video, history), fields(video_id = %video.video_id, external = use_external_sources))]
    pub async fn answer(
        &self,
        video: &VideoMetadata,
        question: &str,
        history: &[ChatMessage],
        use_external_sources: bool,
    ) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let results = self.context_builder.retrieve(&video.video_id, question).await?;
        let sources: Vec<Source> = results
            .iter()
            .take(self.settings.max_sources)
            .map(|r| Source::from_result(r, self.settings.snippet_chars))
            .collect();

        if results.is_empty() && !use_external_sources {
            return Ok(RagResponse {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources,
            });
        }

        let context_len = self.settings.context_chunks.min(results.len());
        let context_text = format_context_for_prompt(&results[..context_len]);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context_text);
        vars.insert("title".to_string(), video.title.clone());

        let template = if use_external_sources {
            &self.prompts.chat.external
        } else {
            &self.prompts.chat.grounded
        };
        let user_prompt = self.prompts.render_with_custom(template, &vars);
        let system_prompt = self.prompts.render_with_custom(&self.prompts.chat.system, &vars);

        let keep = history.len().min(self.settings.history_turns * 2);
        let history = &history[history.len() - keep..];

        let answer = self
            .llm
            .complete(Some(&system_prompt), history, &user_prompt)
            .await?;

        debug!("Generated response with {} sources", sources.len());

        Ok(RagResponse { answer, sources })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Leading retrieved chunks.
    pub sources: Vec<Source>,
}
