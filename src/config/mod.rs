//! Configuration module for ytassist.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnalysisPrompts, ChatPrompts, Prompts, ReportPrompts, SummaryPrompts};
pub use settings::{
    AnalysisSettings, CacheSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings,
    LlmSettings, PromptSettings, RagSettings, ServerSettings, Settings, TranscriptSettings,
};
