//! Error types for ytassist.

use thiserror::Error;

/// Library-level error type for ytassist operations.
#[derive(Error, Debug)]
pub enum AssistError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Transcript unavailable: {0}")]
    Transcript(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AssistError {
    /// Whether the failure came from a hosted service rather than the caller or this process.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AssistError::Transcript(_)
                | AssistError::Embedding(_)
                | AssistError::Llm(_)
                | AssistError::OpenAI(_)
                | AssistError::Http(_)
        )
    }
}

/// Result type alias for ytassist operations.
pub type Result<T> = std::result::Result<T, AssistError>;
