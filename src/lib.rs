//! ytassist - YouTube video assistant
//!
//! Fetches YouTube transcripts, summarizes and analyzes them with a hosted
//! language model, and answers questions about a video with retrieval over
//! its transcript chunks.
//!
//! # Overview
//!
//! ytassist allows you to:
//! - Summarize a video in several styles (comprehensive, executive, bullet points, key topics)
//! - Extract topics, sentiment and suggested questions
//! - Chat about a video with answers grounded in timestamped transcript chunks
//! - Compare several videos or look for trends across them
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `youtube` - Video ID parsing, metadata and transcript retrieval
//! - `chunking` - Transcript chunking with timestamps
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory vector index
//! - `llm` - Chat-completion abstraction
//! - `analysis` - Summaries, topics, sentiment and questions
//! - `rag` - Retrieval and grounded answers
//! - `jobs`, `cache`, `sessions`, `reports` - Process-local state
//! - `assistant` - Pipeline coordination
//! - `server` - REST API and web page
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ytassist::assistant::{AnalyzeRequest, Assistant};
//! use ytassist::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let assistant = Arc::new(Assistant::from_settings(settings)?);
//!
//!     let request = AnalyzeRequest::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
//!     let analysis = assistant.analyze_now("dQw4w9WgXcQ", &request.options()).await?;
//!     println!("Indexed {} chunks", analysis.chunk_count);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod assistant;
pub mod cache;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod jobs;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod reports;
pub mod server;
pub mod sessions;
pub mod vector_store;
pub mod youtube;

pub use error::{AssistError, Result};
