//! CLI module for ytassist.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// ytassist - YouTube video assistant
///
/// Summarizes YouTube transcripts with a hosted LLM and answers questions
/// about them over a REST API and web page.
#[derive(Parser, Debug)]
#[command(name = "ytassist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "YTASSIST_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server and web page
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long, env = "YTASSIST_HOST")]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long, env = "YTASSIST_PORT")]
        port: Option<u16>,

        /// Serve only the API, without the web page
        #[arg(long)]
        no_ui: bool,
    },

    /// Analyze one video in the foreground and print the result
    Analyze {
        /// YouTube URL or video ID
        url: String,

        /// Summary variant (comprehensive, executive, bullet_points, key_topics)
        #[arg(short, long, default_value = "comprehensive")]
        summary_type: String,

        /// Include sentiment analysis
        #[arg(long)]
        sentiment: bool,

        /// Skip topic extraction
        #[arg(long)]
        no_topics: bool,

        /// Skip suggested questions
        #[arg(long)]
        no_questions: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}
