//! Transcript analysis: summaries, topics, sentiment and suggested questions.
//!
//! Every analysis is a single prompt sent to the language model. This module
//! builds the prompts and parses the replies into structured values.

mod parse;

pub use parse::{fold_newlines, key_points, parse_list_items, parse_sentiment, parse_topics};

use crate::chunking::{join_chunks, ContentChunk};
use crate::config::{AnalysisSettings, Prompts};
use crate::error::{AssistError, Result};
use crate::llm::LanguageModel;
use futures::future::{try_join_all, OptionFuture};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Summary variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    #[default]
    Comprehensive,
    Executive,
    BulletPoints,
    KeyTopics,
}

impl SummaryType {
    pub const ALL: [SummaryType; 4] = [
        SummaryType::Comprehensive,
        SummaryType::Executive,
        SummaryType::BulletPoints,
        SummaryType::KeyTopics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryType::Comprehensive => "comprehensive",
            SummaryType::Executive => "executive",
            SummaryType::BulletPoints => "bullet_points",
            SummaryType::KeyTopics => "key_topics",
        }
    }

    /// Prose variants are returned as a single paragraph.
    fn folds_newlines(&self) -> bool {
        matches!(self, SummaryType::Comprehensive | SummaryType::Executive)
    }

    fn template<'a>(&self, prompts: &'a Prompts) -> &'a str {
        match self {
            SummaryType::Comprehensive => &prompts.summary.comprehensive,
            SummaryType::Executive => &prompts.summary.executive,
            SummaryType::BulletPoints => &prompts.summary.bullet_points,
            SummaryType::KeyTopics => &prompts.summary.key_topics,
        }
    }
}

impl fmt::Display for SummaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SummaryType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim().to_lowercase().replace('-', "_"))
            .ok_or_else(|| {
                format!(
                    "unknown summary type '{}' (expected comprehensive, executive, bullet_points or key_topics)",
                    s
                )
            })
    }
}

/// A key topic of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub description: String,
}

/// Overall sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

/// Sentiment analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// High, Medium or Low when the model states one.
    pub confidence: Option<String>,
    /// Full model output.
    pub analysis: String,
}

/// Which analyses to run for a video.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Summary variants to generate. Empty means comprehensive only.
    pub summary_types: Vec<SummaryType>,
    pub include_sentiment: bool,
    pub include_topics: bool,
    pub include_questions: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            summary_types: vec![SummaryType::Comprehensive],
            include_sentiment: false,
            include_topics: true,
            include_questions: true,
        }
    }
}

/// Output of a full analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutput {
    pub summaries: BTreeMap<SummaryType, String>,
    pub sentiment: Option<Sentiment>,
    pub topics: Vec<Topic>,
    pub suggested_questions: Vec<String>,
}

/// Runs analysis prompts against a language model.
pub struct Analyzer {
    llm: Arc<dyn LanguageModel>,
    prompts: Arc<Prompts>,
    settings: AnalysisSettings,
}

impl Analyzer {
    pub fn new(llm: Arc<dyn LanguageModel>, prompts: Arc<Prompts>, settings: AnalysisSettings) -> Self {
        Self {
            llm,
            prompts,
            settings,
        }
    }

    async fn generate(&self, what: &str, template: &str, vars: HashMap<String, String>) -> Result<String> {
        let prompt = self.prompts.render_with_custom(template, &vars);
        self.llm
            .complete(None, &[], &prompt)
            .await
            .map_err(|e| match e {
                AssistError::Llm(msg) => AssistError::Llm(format!("Failed to generate {}: {}", what, msg)),
                other => other,
            })
    }

    /// Summarize a full transcript.
    #[instrument(skip(self, transcript), fields(summary_type = %summary_type))]
    pub async fn summarize(&self, transcript: &str, summary_type: SummaryType) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());

        let summary = self
            .generate("summary", summary_type.template(&self.prompts), vars)
            .await?;

        Ok(if summary_type.folds_newlines() {
            fold_newlines(&summary)
        } else {
            summary
        })
    }

    /// Extract key topics from the full transcript.
    #[instrument(skip(self, transcript))]
    pub async fn topics(&self, transcript: &str) -> Result<Vec<Topic>> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        vars.insert("num_topics".to_string(), self.settings.num_topics.to_string());

        let text = self
            .generate("topics", &self.prompts.analysis.topics, vars)
            .await?;
        let topics = parse_topics(&text, self.settings.num_topics);
        debug!("Parsed {} topics", topics.len());
        Ok(topics)
    }

    /// Analyze sentiment from the leading chunks.
    #[instrument(skip(self, chunks))]
    pub async fn sentiment(&self, chunks: &[ContentChunk]) -> Result<Sentiment> {
        let mut vars = HashMap::new();
        vars.insert(
            "transcript".to_string(),
            join_chunks(chunks, Some(self.settings.sentiment_chunks)),
        );

        let text = self
            .generate("sentiment", &self.prompts.analysis.sentiment, vars)
            .await?;
        Ok(parse_sentiment(&text))
    }

    /// Suggest follow-up questions from the leading chunks.
    #[instrument(skip(self, chunks))]
    pub async fn questions(&self, chunks: &[ContentChunk]) -> Result<Vec<String>> {
        let mut vars = HashMap::new();
        vars.insert(
            "transcript".to_string(),
            join_chunks(chunks, Some(self.settings.question_chunks)),
        );
        vars.insert(
            "num_questions".to_string(),
            self.settings.num_questions.to_string(),
        );

        let text = self
            .generate("questions", &self.prompts.analysis.questions, vars)
            .await?;
        Ok(parse_list_items(&text, self.settings.num_questions))
    }

    /// Run every requested analysis concurrently.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn run(
        &self,
        transcript: &str,
        chunks: &[ContentChunk],
        options: &AnalysisOptions,
    ) -> Result<AnalysisOutput> {
        let mut summary_types = options.summary_types.clone();
        if summary_types.is_empty() {
            summary_types.push(SummaryType::Comprehensive);
        }
        summary_types.sort();
        summary_types.dedup();

        let summaries = try_join_all(summary_types.iter().map(|t| async move {
            self.summarize(transcript, *t).await.map(|s| (*t, s))
        }));
        let topics: OptionFuture<_> = options.include_topics.then(|| self.topics(transcript)).into();
        let sentiment: OptionFuture<_> = options.include_sentiment.then(|| self.sentiment(chunks)).into();
        let questions: OptionFuture<_> = options.include_questions.then(|| self.questions(chunks)).into();

        let (summaries, topics, sentiment, questions) = futures::join!(summaries, topics, sentiment, questions);

        Ok(AnalysisOutput {
            summaries: summaries?.into_iter().collect(),
            topics: topics.transpose()?.unwrap_or_default(),
            sentiment: sentiment.transpose()?,
            suggested_questions: questions.transpose()?.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies based on which prompt it receives and records every prompt.
    struct ScriptedModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, _system: Option<&str>, _history: &[ChatMessage], prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = if prompt.contains("most important topics") {
                "**Topic 1: Rust Ownership**\nWho frees memory.\n\n**Topic 2: Borrowing**\nReferences without moves."
            } else if prompt.contains("sentiment") {
                "**Overall Sentiment:**\n- Positive\n- Confidence level: High"
            } else if prompt.contains("questions a viewer") {
                "1. What is ownership?\n2. Why borrow?\n3. What is a lifetime?"
            } else if prompt.contains("executive summary") {
                "**Executive Overview:**\nShort.\nVery short."
            } else {
                "Line one.\nLine two."
            };
            Ok(reply.to_string())
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn analyzer() -> (Arc<ScriptedModel>, Analyzer) {
        let model = Arc::new(ScriptedModel {
            prompts: Mutex::new(Vec::new()),
        });
        let analyzer = Analyzer::new(model.clone(), Arc::new(Prompts::default()), AnalysisSettings::default());
        (model, analyzer)
    }

    fn chunks(n: usize) -> Vec<ContentChunk> {
        (0..n)
            .map(|i| ContentChunk::new(format!("chunk{}", i), i as f64, i as f64 + 1.0, i as i32))
            .collect()
    }

    #[test]
    fn test_summary_type_parsing() {
        assert_eq!("bullet_points".parse::<SummaryType>().unwrap(), SummaryType::BulletPoints);
        assert_eq!("Key-Topics".parse::<SummaryType>().unwrap(), SummaryType::KeyTopics);
        assert!("haiku".parse::<SummaryType>().is_err());
        assert_eq!(SummaryType::default(), SummaryType::Comprehensive);
        assert_eq!(
            serde_json::to_string(&SummaryType::BulletPoints).unwrap(),
            "\"bullet_points\""
        );
    }

    #[tokio::test]
    async fn test_prose_summaries_fold_newlines() {
        let (_, analyzer) = analyzer();
        let summary = analyzer.summarize("text", SummaryType::Comprehensive).await.unwrap();
        assert_eq!(summary, "Line one. Line two.");

        let bullets = analyzer.summarize("text", SummaryType::BulletPoints).await.unwrap();
        assert_eq!(bullets, "Line one.\nLine two.");
    }

    #[tokio::test]
    async fn test_questions_use_leading_chunks() {
        let (model, analyzer) = analyzer();
        let questions = analyzer.questions(&chunks(6)).await.unwrap();
        assert_eq!(questions, vec!["What is ownership?", "Why borrow?", "What is a lifetime?"]);

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("chunk0 chunk1 chunk2"));
        assert!(!prompts[0].contains("chunk3"));
    }

    #[tokio::test]
    async fn test_run_respects_options() {
        let (model, analyzer) = analyzer();
        let options = AnalysisOptions {
            summary_types: vec![SummaryType::Executive, SummaryType::Comprehensive, SummaryType::Executive],
            include_sentiment: true,
            include_topics: true,
            include_questions: false,
        };

        let output = analyzer.run("full text", &chunks(3), &options).await.unwrap();
        assert_eq!(output.summaries.len(), 2);
        assert_eq!(output.summaries[&SummaryType::Executive], "**Executive Overview:** Short. Very short.");
        assert_eq!(output.topics.len(), 2);
        assert_eq!(output.topics[0].name, "Rust Ownership");
        assert_eq!(output.sentiment.unwrap().label, SentimentLabel::Positive);
        assert!(output.suggested_questions.is_empty());
        assert_eq!(model.prompts.lock().unwrap().len(), 4);
    }
}
