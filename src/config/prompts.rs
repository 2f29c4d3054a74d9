//! Prompt templates for ytassist.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory:
//! `summary.toml`, `analysis.toml`, `chat.toml` and `reports.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub analysis: AnalysisPrompts,
    pub chat: ChatPrompts,
    pub reports: ReportPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// One template per summary variant. `{{transcript}}` is substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub comprehensive: String,
    pub executive: String,
    pub bullet_points: String,
    pub key_topics: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            comprehensive: r#"Summarize the key points and main ideas of this YouTube video transcript. Be comprehensive and stick to facts stated in the transcript.

Transcript:
{{transcript}}

Cover the following:

* **Main Topic:** the central subject of the video.
* **Key Arguments/Points:** the core arguments or points, with enough detail for each.
* **Supporting Evidence/Examples:** evidence, examples or data used to back them up.
* **Important Details/Nuances:** exceptions, qualifications or details needed for a full understanding.
* **Overall Conclusion/Takeaway:** the main message of the video.

Rules:
* Use only information from the transcript. Do not speculate or add outside knowledge.
* Prefer completeness over brevity.
* Organize the summary logically and use clear language."#
                .to_string(),

            executive: r#"Write an executive summary of this YouTube video transcript for a busy professional.

Transcript:
{{transcript}}

Include:
* **Executive Overview:** the main topic in 2-3 sentences
* **Key Insights:** the 3-5 most important points or findings
* **Business Implications:** practical or business applications, if any
* **Action Items:** what the viewer should do with this information

Stay under 300 words and focus on actionable insight."#
                .to_string(),

            bullet_points: r#"Summarize this YouTube video transcript as bullet points.

Transcript:
{{transcript}}

Use this layout:

**Main Topic:**
• short description

**Key Points:**
• one bullet per point

**Important Details:**
• one bullet per detail

**Conclusion:**
• the main takeaway

Keep each bullet short and factual."#
                .to_string(),

            key_topics: r#"Organize the content of this YouTube video transcript by topic.

Transcript:
{{transcript}}

For each main topic use:

**Topic N: Topic Name**
- key points discussed
- important details

Finish with:

**Cross-cutting Themes:**
- themes that appear across several topics"#
                .to_string(),
        }
    }
}

/// Prompts for topics, sentiment and suggested questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPrompts {
    pub topics: String,
    pub sentiment: String,
    pub questions: String,
}

impl Default for AnalysisPrompts {
    fn default() -> Self {
        Self {
            topics: r#"Extract the {{num_topics}} most important topics or themes from this YouTube video transcript.

Transcript:
{{transcript}}

For each topic give a concise name (2-4 words) and a 1-2 sentence description, formatted exactly as:

**Topic 1: Topic Name**
Brief description

**Topic 2: Topic Name**
Brief description"#
                .to_string(),

            sentiment: r#"Analyze the sentiment and tone of this YouTube video transcript.

Transcript:
{{transcript}}

Report on:

**Overall Sentiment:**
- Positive, Negative, or Neutral
- Confidence level (High/Medium/Low)

**Emotional Tone:**
- the general tone (enthusiastic, serious, conversational, educational, ...)

**Speaker Attitude:**
- how the speaker seems to feel about the topic

**Content Mood:**
- uplifting, concerning, informative, entertaining, ...

**Key Emotional Indicators:**
- words or phrases that signal the sentiment

Stay objective and rely only on the transcript."#
                .to_string(),

            questions: r#"Based on this YouTube video transcript, write {{num_questions}} questions a viewer might want to ask about the content.

Transcript:
{{transcript}}

The questions should cover different aspects of the video, range from basic understanding to deeper analysis, and be specific to this content.

Answer with a numbered list only:
1. First question
2. Second question"#
                .to_string(),
        }
    }
}

/// Prompts for chatting with a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    pub system: String,
    /// Answer strictly from the retrieved context.
    pub grounded: String,
    /// Answer from general knowledge, integrating the retrieved context.
    pub external: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a friendly assistant that helps people understand a YouTube video titled "{{title}}".
Explain things simply enough for a non-technical audience and remember earlier questions in the conversation."#
                .to_string(),

            grounded: r#"**Question:** {{question}}

**Context from the video:**
{{context}}

Instructions:
1. Answer completely, using every relevant part of the context.
2. Explain in simple terms. Use examples or analogies where they help.
3. Keep a friendly, conversational tone.
4. Use only the context above. If it does not contain the answer, reply: "The answer to this question cannot be found in the provided context."
5. Structure the answer with headings or lists when that makes it easier to follow.

**Answer:**"#
                .to_string(),

            external: r#"**Question:** {{question}}

**Context from the video:**
{{context}}

Instructions:
1. Answer comprehensively from your general knowledge, going beyond the context where useful.
2. Integrate the relevant parts of the context and say how they relate to the broader topic.
3. Explain in simple terms with a friendly, conversational tone.
4. Acknowledge the context explicitly, e.g. "While the video mentions ..., it's also worth noting ...".
5. If the context is unrelated to the question, mention that briefly and answer anyway.

**Answer:**"#
                .to_string(),
        }
    }
}

/// Prompts for multi-video reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPrompts {
    pub comparison: String,
    pub trends: String,
    pub insights: String,
}

impl Default for ReportPrompts {
    fn default() -> Self {
        Self {
            comparison: r#"You are an expert content analyst. Compare the following {{video_count}} YouTube videos on these aspects: {{aspects}}.

Analysis depth: {{depth}}

{{videos}}

Cover content, approach and style, sentiment, depth and quality, target audience, unique insights, how the videos complement each other, and which video suits which viewer.

Format the answer with these sections:
- **Overview Summary**
- **Content Comparison**
- **Approach & Style Analysis**
- **Sentiment Analysis**
- **Quality Assessment**
- **Audience Targeting**
- **Unique Value Propositions**
- **Complementary Insights**
- **Recommendations**"#
                .to_string(),

            trends: r#"You are an expert trend analyst. Analyze trends across these {{video_count}} YouTube videos.

- Time period: {{time_period}}
- Aspects: {{aspects}}
- Grouping: {{grouping}}

{{groups}}

Cover topic evolution, sentiment patterns, content depth, presentation and engagement patterns, emerging and declining themes, consistency versus innovation, audience adaptation, and likely next developments.

Format the answer with these sections:
- **Trend Overview**
- **Topic Evolution Analysis**
- **Sentiment Trend Patterns**
- **Content Quality Trends**
- **Engagement & Presentation Trends**
- **Emerging vs Declining Themes**
- **Consistency & Innovation Balance**
- **Audience & Market Adaptation**
- **Future Trend Predictions**
- **Key Insights & Recommendations**"#
                .to_string(),

            insights: r#"Based on this trend analysis of {{video_count}} videos, list 5-10 actionable insights for content creators, marketers, researchers and business strategists.

Trend analysis:
{{analysis}}

Insights must be specific, grounded in the observed patterns, useful for decisions and forward-looking where possible.

Answer with a numbered list, one insight per line with a short explanation."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let analysis_path = custom_path.join("analysis.toml");
            if analysis_path.exists() {
                let content = std::fs::read_to_string(&analysis_path)?;
                prompts.analysis = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }

            let reports_path = custom_path.join("reports.toml");
            if reports_path.exists() {
                let content = std::fs::read_to_string(&reports_path)?;
                prompts.reports = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts_have_placeholders() {
        let prompts = Prompts::default();
        assert!(prompts.summary.comprehensive.contains("{{transcript}}"));
        assert!(prompts.analysis.questions.contains("{{num_questions}}"));
        assert!(prompts.chat.grounded.contains("{{context}}"));
        assert!(prompts.reports.trends.contains("{{groups}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("audience".to_string(), "students".to_string());
        prompts.variables.insert("question".to_string(), "ignored".to_string());

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "why?".to_string());

        let out = prompts.render_with_custom("{{question}} for {{audience}}", &vars);
        assert_eq!(out, "why? for students");
    }

    #[test]
    fn test_custom_dir_overrides_one_section() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("chat.toml"),
            "grounded = \"Q: {{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.chat.grounded, "Q: {{question}}");
        // Fields missing from the file fall back to defaults.
        assert!(!prompts.chat.external.is_empty());
        assert!(prompts.summary.executive.contains("300 words"));
    }
}
