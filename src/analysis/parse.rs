//! Parsing of free-form model output.

use super::{Sentiment, SentimentLabel, Topic};
use regex::Regex;
use std::sync::OnceLock;

fn topic_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\*\*\s*topic\s*\d+\s*[:.\-]\s*(.+?)\s*:?\s*\*\*:?$").expect("static regex")
    })
}

fn list_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d+[.)]?\s*|[•\-*]\s*)").expect("static regex"))
}

fn confidence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(high|medium|low)\b").expect("static regex"))
}

/// Collapse line breaks into single spaces.
pub fn fold_newlines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a summary on its bold markers into display fragments.
pub fn key_points(summary: &str) -> Vec<String> {
    summary
        .split("**")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse numbered or bulleted lines, stripping the markers.
pub fn parse_list_items(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            line.chars().next().is_some_and(|c| c.is_ascii_digit())
                || line.starts_with('•')
                || line.starts_with('-')
        })
        .map(|line| list_marker_regex().replace(line, "").trim().to_string())
        .filter(|item| !item.is_empty())
        .take(max)
        .collect()
}

/// Parse `**Topic N: Name**` blocks, falling back to a plain list.
pub fn parse_topics(text: &str, max: usize) -> Vec<Topic> {
    let mut topics: Vec<Topic> = Vec::new();
    let mut description: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if let Some(caps) = topic_header_regex().captures(line) {
            if let Some(last) = topics.last_mut() {
                last.description = description.join(" ");
            }
            description.clear();
            topics.push(Topic {
                name: caps[1].trim_matches(|c| c == '[' || c == ']').trim().to_string(),
                description: String::new(),
            });
        } else if line.starts_with("**") {
            // A different bold section ends the current topic.
            if let Some(last) = topics.last_mut() {
                if last.description.is_empty() {
                    last.description = description.join(" ");
                }
            }
            description.clear();
        } else if !line.is_empty() && !topics.is_empty() {
            description.push(line);
        }
    }
    if let Some(last) = topics.last_mut() {
        if last.description.is_empty() {
            last.description = description.join(" ");
        }
    }

    if topics.is_empty() {
        topics = parse_list_items(text, max)
            .into_iter()
            .map(|item| match item.split_once(':') {
                Some((name, desc)) => Topic {
                    name: name.trim_matches('*').trim().to_string(),
                    description: desc.trim().to_string(),
                },
                None => Topic {
                    name: item,
                    description: String::new(),
                },
            })
            .collect();
    }

    topics.truncate(max);
    topics
}

fn labels_in(text: &str) -> Vec<SentimentLabel> {
    let lower = text.to_lowercase();
    [
        ("positive", SentimentLabel::Positive),
        ("negative", SentimentLabel::Negative),
        ("neutral", SentimentLabel::Neutral),
    ]
    .into_iter()
    .filter(|(word, _)| lower.contains(word))
    .map(|(_, label)| label)
    .collect()
}

fn label_in(line: &str) -> Option<SentimentLabel> {
    match labels_in(line).as_slice() {
        [] => None,
        [label] => Some(*label),
        // Several labels means the choices are restated; the answer follows the last colon.
        _ => match labels_in(line.rsplit_once(':')?.1).as_slice() {
            [label] => Some(*label),
            _ => None,
        },
    }
}

/// Extract the overall label and confidence from a sentiment analysis.
pub fn parse_sentiment(text: &str) -> Sentiment {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let section = lines
        .iter()
        .position(|l| l.to_lowercase().contains("overall sentiment"))
        .unwrap_or(0);

    let label = lines[section..]
        .iter()
        .take(6)
        .chain(lines.iter())
        .find_map(|l| label_in(l))
        .unwrap_or(SentimentLabel::Unknown);

    let confidence = lines
        .iter()
        .filter(|l| l.to_lowercase().contains("confidence"))
        .find_map(|l| confidence_regex().captures(l))
        .map(|caps| {
            let word = caps[1].to_lowercase();
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => word,
            }
        });

    Sentiment {
        label,
        confidence,
        analysis: text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_items() {
        let text = "Here are some questions:\n1. What is Rust?\n2) Why async?\n- How fast is it?\n• Is it safe?\n\nThanks!";
        let items = parse_list_items(text, 10);
        assert_eq!(
            items,
            vec!["What is Rust?", "Why async?", "How fast is it?", "Is it safe?"]
        );
        assert_eq!(parse_list_items(text, 2).len(), 2);
    }

    #[test]
    fn test_parse_topics_headers() {
        let text = "**Topic 1: Memory Safety**\nOwnership rules prevent leaks.\nNo GC needed.\n\n**Topic 2: [Concurrency]**\nFearless threads.";
        let topics = parse_topics(text, 5);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].name, "Memory Safety");
        assert_eq!(topics[0].description, "Ownership rules prevent leaks. No GC needed.");
        assert_eq!(topics[1].name, "Concurrency");
        assert_eq!(topics[1].description, "Fearless threads.");
    }

    #[test]
    fn test_parse_topics_falls_back_to_list() {
        let text = "1. Cooking: how to boil pasta\n2. Sauces";
        let topics = parse_topics(text, 5);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].name, "Cooking");
        assert_eq!(topics[0].description, "how to boil pasta");
        assert_eq!(topics[1].name, "Sauces");
    }

    #[test]
    fn test_parse_sentiment() {
        let text = "**Overall Sentiment:**\n- Positive, Negative, or Neutral: Positive\n- Confidence level: high\n\n**Emotional Tone:**\nUpbeat.";
        let sentiment = parse_sentiment(text);
        assert_eq!(sentiment.label, SentimentLabel::Positive);
        assert_eq!(sentiment.confidence.as_deref(), Some("High"));

        let text = "**Overall Sentiment:** Neutral\nThe speaker is calm.";
        assert_eq!(parse_sentiment(text).label, SentimentLabel::Neutral);

        let unknown = parse_sentiment("Hard to say.");
        assert_eq!(unknown.label, SentimentLabel::Unknown);
        assert_eq!(unknown.confidence, None);
    }

    #[test]
    fn test_key_points_and_folding() {
        let summary = "**Main Topic:** Rust **Key Points:** speed, safety";
        assert_eq!(
            key_points(summary),
            vec!["Main Topic:", "Rust", "Key Points:", "speed, safety"]
        );
        assert_eq!(fold_newlines("a\n\n  b \nc"), "a b c");
    }
}
