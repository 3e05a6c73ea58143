use std::fmt;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use log::{error, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Result;

pub const MAX_SUMMARY_LEN: usize = 80;

const MAX_SUMMARY_INPUT: usize = 1024;
const MAX_CLASSIFY_BODY: usize = 500;

pub const PRIORITY_LABELS: [&str; 3] = [
    "urgent high priority",
    "normal medium priority",
    "low priority not urgent",
];

const HIGH_PRIORITY_KEYWORDS: [&str; 10] = [
    "urgent",
    "asap",
    "immediately",
    "critical",
    "emergency",
    "important",
    "action required",
    "deadline",
    "alert",
    "warning",
];

const LOW_PRIORITY_KEYWORDS: [&str; 7] = [
    "fyi",
    "for your information",
    "newsletter",
    "update",
    "notification",
    "no action needed",
    "optional",
];

const KEY_PHRASE_INDICATORS: [&str; 10] = [
    "urgent:",
    "important:",
    "please",
    "required",
    "deadline",
    "meeting",
    "update",
    "notification",
    "alert",
    "reminder",
];

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::Low => write!(f, "LOW"),
        }
    }
}

/// Hosted summarization and zero-shot classification models.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn summarize(&self, content: &str, max_length: usize) -> Result<String>;

    /// Returns the best matching label.
    async fn classify(&self, content: &str, labels: &[&str]) -> Result<String>;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Triaged {
    pub summary: String,
    pub priority: Priority,
}

pub struct Triage {
    classifier: Option<Arc<dyn Classifier>>,
    enabled: bool,
    max_summary_len: usize,
}

impl Triage {
    pub fn new(classifier: Option<Arc<dyn Classifier>>, enabled: bool) -> Self {
        Self {
            classifier,
            enabled,
            max_summary_len: MAX_SUMMARY_LEN,
        }
    }

    pub fn with_max_summary_len(mut self, max_summary_len: usize) -> Self {
        self.max_summary_len = max_summary_len;
        self
    }

    pub async fn process(&self, subject: &str, body: &str) -> Triaged {
        info!("triaging email: {subject}");

        let content = format!("Subject: {subject}\n\n{body}");
        let summary = self.summarize(&content).await;
        let priority = self.classify(subject, body).await;

        Triaged { summary, priority }
    }

    pub async fn summarize(&self, content: &str) -> String {
        let classifier = match (&self.classifier, self.enabled) {
            (Some(classifier), true) => classifier,
            _ => return fallback_summary(content, self.max_summary_len),
        };

        let cleaned = clean_content(content);
        let input: String = cleaned.chars().take(MAX_SUMMARY_INPUT).collect();

        match classifier.summarize(&input, self.max_summary_len).await {
            Ok(summary) if !summary.trim().is_empty() => {
                ensure_max_length(&summary, self.max_summary_len)
            }
            Ok(_) => {
                warn!("empty summary from classifier, using fallback");
                fallback_summary(content, self.max_summary_len)
            }
            Err(err) => {
                error!("unable to summarize: {err}");
                fallback_summary(content, self.max_summary_len)
            }
        }
    }

    pub async fn classify(&self, subject: &str, body: &str) -> Priority {
        if !self.enabled {
            return Priority::Medium;
        }

        let Some(classifier) = &self.classifier else {
            return priority_by_keywords(subject, body);
        };

        let content = format!(
            "Subject: {subject}\n{}",
            truncate_text(body, MAX_CLASSIFY_BODY)
        );

        match classifier.classify(&content, &PRIORITY_LABELS).await {
            Ok(label) => map_priority_label(&label),
            Err(err) => {
                error!("unable to classify priority: {err}");
                priority_by_keywords(subject, body)
            }
        }
    }
}

pub fn map_priority_label(label: &str) -> Priority {
    let label = label.to_lowercase();

    if (label.contains("urgent") && !label.contains("not urgent")) || label.contains("high") {
        Priority::High
    } else if label.contains("low") || label.contains("not urgent") {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// High keywords win over low ones.
pub fn priority_by_keywords(subject: &str, body: &str) -> Priority {
    let combined = format!("{subject} {body}").to_lowercase();

    if HIGH_PRIORITY_KEYWORDS
        .iter()
        .any(|keyword| combined.contains(keyword))
    {
        Priority::High
    } else if LOW_PRIORITY_KEYWORDS
        .iter()
        .any(|keyword| combined.contains(keyword))
    {
        Priority::Low
    } else {
        Priority::Medium
    }
}

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag pattern compiles"));

/// Strips HTML tags and collapses whitespace.
pub fn clean_content(content: &str) -> String {
    HTML_TAG
        .replace_all(content, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hard cut with a trailing ellipsis.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_length.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

/// Cuts at the last space if it is not too far back, otherwise at
/// `max_length` characters.
pub fn ensure_max_length(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    // the space may sit exactly at `max_length`
    let window_end = byte_offset(text, max_length + 1);
    let hard_cut = byte_offset(text, max_length);

    if let Some(space) = text[..window_end].rfind(' ') {
        let position = text[..space].chars().count();

        if position as f64 > max_length as f64 * 0.7 {
            return text[..space].trim().to_string();
        }
    }

    text[..hard_cut].trim().to_string()
}

pub fn fallback_summary(content: &str, max_length: usize) -> String {
    let cleaned = clean_content(content);

    if cleaned.is_empty() {
        return "No content available".to_string();
    }

    if cleaned.chars().count() <= max_length {
        return cleaned;
    }

    for sentence in split_sentences(&cleaned) {
        let sentence = sentence.trim();

        if sentence.chars().count() > 15 && !is_greeting(sentence) {
            return ensure_max_length(sentence, max_length);
        }
    }

    if let Some(phrase) = key_phrase(&cleaned, max_length) {
        return phrase;
    }

    let length = cleaned.chars().count();
    if length > max_length * 2 {
        let start = byte_offset(&cleaned, (length / 4).min(100));
        return ensure_max_length(&cleaned[start..], max_length);
    }

    ensure_max_length(&cleaned, max_length)
}

fn key_phrase(content: &str, max_length: usize) -> Option<String> {
    let lower = content.to_ascii_lowercase();

    for indicator in KEY_PHRASE_INDICATORS {
        if let Some(position) = lower.find(indicator) {
            let phrase = split_sentences(&content[position..])
                .next()
                .unwrap_or_default()
                .trim();

            if phrase.chars().count() <= max_length {
                return Some(phrase.to_string());
            }
        }
    }

    None
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?']).filter(|part| !part.is_empty())
}

fn is_greeting(text: &str) -> bool {
    let lower = text.to_lowercase();

    lower.starts_with("hi ")
        || lower.starts_with("hello")
        || lower.starts_with("dear ")
        || lower.starts_with("hey")
        || lower == "hi"
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}
