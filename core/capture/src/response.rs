use serde_json::{Map, Value};
use snapmark_schemas::{split_sentences, IntentResult};
use tracing::debug;

use crate::segmenter::{accept_sentence, SentenceBounds};

/// Most sentences kept from a model summary
pub const MODEL_SENTENCE_CAP: usize = 4;
/// Fewest valid sentences for a model summary to be accepted
pub const MIN_MODEL_SENTENCES: usize = 2;
/// Raw replies this short are not split into sentences
const MIN_RAW_TEXT_CHARS: usize = 30;
const MAX_TAGS: usize = 4;

pub const DEFAULT_MODEL_INTENT: &str = "Review this page";
pub const DEFAULT_MODEL_NEXT_ACTION: &str = "Read later";
pub const DEFAULT_MODEL_TAG: &str = "general";

/// One interpretation of a model reply
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    StructuredArray(Vec<Value>),
    StructuredObject(Map<String, Value>),
    RawText(String),
}

impl ModelResponse {
    /// Interpretations of a reply expected to hold a JSON array, most structured first:
    /// the whole reply, then the first `[...]` span, then the plain text.
    pub fn array_cascade(raw: &str) -> Vec<ModelResponse> {
        let mut cascade = Vec::new();

        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
            cascade.push(ModelResponse::StructuredArray(items));
        }
        if let Some(Value::Array(items)) = first_span(raw, '[', ']').and_then(parse_json) {
            cascade.push(ModelResponse::StructuredArray(items));
        }
        cascade.push(ModelResponse::RawText(raw.to_string()));

        cascade
    }

    /// Interpretations of a reply expected to hold a JSON object:
    /// the whole reply, then the first `{...}` span.
    pub fn object_cascade(raw: &str) -> Vec<ModelResponse> {
        let mut cascade = Vec::new();

        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
            cascade.push(ModelResponse::StructuredObject(map));
        }
        if let Some(Value::Object(map)) = first_span(raw, '{', '}').and_then(parse_json) {
            cascade.push(ModelResponse::StructuredObject(map));
        }

        cascade
    }

    /// Valid summary sentences carried by this interpretation
    pub fn sentences(&self, bounds: SentenceBounds, cap: usize) -> Vec<String> {
        let candidates: Vec<String> = match self {
            ModelResponse::StructuredArray(items) => items.iter().map(value_text).collect(),
            ModelResponse::RawText(text) if text.chars().count() > MIN_RAW_TEXT_CHARS => {
                split_sentences(text)
            }
            _ => Vec::new(),
        };

        candidates
            .iter()
            .filter_map(|c| accept_sentence(c, bounds))
            .take(cap)
            .collect()
    }

    /// Intent fields carried by this interpretation, if any is usable
    pub fn intent(&self) -> Option<IntentResult> {
        let ModelResponse::StructuredObject(map) = self else {
            return None;
        };

        let intent = non_empty_str(map.get("intent"));
        let next_action = non_empty_str(map.get("next_action"));
        let tags = clean_tags(map.get("tags"));

        if intent.is_none() && next_action.is_none() && tags.is_empty() {
            return None;
        }

        Some(IntentResult {
            intent: intent.unwrap_or_else(|| DEFAULT_MODEL_INTENT.to_string()),
            tags: if tags.is_empty() {
                vec![DEFAULT_MODEL_TAG.to_string()]
            } else {
                tags
            },
            next_action: next_action.unwrap_or_else(|| DEFAULT_MODEL_NEXT_ACTION.to_string()),
        })
    }
}

/// Parse a model summary reply; `None` when no interpretation yields enough sentences
pub fn parse_summary_response(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    ModelResponse::array_cascade(raw)
        .into_iter()
        .map(|candidate| candidate.sentences(SentenceBounds::MODEL, MODEL_SENTENCE_CAP))
        .find(|sentences| sentences.len() >= MIN_MODEL_SENTENCES)
        .map(|sentences| {
            debug!("Model summary accepted with {} sentences", sentences.len());
            sentences
        })
}

/// Parse a model classification reply, defaulting missing fields
pub fn parse_intent_response(raw: &str) -> Option<IntentResult> {
    ModelResponse::object_cascade(raw.trim())
        .iter()
        .find_map(ModelResponse::intent)
}

fn parse_json(span: &str) -> Option<Value> {
    serde_json::from_str(span).ok()
}

// Shortest span from the first `open` to the next `close`
fn first_span(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let len = raw[start..].find(close)?;
    Some(&raw[start..=start + len])
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn clean_tags(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in items.iter().filter_map(Value::as_str) {
        let tag = tag.trim().trim_start_matches('#').trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.truncate(MAX_TAGS);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_reply_array() {
        let raw = r#"["Complete HTML element reference with examples", "Covers browser compatibility for every tag!"]"#;
        let sentences = parse_summary_response(raw).unwrap();
        assert_eq!(
            sentences,
            vec![
                "Complete HTML element reference with examples.",
                "Covers browser compatibility for every tag!"
            ]
        );
    }

    #[test]
    fn test_embedded_array() {
        let raw = "Sure! Here you go:\n[\"React Hooks manage state in function components.\", \"Effects synchronize components with external systems.\"]\nHope it helps.";
        let cascade = ModelResponse::array_cascade(raw);
        assert!(matches!(cascade[0], ModelResponse::StructuredArray(_)));
        assert_eq!(parse_summary_response(raw).unwrap().len(), 2);
    }

    #[test]
    fn test_raw_text_split() {
        let raw = "Build REST APIs with Axum and SQLx in Rust. Covers authentication and error handling. Includes deployment notes for production!";
        let sentences = parse_summary_response(raw).unwrap();
        assert_eq!(sentences.len(), 3);
        assert!(sentences[2].ends_with('!'));
    }

    #[test]
    fn test_short_array_falls_through_to_raw_text() {
        // The array has one valid item, the plain text split has three
        let raw = r#"Here is one: ["Only this single sentence is valid here.", "tiny"]. Then another long sentence follows right after. And a third one closes it out."#;
        let cascade = ModelResponse::array_cascade(raw);
        assert_eq!(cascade.len(), 2);
        assert_eq!(cascade[0].sentences(SentenceBounds::MODEL, MODEL_SENTENCE_CAP).len(), 1);

        let sentences = parse_summary_response(raw).unwrap();
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[1], "Then another long sentence follows right after.");
    }

    #[test]
    fn test_rejects_insufficient_output() {
        assert_eq!(parse_summary_response(""), None);
        assert_eq!(parse_summary_response("ok"), None);
        assert_eq!(parse_summary_response(r#"["Only one sentence here that passes."]"#), None);
    }

    #[test]
    fn test_caps_sentence_count() {
        let items: Vec<String> = (0..8)
            .map(|i| format!("\"Sentence number {} is long enough to count.\"", i))
            .collect();
        let raw = format!("[{}]", items.join(","));
        assert_eq!(parse_summary_response(&raw).unwrap().len(), MODEL_SENTENCE_CAP);
    }

    #[test]
    fn test_intent_whole_object() {
        let raw = r##"{"intent": "Research laptop purchase", "tags": ["Shopping", "#Laptops", "shopping"], "next_action": "Compare prices"}"##;
        let result = parse_intent_response(raw).unwrap();
        assert_eq!(result.intent, "Research laptop purchase");
        assert_eq!(result.tags, vec!["shopping", "laptops"]);
        assert_eq!(result.next_action, "Compare prices");
    }

    #[test]
    fn test_intent_embedded_object_with_defaults() {
        let raw = "Here is the JSON: {\"intent\": \"Follow Rust tutorial\"} done";
        let result = parse_intent_response(raw).unwrap();
        assert_eq!(result.intent, "Follow Rust tutorial");
        assert_eq!(result.tags, vec![DEFAULT_MODEL_TAG]);
        assert_eq!(result.next_action, DEFAULT_MODEL_NEXT_ACTION);
    }

    #[test]
    fn test_intent_rejects_unusable() {
        assert_eq!(parse_intent_response("no json at all"), None);
        assert_eq!(parse_intent_response(r#"{"mood": "happy"}"#), None);
        assert_eq!(parse_intent_response(r#"{"intent": "   ", "tags": []}"#), None);
        assert_eq!(parse_intent_response(r#"["not", "an", "object"]"#), None);
    }

    #[test]
    fn test_first_span() {
        assert_eq!(first_span("a [1, 2] b [3]", '[', ']'), Some("[1, 2]"));
        assert_eq!(first_span("no brackets", '[', ']'), None);
        assert_eq!(first_span("] [ unclosed", '[', ']'), None);
    }
}
