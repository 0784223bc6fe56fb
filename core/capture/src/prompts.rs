use crate::llm::PromptRequest;
use crate::normalize::truncate_chars;

/// Excerpt budget for the classification prompt
pub const INTENT_EXCERPT_CHARS: usize = 1_200;

const SUMMARY_MAX_TOKENS: u32 = 250;
const SUMMARY_TEMPERATURE: f32 = 0.15;
const INTENT_MAX_TOKENS: u32 = 250;
const INTENT_TEMPERATURE: f32 = 0.2;

pub fn summary_prompt(text: &str, word_count: usize, target_sentences: usize) -> PromptRequest {
    let prompt = format!(
        r#"Summarize the web page below in exactly {target} short sentences.
Say what the page is and why someone would keep it.

Rules:
- Reply with a JSON array of strings only, e.g. ["First sentence.", "Second sentence."]
- Keep each sentence under 20 words
- Do not open with filler such as "This page" or "The author"

Page content ({words} words):
"""
{text}
"""

JSON array of {target} sentences:"#,
        target = target_sentences,
        words = word_count,
        text = text,
    );

    PromptRequest {
        prompt,
        max_output_tokens: SUMMARY_MAX_TOKENS,
        temperature: SUMMARY_TEMPERATURE,
    }
}

pub fn intent_prompt(title: &str, excerpt: &str) -> PromptRequest {
    let prompt = format!(
        r#"Work out why a user opened this web page.

Reply with one JSON object and nothing else:
{{
  "intent": "specific action-oriented intent, e.g. \"Research laptop purchase\"",
  "tags": ["2-4 short lowercase keywords"],
  "next_action": "one concrete next step, e.g. \"Compare prices\""
}}

Prefer specific intents ("Follow React Hooks tutorial") over generic ones ("Read this page").

Title: {title}
Excerpt: {excerpt}

JSON object:"#,
        title = title,
        excerpt = truncate_chars(excerpt, INTENT_EXCERPT_CHARS),
    );

    PromptRequest {
        prompt,
        max_output_tokens: INTENT_MAX_TOKENS,
        temperature: INTENT_TEMPERATURE,
    }
}
