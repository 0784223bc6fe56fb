use tracing::debug;

use crate::normalize::{normalize, MAX_TEXT_CHARS};
use crate::segmenter::{ensure_terminal, segment, SentenceBounds};

/// Returned when neither sentences nor chunks survive filtering
pub const SUMMARY_UNAVAILABLE: &str = "Content summary unavailable.";

/// Word count at which summaries grow from 3 to 4 sentences
pub const LONG_TEXT_WORDS: usize = 400;

const MIN_USABLE_SENTENCES: usize = 3;
const CHUNK_WIDTH: usize = 150;
const CHUNK_CUT_OFFSET: usize = 100;
const CHUNK_BOUNDS: SentenceBounds = SentenceBounds { min: 25, max: 180 };

/// Target sentence count for a text of `word_count` words
pub fn target_sentence_count(word_count: usize) -> usize {
    if word_count < LONG_TEXT_WORDS {
        3
    } else {
        4
    }
}

/// Deterministic summary: the first sentences of the text, or fixed-width
/// chunks when the text has too few clean sentences. Never empty.
pub fn summarize_fallback(text: &str, target_count: usize) -> Vec<String> {
    let target = target_count.max(1);
    let clean = normalize(text, MAX_TEXT_CHARS);

    let sentences: Vec<String> = segment(&clean)
        .take(target.max(MIN_USABLE_SENTENCES))
        .collect();

    if sentences.len() >= MIN_USABLE_SENTENCES {
        debug!("Fallback summary from {} sentences", sentences.len());
        return sentences.into_iter().take(target).collect();
    }

    let chunks = chunk_summary(&clean, target);
    if chunks.is_empty() {
        debug!("Fallback summary unavailable for {} chars", clean.len());
        return vec![SUMMARY_UNAVAILABLE.to_string()];
    }

    debug!("Fallback summary from {} chunks", chunks.len());
    chunks
}

fn chunk_summary(clean: &str, target: usize) -> Vec<String> {
    let chars: Vec<char> = clean.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() && chunks.len() < target {
        let end = (start + CHUNK_WIDTH).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let chunk = cut_chunk(window.trim());

        if CHUNK_BOUNDS.contains(chunk.chars().count()) {
            chunks.push(chunk);
        }

        start += CHUNK_WIDTH;
    }

    chunks
}

// Prefer a period late in the window, then a late space, else close the window as is
fn cut_chunk(window: &str) -> String {
    let chars: Vec<char> = window.chars().collect();
    let last_period = chars.iter().rposition(|&c| c == '.');
    let last_space = chars.iter().rposition(|&c| c == ' ');

    match (last_period, last_space) {
        (Some(p), _) if p > CHUNK_CUT_OFFSET => chars[..=p].iter().collect(),
        (_, Some(s)) if s > CHUNK_CUT_OFFSET => {
            let mut chunk: String = chars[..s].iter().collect();
            chunk.push('.');
            chunk
        }
        _ => ensure_terminal(window),
    }
}
