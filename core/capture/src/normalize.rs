use regex::Regex;
use std::sync::OnceLock;

/// Upper bound on page text handed to the summarizers
pub const MAX_TEXT_CHARS: usize = 15_000;
/// Upper bound on the excerpt stored with a snapshot
pub const MAX_EXCERPT_CHARS: usize = 1_500;

/// Cleans extracted page text before summarization and classification
pub struct TextNormalizer {
    url_pattern: Regex,
    symbol_pattern: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            url_pattern: Regex::new(r"(?i)https?://\S+").unwrap(),
            // Code and markup punctuation clusters
            symbol_pattern: Regex::new(r"[{}\[\]+=<>;:()/\\]+").unwrap(),
        }
    }

    /// Strip URLs and code symbols, collapse whitespace, trim and truncate to `max_len` chars
    pub fn normalize(&self, raw: &str, max_len: usize) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        let text = strip_zero_width(raw);
        let text = self.url_pattern.replace_all(&text, "");
        let text = self.symbol_pattern.replace_all(&text, " ");
        truncate_chars(&collapse_whitespace(&text), max_len)
    }

    /// Lighter cleanup for stored excerpts: keeps punctuation, only fixes whitespace
    pub fn clean_excerpt(&self, raw: &str, max_len: usize) -> String {
        truncate_chars(&collapse_whitespace(&strip_zero_width(raw)), max_len)
    }
}

/// Normalize with a shared normalizer instance
pub fn normalize(raw: &str, max_len: usize) -> String {
    static NORMALIZER: OnceLock<TextNormalizer> = OnceLock::new();
    NORMALIZER
        .get_or_init(TextNormalizer::new)
        .normalize(raw, max_len)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a char boundary, dropping any trailing space left by the cut
pub fn truncate_chars(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((byte_idx, _)) => text[..byte_idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn strip_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .collect()
}
