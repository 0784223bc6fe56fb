/// Exclusive character-length band a sentence must fall in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceBounds {
    pub min: usize,
    pub max: usize,
}

impl SentenceBounds {
    /// Band for sentences cut from page text
    pub const FALLBACK: Self = Self { min: 30, max: 180 };
    /// Band for sentences returned by a language model
    pub const MODEL: Self = Self { min: 20, max: 150 };

    pub fn contains(&self, len: usize) -> bool {
        len > self.min && len < self.max
    }
}

pub fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Append a period unless the text already ends in terminal punctuation
pub fn ensure_terminal(sentence: &str) -> String {
    if sentence.ends_with(is_terminal) {
        sentence.to_string()
    } else {
        format!("{}.", sentence)
    }
}

/// Trim, terminate and length-check one candidate sentence
pub fn accept_sentence(candidate: &str, bounds: SentenceBounds) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    let sentence = ensure_terminal(trimmed);
    bounds
        .contains(sentence.chars().count())
        .then_some(sentence)
}

/// Single-pass iterator over sentence-like units of a text.
///
/// Each unit runs up to and including a cluster of `.`, `!` or `?`; the
/// trailing remainder without terminal punctuation is a unit too. Units
/// outside the length band are skipped.
pub struct Segments<'a> {
    rest: &'a str,
    bounds: SentenceBounds,
}

impl<'a> Iterator for Segments<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while !self.rest.is_empty() {
            let end = unit_end(self.rest);
            let (unit, rest) = self.rest.split_at(end);
            self.rest = rest;

            if let Some(sentence) = accept_sentence(unit, self.bounds) {
                return Some(sentence);
            }
        }
        None
    }
}

/// Segment with the page-text band
pub fn segment(text: &str) -> Segments<'_> {
    segment_with(text, SentenceBounds::FALLBACK)
}

pub fn segment_with(text: &str, bounds: SentenceBounds) -> Segments<'_> {
    Segments { rest: text, bounds }
}

// Byte offset just past the first terminal cluster, or the end of the text
fn unit_end(text: &str) -> usize {
    let Some(first) = text.find(is_terminal) else {
        return text.len();
    };
    text[first..]
        .find(|c: char| !is_terminal(c))
        .map_or(text.len(), |offset| first + offset)
}
