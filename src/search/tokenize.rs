//! Search-term tokenizer.
//!
//! Lowercased runs of alphanumeric characters form terms. CJK text has no
//! word separators, so every ideograph or kana is a term of its own. The
//! client-side `search.js` applies the same rules to queries.

use crate::config::SearchConfig;

/// Common English words left out of the index.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    min_len: usize,
    stop_words: bool,
}

impl Tokenizer {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            min_len: config.min_term_length,
            stop_words: config.stop_words,
        }
    }

    /// Terms of `text` in order of appearance, duplicates included.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut terms = Vec::new();
        let mut word = String::new();

        for c in text.chars() {
            if is_cjk(c) {
                self.flush(&mut word, &mut terms);
                terms.push(c.to_string());
            } else if c.is_alphanumeric() {
                word.extend(c.to_lowercase());
            } else {
                self.flush(&mut word, &mut terms);
            }
        }
        self.flush(&mut word, &mut terms);
        terms
    }

    fn flush(&self, word: &mut String, terms: &mut Vec<String>) {
        if word.is_empty() {
            return;
        }
        let word = std::mem::take(word);
        if word.chars().count() < self.min_len {
            return;
        }
        if self.stop_words && STOP_WORDS.contains(&word.as_str()) {
            return;
        }
        terms.push(word);
    }
}

/// Kana, CJK ideographs and Hangul syllables.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30ff}'
        | '\u{3400}'..='\u{4dbf}'
        | '\u{4e00}'..='\u{9fff}'
        | '\u{ac00}'..='\u{d7af}'
        | '\u{f900}'..='\u{faff}')
}
