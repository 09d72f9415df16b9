//! Client-side search index.
//!
//! Built once per build from the rendered articles and shipped as
//! `search-index.json`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "documents": [{ "title": "Closures", "url": "/js/closures/", "excerpts": ["..."] }],
//!   "terms": { "closure": [[0, 0], [0, 3]] }
//! }
//! ```
//!
//! A posting `[doc, excerpt]` points at one excerpt of one document. Terms
//! are sorted and postings are sorted and deduplicated, so the same input
//! always serializes to the same bytes.

pub mod tokenize;

use crate::config::SearchConfig;
use crate::utils::html::decode_entities;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tokenize::Tokenizer;

/// File name of the index in the output root.
pub const INDEX_FILE: &str = "search-index.json";

/// Bumped whenever the JSON layout changes.
pub const INDEX_VERSION: u32 = 1;

/// Closing tags that end a block of text.
static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</(?:p|h[1-6]|li|dt|dd|pre|blockquote|tr|th|td|div|details|summary|section|table|figcaption)\s*>|<br\s*/?>",
    )
    .expect("valid block regex")
});

static HASH_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a class="hash-link"[^>]*>#</a>"#).expect("valid hash-link regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndex {
    pub version: u32,
    pub documents: Vec<IndexedDocument>,
    pub terms: BTreeMap<String, Vec<(usize, usize)>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub title: String,
    pub url: String,
    pub excerpts: Vec<String>,
}

/// One rendered document to index.
#[derive(Debug)]
pub struct Entry<'a> {
    pub title: &'a str,
    /// Final URL, `base_url` included.
    pub url: String,
    /// Article HTML.
    pub html: &'a str,
}

impl SearchIndex {
    pub fn build(entries: &[Entry<'_>], config: &SearchConfig) -> Self {
        let tokenizer = Tokenizer::new(config);
        let mut index = Self {
            version: INDEX_VERSION,
            ..Self::default()
        };

        for (doc, entry) in entries.iter().enumerate() {
            let segments = extract_text(entry.html);
            let mut excerpts: Vec<String> = segments
                .iter()
                .map(|segment| truncate_chars(segment, config.excerpt_length))
                .collect();
            if excerpts.is_empty() {
                excerpts.push(truncate_chars(entry.title, config.excerpt_length));
            }

            for term in tokenizer.tokens(entry.title) {
                index.terms.entry(term).or_default().push((doc, 0));
            }
            // Terms are taken from the full segment, not the truncated excerpt
            for (excerpt, segment) in segments.iter().enumerate() {
                for term in tokenizer.tokens(segment) {
                    index.terms.entry(term).or_default().push((doc, excerpt));
                }
            }

            index.documents.push(IndexedDocument {
                title: entry.title.to_owned(),
                url: entry.url.clone(),
                excerpts,
            });
        }

        for postings in index.terms.values_mut() {
            postings.sort_unstable();
            postings.dedup();
        }
        index
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Plain-text blocks of an HTML fragment: tags stripped, entities decoded,
/// whitespace collapsed, empty blocks dropped.
pub fn extract_text(html: &str) -> Vec<String> {
    let html = HASH_LINK.replace_all(html, "");
    BLOCK_END
        .split(&html)
        .map(|block| {
            let text = TAG.replace_all(block, "");
            let text = decode_entities(&text);
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_owned(),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry<'a>(title: &'a str, url: &str, html: &'a str) -> Entry<'a> {
        Entry {
            title,
            url: url.to_owned(),
            html,
        }
    }

    #[test]
    fn test_extract_text() {
        let html = "<h1 id=\"x\">Event <code>loop</code><a class=\"hash-link\" href=\"#x\" aria-label=\"Direct link to Event loop\">#</a></h1>\n\
                    <p>Tasks &amp; micro&#x2011;tasks<br>run   in order.</p>\n<ul><li>one</li><li></li></ul>";
        assert_eq!(
            extract_text(html),
            vec!["Event loop", "Tasks & micro\u{2011}tasks", "run in order.", "one"]
        );
    }

    #[test]
    fn test_empty_input_yields_empty_index() {
        let index = SearchIndex::build(&[], &SearchConfig::default());
        assert_eq!(index.version, INDEX_VERSION);
        assert!(index.documents.is_empty());
        assert_eq!(index.term_count(), 0);
        assert_eq!(index.to_json().unwrap(), r#"{"version":1,"documents":[],"terms":{}}"#);
    }

    #[test]
    fn test_postings_point_at_excerpts() {
        let entries = [
            entry("Closures", "/js/closures/", "<h1>Closures</h1><p>A closure captures scope.</p>"),
            entry("Scope", "/js/scope/", "<h1>Scope</h1><p>Lexical scope and closures.</p>"),
        ];
        let index = SearchIndex::build(&entries, &SearchConfig::default());

        assert_eq!(index.documents[0].excerpts, vec!["Closures", "A closure captures scope."]);
        assert_eq!(index.terms["closures"], vec![(0, 0), (1, 1)]);
        assert_eq!(index.terms["scope"], vec![(0, 1), (1, 0), (1, 1)]);
        assert!(!index.terms.contains_key("and"));
        assert!(!index.terms.contains_key("a"));
    }

    #[test]
    fn test_title_terms_point_at_first_excerpt() {
        let entries = [entry("Hoisting", "/hoisting/", "<p>Variables move up.</p>")];
        let index = SearchIndex::build(&entries, &SearchConfig::default());
        assert_eq!(index.terms["hoisting"], vec![(0, 0)]);

        let entries = [entry("Empty page", "/empty/", "")];
        let index = SearchIndex::build(&entries, &SearchConfig::default());
        assert_eq!(index.documents[0].excerpts, vec!["Empty page"]);
    }

    #[test]
    fn test_excerpts_are_truncated() {
        let config = SearchConfig {
            excerpt_length: 5,
            ..SearchConfig::default()
        };
        let entries = [entry("T", "/t/", "<p>前端面试笔记 notes</p>")];
        let index = SearchIndex::build(&entries, &config);

        assert_eq!(index.documents[0].excerpts, vec!["前端面试笔"]);
        // Terms past the cut are still indexed
        assert_eq!(index.terms["notes"], vec![(0, 0)]);
        assert_eq!(index.terms["记"], vec![(0, 0)]);
    }

    #[test]
    fn test_serialization_is_stable() {
        let entries = [
            entry("B", "/b/", "<p>zeta alpha</p>"),
            entry("A", "/a/", "<p>alpha</p>"),
        ];
        let first = SearchIndex::build(&entries, &SearchConfig::default()).to_json().unwrap();
        let second = SearchIndex::build(&entries, &SearchConfig::default()).to_json().unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"alpha\":").unwrap() < first.find("\"zeta\":").unwrap());

        let parsed: SearchIndex = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed.terms["alpha"], vec![(0, 0), (1, 0)]);
    }
}
