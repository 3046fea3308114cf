//! Keyword index with graded matching.
//!
//! Every whitespace-separated word of three or more characters is indexed
//! under a normalized key: the word is NFKD-decomposed, runs of
//! non-alphanumeric characters (combining accents included) become `_`, then
//! the key is lowercased. Matching grades each entry:
//!
//! | score | condition                              |
//! |-------|----------------------------------------|
//! | 1.0   | query equals the original word         |
//! | 0.8   | query equals the key                   |
//! | 0.6   | normalized query equals the key        |
//! | 0.4   | query is a substring of the original   |
//! | 0.2   | query is a substring of the key        |
//! | 0.1   | normalized query is a substring of key |

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::parsing::Span;

static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
static NON_ALPHANUM_REGEX: OnceLock<Regex> = OnceLock::new();

const MIN_WORD_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordEntry {
    pub document: String,
    pub original: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordMatch {
    pub score: f64,
    pub entry: KeywordEntry,
}

/// Normalized form of a word, used as its index key.
pub fn normalize(word: &str) -> String {
    let re = NON_ALPHANUM_REGEX
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("Invalid keyword regex"));
    let decomposed: String = word.nfkd().collect();
    let replaced = re.replace_all(&decomposed, "_").to_lowercase();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: BTreeMap<String, Vec<KeywordEntry>>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every word of `text` under `document`.
    pub fn add(&mut self, document: &str, text: &str) {
        let words = WORD_REGEX.get_or_init(|| Regex::new(r"\S+").expect("Invalid word regex"));
        for m in words.find_iter(text) {
            if m.as_str().chars().count() < MIN_WORD_CHARS {
                continue;
            }
            self.entries
                .entry(normalize(m.as_str()))
                .or_default()
                .push(KeywordEntry {
                    document: document.to_owned(),
                    original: m.as_str().to_owned(),
                    span: Span::new(m.start(), m.end()),
                });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All graded matches, best first, then by document and position.
    pub fn find(&self, query: &str) -> Vec<KeywordMatch> {
        if query.is_empty() {
            return Vec::new();
        }
        let normalized = normalize(query);
        let mut out = Vec::new();
        for (key, entries) in &self.entries {
            for entry in entries {
                let score = grade(query, &normalized, key, &entry.original);
                if score > 0.0 {
                    out.push(KeywordMatch {
                        score,
                        entry: entry.clone(),
                    });
                }
            }
        }
        out.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.entry.document.cmp(&b.entry.document))
                .then_with(|| a.entry.span.start.cmp(&b.entry.span.start))
        });
        out
    }
}

fn grade(query: &str, normalized: &str, key: &str, original: &str) -> f64 {
    if query == original {
        1.0
    } else if query == key {
        0.8
    } else if normalized == key {
        0.6
    } else if original.contains(query) {
        0.4
    } else if key.contains(query) {
        0.2
    } else if !normalized.is_empty() && key.contains(normalized) {
        0.1
    } else {
        0.0
    }
}
