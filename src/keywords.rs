//! Theme text to keyword expansion.
//!
//! A theme such as "formal business" is tokenized, stopwords are dropped and
//! every remaining token is followed by its synonyms from a fixed table. The
//! table is built once and shared read-only.

use std::collections::{HashMap, HashSet};

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "with", "for", "to", "of", "in", "on",
];

const SYNONYMS: &[(&str, &[&str])] = &[
    ("formal", &["dressy", "smart", "business", "suit", "blazer"]),
    ("business", &["office", "work", "professional", "formal"]),
    ("office", &["work", "business", "professional"]),
    ("casual", &["relaxed", "everyday", "jeans", "tshirt", "comfy"]),
    ("sporty", &["athletic", "gym", "active", "sport", "running"]),
    ("gym", &["athletic", "sporty", "workout", "active"]),
    ("party", &["night", "going-out", "dressy", "festive"]),
    ("date", &["romantic", "dressy", "night", "smart"]),
    ("summer", &["light", "shorts", "linen", "bright", "warm"]),
    ("winter", &["warm", "wool", "knit", "sweater", "layered"]),
    ("beach", &["summer", "shorts", "linen", "light"]),
    ("street", &["streetwear", "urban", "hoodie", "sneakers"]),
    ("cozy", &["comfy", "knit", "sweater", "warm"]),
];

/// Lower-case, strip everything outside `[a-z0-9,_-]` and whitespace, and
/// split on runs of whitespace and commas.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_whitespace() || matches!(c, 'a'..='z' | '0'..='9' | ',' | '_' | '-'))
        .collect();
    cleaned
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct KeywordTable {
    synonyms: HashMap<String, Vec<String>>,
    stopwords: HashSet<String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeywordTable {
    pub fn builtin() -> Self {
        Self::new(
            SYNONYMS.iter().map(|(word, list)| {
                (word.to_string(), list.iter().map(|s| s.to_string()).collect())
            }),
            STOPWORDS.iter().map(|s| s.to_string()),
        )
    }

    pub fn new(
        synonyms: impl IntoIterator<Item = (String, Vec<String>)>,
        stopwords: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            synonyms: synonyms.into_iter().collect(),
            stopwords: stopwords.into_iter().collect(),
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn synonyms_of(&self, token: &str) -> &[String] {
        self.synonyms.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ordered, de-duplicated keywords: each non-stopword token followed by
    /// its synonyms, first occurrence wins.
    pub fn expand(&self, tokens: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();
        for token in tokens {
            if self.is_stopword(token) {
                continue;
            }
            let candidates = std::iter::once(token).chain(self.synonyms_of(token));
            for word in candidates {
                if seen.insert(word.as_str()) {
                    keywords.push(word.clone());
                }
            }
        }
        keywords
    }

    pub fn expand_text(&self, text: &str) -> Vec<String> {
        self.expand(&tokenize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_tokenize_strips_punctuation_and_keeps_hyphen() {
        assert_eq!(
            tokenize("Business-casual, for Winter!!"),
            vec!["business-casual", "for", "winter"]
        );
    }

    #[test]
    fn test_tokenize_splits_on_tabs_and_newlines() {
        assert_eq!(
            tokenize("formal\tbusiness\nwinter"),
            vec!["formal", "business", "winter"]
        );
        assert_eq!(tokenize(" \r\n formal,\t\tcasual "), vec!["formal", "casual"]);
    }

    #[test]
    fn test_tokenize_empty_and_separator_only_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" ,, ,").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_duplicates_and_underscores() {
        assert_eq!(tokenize("red_top red_top"), vec!["red_top", "red_top"]);
    }

    #[test]
    fn test_expand_formal() {
        let table = KeywordTable::builtin();
        assert_eq!(
            table.expand(&tokens(&["formal"])),
            vec!["formal", "dressy", "smart", "business", "suit", "blazer"]
        );
    }

    #[test]
    fn test_expand_drops_stopwords_and_duplicates() {
        let table = KeywordTable::builtin();
        let expanded = table.expand(&tokens(&["the", "formal", "and", "business"]));
        assert_eq!(
            expanded,
            vec![
                "formal",
                "dressy",
                "smart",
                "business",
                "suit",
                "blazer",
                "office",
                "work",
                "professional"
            ]
        );
    }

    #[test]
    fn test_expand_unknown_token_passes_through() {
        let table = KeywordTable::builtin();
        assert_eq!(table.expand(&tokens(&["formals"])), vec!["formals"]);
    }

    #[test]
    fn test_expand_text_is_deterministic() {
        let table = KeywordTable::builtin();
        let first = table.expand_text("Casual summer, beach day");
        for _ in 0..5 {
            assert_eq!(table.expand_text("Casual summer, beach day"), first);
        }
    }
}
