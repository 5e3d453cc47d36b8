//! Text normalization for the non-semantic similarity signals
//!
//! Everything here is pure and deterministic: the same input always yields
//! the same token set, which is what makes match output idempotent.

use std::collections::{BTreeSet, HashMap};

/// English function words that carry no matching signal.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "can", "this", "that",
    "these", "those", "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us",
    "them", "my", "your", "his", "its", "our", "their", "from", "into", "via", "using",
];

/// Output of [`TextNormalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// Lowercase stems with stopwords removed
    pub tokens: BTreeSet<String>,
    /// The text as given
    pub raw: String,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Tokenizer + light stemmer shared by similarity scoring and suggestion heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize text into a set of lowercase stems.
    ///
    /// Never fails: empty or punctuation-only input gives an empty token set.
    pub fn normalize(&self, text: &str) -> NormalizedText {
        NormalizedText {
            tokens: self.tokens(text).into_iter().collect(),
            raw: text.to_string(),
        }
    }

    /// Ordered stems (duplicates kept), stopwords removed.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        words(text)
            .filter(|w| !is_stopword(w))
            .map(|w| stem(&w))
            .filter(|w| !w.is_empty())
            .collect()
    }

    /// Frequency-ranked keywords longer than two characters.
    ///
    /// Ties keep first-occurrence order. Keywords are returned unstemmed so
    /// they can be reused in generated labels.
    pub fn keywords(&self, text: &str, max_keywords: usize) -> Vec<String> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for (position, word) in words(text).enumerate() {
            if word.chars().count() <= 2 || is_stopword(&word) {
                continue;
            }
            counts.entry(word).or_insert((0, position)).0 += 1;
        }
        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        ranked.into_iter().take(max_keywords).map(|(w, _)| w).collect()
    }
}

/// Lowercase alphanumeric words. Any other character is a separator.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Conservative suffix stripping: plurals, `-ing`, `-ed`.
///
/// Minimum stem lengths keep short words ("gas", "bed", "sing") intact.
pub fn stem(word: &str) -> String {
    let len = word.chars().count();
    if !word.is_ascii() || len <= 3 {
        return word.to_string();
    }
    if let Some(base) = word.strip_suffix("ies") {
        if len > 4 {
            return format!("{}y", base);
        }
    }
    if word.ends_with("sses") {
        return word[..word.len() - 2].to_string();
    }
    if let Some(base) = word.strip_suffix("ing") {
        if base.len() >= 4 {
            return base.to_string();
        }
    }
    if let Some(base) = word.strip_suffix("ed") {
        if base.len() >= 4 {
            return base.to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Canonical comparison form: lowercase, punctuation removed, whitespace collapsed.
///
/// Used for exact-label matching and label de-duplication.
pub fn canonical_form(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case each whitespace-separated word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
