use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it", "its", "of", "on",
    "that", "the", "to", "was", "will", "with", "or", "but", "not", "this", "these", "they", "them", "their", "there",
    "then", "than", "so", "if", "when", "where", "why", "how", "what", "which", "who", "whom", "whose", "can", "could",
    "should", "would", "may", "might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("static regex"))
}

fn sentence_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+\s+").expect("static regex"))
}

/// Lowercased word tokens.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    token_re().find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// Question terms worth matching: tokens minus stop words and single characters.
pub fn key_terms(question: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens(question)
        .filter(|t| t.chars().count() >= 2 && !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Split on `.`, `!` or `?` followed by whitespace, keeping the terminator.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in sentence_end_re().find_iter(text) {
        let end = m.start() + m.as_str().trim_end().len();
        let s = text[start..end].trim();
        if !s.is_empty() {
            out.push(s);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}
