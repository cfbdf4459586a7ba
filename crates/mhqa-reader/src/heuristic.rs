use std::collections::HashSet;

use mhqa_core::config::HeuristicSettings;
use mhqa_core::types::{Answer, MergedEvidence, Question, Strategy};

use crate::text::{key_terms, split_sentences, tokens};

/// Rule-based reader. Deterministic and offline; it never fails, it can only
/// return a weak answer.
///
/// Picks the best-overlapping sentence of the first document that has one
/// sentence covering at least `min_overlap` of the question's key terms.
/// Without such a sentence it returns the first sentence of the first
/// document, even if that sentence says nothing about the question.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    min_overlap: f64,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new(&HeuristicSettings::default())
    }
}

impl HeuristicExtractor {
    pub fn new(settings: &HeuristicSettings) -> Self {
        Self { min_overlap: settings.min_overlap }
    }

    pub fn extract(&self, question: &Question, evidence: &MergedEvidence) -> Answer {
        let text = self.select(&question.text, evidence).unwrap_or_default();
        Answer { text, reasoning: None, strategy: Strategy::Heuristic }
    }

    fn select(&self, question: &str, evidence: &MergedEvidence) -> Option<String> {
        let terms = key_terms(question);
        if !terms.is_empty() {
            for doc in evidence.iter() {
                if let Some(span) = self.best_span(&terms, &doc.text) {
                    return Some(span.to_string());
                }
            }
        }
        evidence
            .iter()
            .find_map(|doc| split_sentences(&doc.text).first().map(|s| (*s).to_string()))
    }

    fn best_span<'t>(&self, terms: &[String], text: &'t str) -> Option<&'t str> {
        let mut best: Option<(&str, f64)> = None;
        for sentence in split_sentences(text) {
            let words: HashSet<String> = tokens(sentence).collect();
            let hits = terms.iter().filter(|t| words.contains(t.as_str())).count();
            if hits == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let overlap = hits as f64 / terms.len() as f64;
            if overlap >= self.min_overlap && best.map_or(true, |(_, b)| overlap > b) {
                best = Some((sentence, overlap));
            }
        }
        best.map(|(s, _)| s)
    }
}
