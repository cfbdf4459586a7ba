//! mhqa-hybrid
//!
//! Fuses sparse and dense retrieval lists by rank interleaving with content
//! deduplication. Scores are never compared across backends.

pub mod fingerprint;

use std::collections::HashSet;

use tracing::debug;

use mhqa_core::types::{MergedEvidence, ScoredResult};

pub use fingerprint::{fingerprint, normalize_text};

#[derive(Debug, Clone, Copy, Default)]
pub struct HybridMerger;

impl HybridMerger {
    pub fn new() -> Self { Self }

    /// Interleave `sparse[0], dense[0], sparse[1], dense[1], ...` and keep the
    /// first occurrence of each content fingerprint, stopping at `k` documents.
    pub fn merge(&self, sparse: &[ScoredResult], dense: &[ScoredResult], k: usize) -> MergedEvidence {
        let sparse = by_rank(sparse);
        let dense = by_rank(dense);

        let mut seen = HashSet::new();
        let mut accepted = Vec::with_capacity(k.min(sparse.len() + dense.len()));
        let mut skipped = 0usize;
        for candidate in interleave(&sparse, &dense) {
            if accepted.len() >= k {
                break;
            }
            if seen.insert(fingerprint(&candidate.document.text)) {
                accepted.push(candidate.document.clone());
            } else {
                skipped += 1;
            }
        }
        debug!(sparse = sparse.len(), dense = dense.len(), accepted = accepted.len(), skipped, "hybrid merge");
        MergedEvidence::new(accepted)
    }
}

/// Stable sort by `rank`, so equal ranks keep their input order.
fn by_rank(results: &[ScoredResult]) -> Vec<&ScoredResult> {
    let mut v: Vec<&ScoredResult> = results.iter().collect();
    v.sort_by_key(|r| r.rank);
    v
}

fn interleave<'a>(a: &'a [&'a ScoredResult], b: &'a [&'a ScoredResult]) -> impl Iterator<Item = &'a ScoredResult> + 'a {
    (0..a.len().max(b.len())).flat_map(move |i| a.get(i).into_iter().chain(b.get(i)).copied())
}
