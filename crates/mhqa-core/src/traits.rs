use std::collections::HashSet;

use crate::error::Result;
use crate::trajectory::Trajectory;
use crate::types::{Backend, ScoredResult};

/// Result of one retrieval call. `results` is always usable downstream;
/// `degraded` carries the reason when a stub was substituted.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub results: Vec<ScoredResult>,
    pub degraded: Option<String>,
}

pub trait Retriever: Send + Sync {
    fn retrieve_outcome(&self, query: &str, k: usize, backend: Backend) -> RetrievalOutcome;

    fn retrieve(&self, query: &str, k: usize, backend: Backend) -> Vec<ScoredResult> {
        self.retrieve_outcome(query, k, backend).results
    }
}

pub trait TrajectoryWriter: Send {
    fn write(&mut self, trajectory: &Trajectory) -> Result<()>;

    /// Question ids already persisted; used to resume interrupted batches.
    fn existing_ids(&self) -> Result<HashSet<String>>;
}
