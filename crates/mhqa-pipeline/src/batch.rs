use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use mhqa_core::error::{Error, Result};
use mhqa_core::traits::TrajectoryWriter;
use mhqa_core::types::Question;

use crate::cancel::CancelToken;
use crate::orchestrator::PipelineOrchestrator;

/// Runs many independent questions on a dedicated worker pool.
///
/// Questions whose trajectories the writer already holds are skipped, so a
/// restarted batch picks up where it stopped. Per-question failures are
/// counted, never propagated.
pub struct BatchRunner {
    orchestrator: PipelineOrchestrator,
    workers: usize,
    cancel: CancelToken,
    progress: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub skipped: usize,
    pub written: usize,
    pub succeeded: usize,
    pub cancelled: usize,
    pub errors: usize,
}

impl BatchRunner {
    pub fn new(orchestrator: PipelineOrchestrator) -> Self {
        let workers = orchestrator
            .settings()
            .batch
            .workers
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()));
        Self { orchestrator, workers, cancel: CancelToken::new(), progress: false }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Token that abandons in-flight questions at their next phase boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run<W: TrajectoryWriter>(&self, questions: &[Question], writer: W) -> Result<BatchReport> {
        let existing = writer.existing_ids()?;
        let mut scheduled = HashSet::new();
        let pending: Vec<&Question> = questions
            .iter()
            .filter(|q| !existing.contains(&q.id) && scheduled.insert(q.id.as_str()))
            .collect();
        let skipped = questions.len() - pending.len();
        info!(total = questions.len(), skipped, pending = pending.len(), workers = self.workers, "starting batch");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build worker pool: {e}")))?;

        let pb = if self.progress { ProgressBar::new(pending.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} questions ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let writer = Mutex::new(writer);
        let written = AtomicUsize::new(0);
        let succeeded = AtomicUsize::new(0);
        let cancelled = AtomicUsize::new(0);
        let errors = AtomicUsize::new(0);

        pool.install(|| {
            pending.par_iter().for_each(|question| {
                match self.orchestrator.run_cancellable(question, &self.cancel) {
                    Ok(trajectory) => {
                        if trajectory.success() {
                            succeeded.fetch_add(1, Ordering::Relaxed);
                        }
                        let result = match writer.lock() {
                            Ok(mut w) => w.write(&trajectory),
                            Err(_) => Err(Error::Io(std::io::Error::other("trajectory writer lock poisoned"))),
                        };
                        match result {
                            Ok(()) => {
                                written.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                warn!(question_id = %question.id, error = %e, "failed to write trajectory");
                                errors.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    Err(Error::Cancelled) => {
                        cancelled.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!(question_id = %question.id, error = %e, "question failed");
                        errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
                pb.inc(1);
                pb.set_message(question.id.clone());
            });
        });
        pb.finish_and_clear();

        let report = BatchReport {
            total: questions.len(),
            skipped,
            written: written.into_inner(),
            succeeded: succeeded.into_inner(),
            cancelled: cancelled.into_inner(),
            errors: errors.into_inner(),
        };
        info!(?report, "batch finished");
        Ok(report)
    }
}
