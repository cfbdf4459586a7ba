//! mhqa-pipeline
//!
//! Per-question orchestration (PLAN → RETRIEVE_SPARSE → RETRIEVE_DENSE →
//! HYBRID → READ → FINALIZE), trajectory writers, and the resumable batch
//! runner that drives many questions over a worker pool.

pub mod batch;
pub mod cancel;
pub mod dataset;
pub mod orchestrator;
pub mod writer;

pub use batch::{BatchReport, BatchRunner};
pub use cancel::CancelToken;
pub use orchestrator::PipelineOrchestrator;
pub use writer::{DirWriter, JsonlWriter};
