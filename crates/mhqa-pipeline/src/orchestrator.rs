use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn};

use mhqa_core::config::Settings;
use mhqa_core::error::{Error, Result};
use mhqa_core::traits::Retriever;
use mhqa_core::trajectory::{Trajectory, TrajectoryBuilder};
use mhqa_core::types::{Answer, Backend, MergedEvidence, Phase, Question, ScoredResult, Strategy};
use mhqa_hybrid::HybridMerger;
use mhqa_reader::{ExtractionStrategy, HeuristicExtractor, HEURISTIC_MODEL_NAME};
use mhqa_retrieval::RetrievalClient;

use crate::cancel::CancelToken;

/// Drives one question through the six fixed phases.
///
/// Holds only read-only state, so one instance can be shared by every worker
/// of a batch run.
pub struct PipelineOrchestrator {
    settings: Settings,
    retriever: Box<dyn Retriever>,
    merger: HybridMerger,
    strategy: ExtractionStrategy,
    heuristic: HeuristicExtractor,
}

/// Values carried between phases of a single run.
#[derive(Default)]
struct RunState {
    sparse: Vec<ScoredResult>,
    dense: Vec<ScoredResult>,
    evidence: MergedEvidence,
    answer: Option<Answer>,
}

impl PipelineOrchestrator {
    /// Build with the HTTP retrieval client and the reader selected by `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let retriever = RetrievalClient::new(&settings.retrieval)?;
        let strategy = ExtractionStrategy::from_settings(&settings)?;
        Self::with_components(settings, Box::new(retriever), strategy)
    }

    pub fn with_components(settings: Settings, retriever: Box<dyn Retriever>, strategy: ExtractionStrategy) -> Result<Self> {
        settings.validate()?;
        let heuristic = HeuristicExtractor::new(&settings.heuristic);
        Ok(Self { settings, retriever, merger: HybridMerger::new(), strategy, heuristic })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn run(&self, question: &Question) -> Result<Trajectory> {
        self.run_cancellable(question, &CancelToken::new())
    }

    /// Like `run`, but checks `cancel` before every phase. A cancelled run
    /// drops its partial trajectory and returns `Error::Cancelled`.
    pub fn run_cancellable(&self, question: &Question, cancel: &CancelToken) -> Result<Trajectory> {
        let span = info_span!("trajectory", question_id = %question.id);
        let _enter = span.enter();

        let mut builder = TrajectoryBuilder::start(question, self.strategy.model_name());
        let mut state = RunState::default();
        while let Some(phase) = builder.current_phase() {
            if cancel.is_cancelled() {
                info!(%phase, "cancelled, discarding trajectory");
                return Err(Error::Cancelled);
            }
            let content = self.execute(phase, question, &mut state, &mut builder);
            debug!(%phase, "phase complete");
            builder.record(content);
        }

        let answer = state.answer.map(|a| a.text).unwrap_or_default();
        let trajectory = builder.finish(answer)?;
        info!(success = trajectory.success(), elapsed_ms = u64::try_from(trajectory.timing().as_millis()).unwrap_or(u64::MAX), "trajectory finalized");
        Ok(trajectory)
    }

    fn execute(&self, phase: Phase, question: &Question, state: &mut RunState, builder: &mut TrajectoryBuilder) -> String {
        let ks = self.settings.pipeline.topk_sparse;
        let kd = self.settings.pipeline.topk_dense;
        let k = self.settings.merge_k();
        let started = Instant::now();
        match phase {
            Phase::Plan => format!(
                "Plan: search the sparse index for the top {ks} and the dense index for the top {kd} \
                 passages about \"{}\", merge them into at most {k} unique passages, \
                 then read the evidence and answer.",
                question.text
            ),
            Phase::RetrieveSparse => {
                state.sparse = self.retrieve(question, ks, Backend::Sparse, builder);
                tool_step("sparse_search", json!({"q": question.text, "k": ks}), json!({"results": state.sparse}), started)
            }
            Phase::RetrieveDense => {
                state.dense = self.retrieve(question, kd, Backend::Dense, builder);
                tool_step("dense_search", json!({"q": question.text, "k": kd}), json!({"results": state.dense}), started)
            }
            Phase::Hybrid => {
                state.evidence = self.merger.merge(&state.sparse, &state.dense, k);
                tool_step("hybrid_merge", json!({"k": k}), json!({"docs": state.evidence}), started)
            }
            Phase::Read => {
                let answer = self.read(question, &state.evidence, builder);
                let tool = match answer.strategy {
                    Strategy::Llm => "llm_reader",
                    Strategy::Heuristic => HEURISTIC_MODEL_NAME,
                };
                let step = tool_step(tool, json!({"question": question.text}), json!(answer), started);
                state.answer = Some(answer);
                step
            }
            Phase::Finalize => {
                let text = state.answer.as_ref().map_or("", |a| a.text.as_str());
                format!("<answer>{text}</answer>")
            }
        }
    }

    fn retrieve(&self, question: &Question, k: usize, backend: Backend, builder: &mut TrajectoryBuilder) -> Vec<ScoredResult> {
        let outcome = self.retriever.retrieve_outcome(&question.text, k, backend);
        if let Some(reason) = outcome.degraded {
            builder.warn(format!("{backend} retrieval degraded to stub: {reason}"));
        }
        outcome.results
    }

    /// Attempt the configured strategy; on any failure answer with the
    /// heuristic reader and annotate the trajectory.
    fn read(&self, question: &Question, evidence: &MergedEvidence, builder: &mut TrajectoryBuilder) -> Answer {
        match self.strategy.extract(question, evidence) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "reader failed, falling back to heuristic");
                builder.warn(format!("reasoning backend failed, used heuristic reader: {e}"));
                builder.set_model_name(HEURISTIC_MODEL_NAME);
                self.heuristic.extract(question, evidence)
            }
        }
    }
}

/// Tool step body; the observation records the call's wall-clock `latency_ms`.
fn tool_step(name: &str, args: Value, mut output: Value, started: Instant) -> String {
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if let Value::Object(fields) = &mut output {
        fields.insert("latency_ms".into(), json!(latency_ms));
    }
    let call = json!({"name": name, "args": args});
    format!("<tool_call>{call}</tool_call>\n<output>{output}</output>")
}
