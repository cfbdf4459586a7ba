use tracing::info;

use mhqa_core::config::Settings;
use mhqa_core::error::Result;
use mhqa_core::types::{Answer, MergedEvidence, Question};

use crate::chat::ChatClient;
use crate::heuristic::HeuristicExtractor;
use crate::llm::LlmExtractor;
use crate::HEURISTIC_MODEL_NAME;

/// The reader selected for a run.
pub enum ExtractionStrategy {
    Heuristic(HeuristicExtractor),
    Llm(LlmExtractor),
}

impl ExtractionStrategy {
    /// `Llm` when `pipeline.use_llm` is set and a credential is configured,
    /// otherwise `Heuristic`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if !settings.llm_enabled() {
            if settings.pipeline.use_llm {
                info!("LLM reader requested without an API credential; using the heuristic reader");
            }
            return Ok(Self::Heuristic(HeuristicExtractor::new(&settings.heuristic)));
        }
        let client = ChatClient::new(&settings.llm)?;
        Ok(Self::Llm(LlmExtractor::new(Box::new(client), settings.llm.top_n)))
    }

    /// Model name recorded for the READ phase when this strategy answers.
    pub fn model_name(&self) -> &str {
        match self {
            Self::Heuristic(_) => HEURISTIC_MODEL_NAME,
            Self::Llm(llm) => llm.model(),
        }
    }

    pub fn extract(&self, question: &Question, evidence: &MergedEvidence) -> Result<Answer> {
        match self {
            Self::Heuristic(h) => Ok(h.extract(question, evidence)),
            Self::Llm(llm) => llm.extract(question, evidence),
        }
    }
}
