use tracing::debug;

use mhqa_core::error::{Error, Result};
use mhqa_core::types::{Answer, MergedEvidence, Question, Strategy};

use crate::chat::LlmClient;

const ANSWER_TAG: &str = "ANSWER:";
const REASONING_TAG: &str = "REASONING:";

/// Reader backed by a language model. Every failure is returned to the caller,
/// which is expected to fall back to the heuristic reader.
pub struct LlmExtractor {
    client: Box<dyn LlmClient>,
    top_n: usize,
}

impl LlmExtractor {
    pub fn new(client: Box<dyn LlmClient>, top_n: usize) -> Self {
        Self { client, top_n: top_n.max(1) }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn extract(&self, question: &Question, evidence: &MergedEvidence) -> Result<Answer> {
        if evidence.is_empty() {
            return Err(Error::ReasoningBackend("no evidence to reason over".into()));
        }
        let prompt = build_prompt(&question.text, evidence, self.top_n);
        let completion = self.client.complete(&prompt)?;
        let (text, reasoning) = parse_completion(&completion)?;
        debug!(model = self.client.model(), "llm answer parsed");
        Ok(Answer { text, reasoning, strategy: Strategy::Llm })
    }
}

pub fn build_prompt(question: &str, evidence: &MergedEvidence, top_n: usize) -> String {
    let context = evidence
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(i, d)| {
            let title = if d.title.trim().is_empty() { format!("Document {}", i + 1) } else { d.title.clone() };
            format!("**{title}**: {}", d.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You answer multi-hop questions from retrieved documents.\n\n\
         Question: {question}\n\n\
         Context:\n{context}\n\n\
         Work out which facts the question needs, find them in the context, \
         connect facts across documents where necessary, and give a short final answer.\n\n\
         Format your response as:\n\
         {REASONING_TAG} [step-by-step analysis]\n\
         {ANSWER_TAG} [the final answer]"
    )
}

/// Split a completion into `(answer, reasoning)`. The answer follows the last
/// `ANSWER:` marker; a completion without one, or with an empty answer, is
/// malformed.
pub fn parse_completion(completion: &str) -> Result<(String, Option<String>)> {
    let idx = completion
        .rfind(ANSWER_TAG)
        .ok_or_else(|| Error::ReasoningBackend(format!("completion lacks '{ANSWER_TAG}' marker")))?;
    let answer = completion[idx + ANSWER_TAG.len()..].trim();
    if answer.is_empty() {
        return Err(Error::ReasoningBackend("completion has an empty answer".into()));
    }
    let head = completion[..idx].trim();
    let reasoning = head.strip_prefix(REASONING_TAG).unwrap_or(head).trim();
    let reasoning = (!reasoning.is_empty()).then(|| reasoning.to_string());
    Ok((answer.to_string(), reasoning))
}
