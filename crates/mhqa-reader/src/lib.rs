//! mhqa-reader
//!
//! Answer extraction over merged evidence. `HeuristicExtractor` is offline and
//! infallible; `LlmExtractor` asks a chat-completion service and may fail, in
//! which case the caller substitutes the heuristic.

pub mod chat;
pub mod heuristic;
pub mod llm;
pub mod strategy;
pub mod text;

pub use chat::{ChatClient, LlmClient};
pub use heuristic::HeuristicExtractor;
pub use llm::LlmExtractor;
pub use strategy::ExtractionStrategy;

/// `model_name` recorded when the heuristic reader produced the answer.
pub const HEURISTIC_MODEL_NAME: &str = "heuristic_reader";
