//! Domain types shared by the retrieval, merge and read stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An input question. `id` is the stable key used to resume batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
}

impl Question {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// Indicates which retrieval backend produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sparse,
    Dense,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Sparse => "sparse",
            Backend::Dense => "dense",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sparse" | "bm25" => Ok(Backend::Sparse),
            "dense" => Ok(Backend::Dense),
            other => Err(Error::InvalidConfig(format!("unknown retrieval backend '{other}'"))),
        }
    }
}

/// A retrieved document. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
    pub source: Backend,
}

/// One hit from a single retrieval call.
///
/// `rank` is the 0-based position within the originating call. `score` is
/// backend-relative: sparse and dense scores live on different scales and
/// must not be compared with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub document: Document,
    pub score: f64,
    pub rank: usize,
}

/// Deduplicated, fused evidence handed to the reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergedEvidence {
    documents: Vec<Document>,
}

impl MergedEvidence {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}

/// Which reader produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Llm,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    Tool,
}

/// The fixed pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Plan,
    RetrieveSparse,
    RetrieveDense,
    Hybrid,
    Read,
    Finalize,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Plan,
        Phase::RetrieveSparse,
        Phase::RetrieveDense,
        Phase::Hybrid,
        Phase::Read,
        Phase::Finalize,
    ];

    /// The phase that follows this one; `None` after FINALIZE.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Plan => Some(Phase::RetrieveSparse),
            Phase::RetrieveSparse => Some(Phase::RetrieveDense),
            Phase::RetrieveDense => Some(Phase::Hybrid),
            Phase::Hybrid => Some(Phase::Read),
            Phase::Read => Some(Phase::Finalize),
            Phase::Finalize => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Plan => "PLAN",
            Phase::RetrieveSparse => "RETRIEVE_SPARSE",
            Phase::RetrieveDense => "RETRIEVE_DENSE",
            Phase::Hybrid => "HYBRID",
            Phase::Read => "READ",
            Phase::Finalize => "FINALIZE",
        }
    }

    /// Role of the step each phase emits.
    pub fn role(self) -> Role {
        match self {
            Phase::Plan | Phase::Finalize => Role::Assistant,
            _ => Role::Tool,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub role: Role,
    pub phase: Phase,
    pub content: String,
}
