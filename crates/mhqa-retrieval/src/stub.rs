use mhqa_core::types::{Backend, Document, ScoredResult};

/// Placeholder hit returned when a backend is unset or unreachable.
pub fn stub_result(query: &str, backend: Backend) -> ScoredResult {
    let title = match backend {
        Backend::Sparse => "Stub Sparse",
        Backend::Dense => "Stub Dense",
    };
    ScoredResult {
        document: Document {
            id: format!("stub-{backend}"),
            title: title.to_string(),
            text: format!("No {backend} service. Fallback for: {query}"),
            source: backend,
        },
        score: 0.0,
        rank: 0,
    }
}
