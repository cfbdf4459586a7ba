use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use mhqa_core::config::RetrievalSettings;
use mhqa_core::error::{Error, Result};
use mhqa_core::traits::{RetrievalOutcome, Retriever};
use mhqa_core::types::{Backend, Document, ScoredResult};

use crate::stub::stub_result;

/// Blocking client for `GET <endpoint>?q=<query>&k=<k>` retrieval services.
pub struct RetrievalClient {
    http: reqwest::blocking::Client,
    sparse_url: Option<String>,
    dense_url: Option<String>,
}

/// Response body of the retrieval service.
#[derive(Deserialize)]
struct SearchResponse {
    docs: Vec<WireDocument>,
}

#[derive(Deserialize)]
struct WireDocument {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: String,
    text: String,
    #[serde(default)]
    score: Option<f64>,
}

impl RetrievalClient {
    pub fn new(settings: &RetrievalSettings) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            sparse_url: settings.endpoint(Backend::Sparse)?,
            dense_url: settings.endpoint(Backend::Dense)?,
        })
    }

    pub fn endpoint(&self, backend: Backend) -> Option<&str> {
        match backend {
            Backend::Sparse => self.sparse_url.as_deref(),
            Backend::Dense => self.dense_url.as_deref(),
        }
    }

    fn fetch(&self, url: &str, query: &str, k: usize, backend: Backend) -> Result<Vec<ScoredResult>> {
        let unavailable = |reason: String| Error::RetrievalUnavailable { backend, reason };
        let k_param = k.to_string();

        let response = self
            .http
            .get(url)
            .query(&[("q", query), ("k", k_param.as_str())])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    unavailable(format!("request to {url} timed out"))
                } else {
                    unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("{url} returned HTTP {}", status.as_u16())));
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| unavailable(format!("malformed response: {e}")))?;

        Ok(parsed
            .docs
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, d)| ScoredResult {
                document: Document {
                    id: d.id.unwrap_or_else(|| format!("{backend}-{rank}")),
                    title: d.title,
                    text: d.text,
                    source: backend,
                },
                score: d.score.unwrap_or(0.0),
                rank,
            })
            .collect())
    }
}

impl Retriever for RetrievalClient {
    /// `k` below 1 is raised to 1.
    fn retrieve_outcome(&self, query: &str, k: usize, backend: Backend) -> RetrievalOutcome {
        let k = k.max(1);
        let Some(url) = self.endpoint(backend) else {
            debug!(%backend, "no endpoint configured, using stub result");
            return RetrievalOutcome {
                results: vec![stub_result(query, backend)],
                degraded: Some(format!("no {backend} endpoint configured")),
            };
        };

        match self.fetch(url, query, k, backend) {
            Ok(results) => {
                debug!(%backend, hits = results.len(), "retrieval ok");
                RetrievalOutcome { results, degraded: None }
            }
            Err(e) => {
                warn!(%backend, error = %e, "retrieval failed, using stub result");
                RetrievalOutcome { results: vec![stub_result(query, backend)], degraded: Some(e.to_string()) }
            }
        }
    }
}
