//! Configuration loader and typed pipeline settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_PIPELINE__TOPK_SPARSE`). The
//! deployment variables `BM25_API_URL`, `DENSE_API_URL` and `OPENAI_API_KEY`
//! are merged last so existing launch scripts keep working.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::Backend;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(legacy_env("BM25_API_URL", "retrieval.sparse_url"))
            .merge(legacy_env("DENSE_API_URL", "retrieval.dense_url"))
            .merge(legacy_env("OPENAI_API_KEY", "llm.api_key"));

        Ok(Self { figment })
    }

    /// Layer a value on top of every other source, e.g. a command-line flag.
    /// `key` may be a dotted path such as `pipeline.topk_sparse`.
    pub fn with_override<T: Serialize>(self, key: &str, value: T) -> Self {
        Self { figment: self.figment.merge(Serialized::default(key, value)) }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Extract and validate the full pipeline settings.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

fn legacy_env(var: &'static str, key: &'static str) -> Env {
    Env::raw().only(&[var]).map(move |_| key.into())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub heuristic: HeuristicSettings,
    #[serde(default)]
    pub batch: BatchSettings,
}

/// Endpoints are optional: an unset backend is served by the stub result.
///
/// `sparse_url`/`dense_url` take precedence over the `[retrieval.endpoints]`
/// table, whose keys name a backend (`sparse`, `bm25` or `dense`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub sparse_url: Option<String>,
    pub dense_url: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub endpoints: BTreeMap<String, String>,
    pub timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { sparse_url: None, dense_url: None, endpoints: BTreeMap::new(), timeout_secs: 20 }
    }
}

impl RetrievalSettings {
    /// Configured URL for `backend`, blank values treated as unset.
    pub fn endpoint(&self, backend: Backend) -> Result<Option<String>> {
        let explicit = match backend {
            Backend::Sparse => self.sparse_url.as_deref(),
            Backend::Dense => self.dense_url.as_deref(),
        };
        if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(Some(url.to_string()));
        }
        for (name, url) in &self.endpoints {
            if name.parse::<Backend>()? == backend && !url.trim().is_empty() {
                return Ok(Some(url.trim().to_string()));
            }
        }
        Ok(None)
    }
}

/// Top-K values have no default here; a config without them is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub topk_sparse: usize,
    pub topk_dense: usize,
    #[serde(default)]
    pub merge_k: Option<usize>,
    #[serde(default)]
    pub use_llm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Evidence documents sent with each completion request.
    pub top_n: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 500,
            timeout_secs: 60,
            top_n: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicSettings {
    /// Share of question key terms a sentence must contain to be picked.
    pub min_overlap: f64,
}

impl Default for HeuristicSettings {
    fn default() -> Self {
        Self { min_overlap: 0.5 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub workers: Option<usize>,
}

impl Settings {
    pub fn new(topk_sparse: usize, topk_dense: usize) -> Self {
        Self {
            retrieval: RetrievalSettings::default(),
            pipeline: PipelineSettings { topk_sparse, topk_dense, merge_k: None, use_llm: false },
            llm: LlmSettings::default(),
            heuristic: HeuristicSettings::default(),
            batch: BatchSettings::default(),
        }
    }

    /// Size of the merged evidence list; defaults to the sum of both top-K.
    pub fn merge_k(&self) -> usize {
        self.pipeline
            .merge_k
            .unwrap_or(self.pipeline.topk_sparse + self.pipeline.topk_dense)
    }

    /// The LLM reader is selected only when enabled and a credential exists;
    /// otherwise every question is answered by the heuristic reader.
    pub fn llm_enabled(&self) -> bool {
        self.pipeline.use_llm && self.llm.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        for name in self.retrieval.endpoints.keys() {
            name.parse::<Backend>()?;
        }
        if self.pipeline.topk_sparse == 0 {
            return Err(Error::InvalidConfig("pipeline.topk_sparse must be >= 1".into()));
        }
        if self.pipeline.topk_dense == 0 {
            return Err(Error::InvalidConfig("pipeline.topk_dense must be >= 1".into()));
        }
        if self.pipeline.merge_k == Some(0) {
            return Err(Error::InvalidConfig("pipeline.merge_k must be >= 1".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::InvalidConfig(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }
        if self.llm.top_n == 0 {
            return Err(Error::InvalidConfig("llm.top_n must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.heuristic.min_overlap) {
            return Err(Error::InvalidConfig(format!(
                "heuristic.min_overlap must be within [0, 1], got {}",
                self.heuristic.min_overlap
            )));
        }
        if self.batch.workers == Some(0) {
            return Err(Error::InvalidConfig("batch.workers must be >= 1".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
