use figment::Jail;

use mhqa_core::config::{expand_path, Config};
use mhqa_core::error::Error;

const BASE: &str = r#"
[pipeline]
topk_sparse = 5
topk_dense = 5
use_llm = true

[retrieval]
timeout_secs = 3
"#;

#[test]
fn loads_toml_and_applies_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", BASE)?;
        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.pipeline.topk_sparse, 5);
        assert_eq!(settings.merge_k(), 10);
        assert_eq!(settings.retrieval.timeout_secs, 3);
        assert!(settings.retrieval.sparse_url.is_none());
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.llm.top_n, 5);
        Ok(())
    });
}

#[test]
fn env_layers_override_files() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", BASE)?;
        jail.create_file("config.test.toml", "[pipeline]\ntopk_dense = 7\n")?;
        jail.set_env("RUST_ENV", "test");
        jail.set_env("APP_PIPELINE__TOPK_SPARSE", "3");
        jail.set_env("BM25_API_URL", "http://localhost:8001/search");
        jail.set_env("OPENAI_API_KEY", "sk-test");
        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.pipeline.topk_sparse, 3);
        assert_eq!(settings.pipeline.topk_dense, 7);
        assert_eq!(settings.retrieval.sparse_url.as_deref(), Some("http://localhost:8001/search"));
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
        assert!(settings.llm_enabled());
        Ok(())
    });
}

#[test]
fn missing_topk_is_a_configuration_error() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[pipeline]\ntopk_sparse = 5\n")?;
        let err = Config::load().map_err(|e| e.to_string())?.settings().err();
        assert!(matches!(err, Some(Error::InvalidConfig(_))), "got {err:?}");
        Ok(())
    });
}

#[test]
fn zero_topk_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[pipeline]\ntopk_sparse = 0\ntopk_dense = 5\n")?;
        let err = Config::load().map_err(|e| e.to_string())?.settings().err();
        assert!(matches!(err, Some(Error::InvalidConfig(ref m)) if m.contains("topk_sparse")));
        Ok(())
    });
}

#[test]
fn llm_requires_credential() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", BASE)?;
        jail.set_env("OPENAI_API_KEY", "");
        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        assert!(settings.pipeline.use_llm);
        assert!(!settings.llm_enabled(), "no api key means heuristic-only");
        Ok(())
    });
}

#[test]
fn get_reads_nested_keys() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", BASE)?;
        let config = Config::load().map_err(|e| e.to_string())?;
        let k: usize = config.get("pipeline.topk_dense").map_err(|e| e.to_string())?;
        assert_eq!(k, 5);
        assert!(config.get::<usize>("pipeline.nope").is_err());
        Ok(())
    });
}

#[test]
fn overrides_win_over_files_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", BASE)?;
        jail.set_env("APP_PIPELINE__TOPK_SPARSE", "3");
        let settings = Config::load()
            .map_err(|e| e.to_string())?
            .with_override("pipeline.topk_sparse", 9)
            .with_override("pipeline.use_llm", false)
            .settings()
            .map_err(|e| e.to_string())?;
        assert_eq!(settings.pipeline.topk_sparse, 9);
        assert!(!settings.pipeline.use_llm);
        Ok(())
    });
}

#[test]
fn overrides_can_supply_a_missing_topk() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[pipeline]\ntopk_sparse = 5\n")?;
        let settings = Config::load()
            .map_err(|e| e.to_string())?
            .with_override("pipeline.topk_dense", 2)
            .settings()
            .map_err(|e| e.to_string())?;
        assert_eq!(settings.pipeline.topk_dense, 2);
        Ok(())
    });
}

#[test]
fn output_paths_expand_env_vars() {
    Jail::expect_with(|jail| {
        jail.set_env("MHQA_OUT", "/data/runs");
        assert_eq!(expand_path("$MHQA_OUT/t.jsonl"), std::path::PathBuf::from("/data/runs/t.jsonl"));
        assert_eq!(expand_path("plain/t.jsonl"), std::path::PathBuf::from("plain/t.jsonl"));
        Ok(())
    });
}

#[test]
fn endpoint_table_names_a_known_backend() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", BASE)?;
        jail.set_env("APP_RETRIEVAL__ENDPOINTS__BM25", "http://localhost:8001/search");
        let settings = Config::load().map_err(|e| e.to_string())?.settings().map_err(|e| e.to_string())?;
        let sparse = settings.retrieval.endpoint(mhqa_core::types::Backend::Sparse).map_err(|e| e.to_string())?;
        assert_eq!(sparse.as_deref(), Some("http://localhost:8001/search"));
        Ok(())
    });
}

#[test]
fn unknown_backend_selection_is_rejected_at_startup() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            &format!("{BASE}\n[retrieval.endpoints]\ncolbert = \"http://localhost:8003/search\"\n"),
        )?;
        let err = Config::load().map_err(|e| e.to_string())?.settings().err();
        assert!(matches!(err, Some(Error::InvalidConfig(ref m)) if m.contains("colbert")), "got {err:?}");
        Ok(())
    });
}
