//! Turns a prepared [`RunConfig`] into the collaborators an episode plan needs.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use webrun_agent::{AgentDeps, BpeTokenizer, ContextWindow, PromptTemplates};
use webrun_config::{Provider, RunConfig, StorageKind};
use webrun_core::{LlmBackend, SessionSink};
use webrun_llm::{BackendRegistry, MockBackend, OllamaBackend, OpenRouterBackend, RetryingBackend};
use webrun_runner::{EpisodePlan, SessionLimits};
use webrun_store::{JsonDirSink, SqliteSink};

use crate::env_client::HttpEnvironment;

/// File the SQLite sink keeps under the output directory.
pub const SQLITE_FILE: &str = "webrun.db";

fn provider_key(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenRouter => "openrouter",
        Provider::Ollama => "ollama",
        Provider::Mock => "mock",
    }
}

/// Every provider that can be built from `config`. OpenRouter is only
/// available once an API key is configured.
pub fn backend_registry(config: &RunConfig) -> BackendRegistry {
    let llm = config.llm.clone().unwrap_or_default();
    let model = config.llm_name();

    let mut registry = BackendRegistry::new();
    if let Some(api_key) = llm.api_key.clone() {
        let mut backend = OpenRouterBackend::new(api_key, model);
        if let Some(url) = &llm.base_url {
            backend = backend.with_base_url(url);
        }
        registry.register(provider_key(Provider::OpenRouter), Arc::new(backend));
    }
    let mut ollama = OllamaBackend::new(model);
    if let Some(url) = &llm.base_url {
        ollama = ollama.with_base_url(url);
    }
    registry.register(provider_key(Provider::Ollama), Arc::new(ollama));
    registry.register(provider_key(Provider::Mock), Arc::new(MockBackend::new(model)));
    registry
}

/// Look up the configured provider and wrap it with retry and the rate-limit
/// override.
pub fn build_backend(config: &RunConfig) -> Result<Arc<dyn LlmBackend>> {
    let provider = provider_key(config.provider());
    let registry = backend_registry(config);
    let inner = registry.get(provider).with_context(|| match config.provider() {
        Provider::OpenRouter => "llm.api_key is required for the openrouter provider".to_string(),
        _ => format!(
            "No backend registered for {provider}; available: {}",
            registry.list().join(", ")
        ),
    })?;
    info!(provider, model = %config.llm_name(), "Selected LLM backend");

    let rate_limited = config.llm.as_ref().and_then(|llm| llm.rate_limited);
    Ok(Arc::new(
        RetryingBackend::new(inner, config.retry_policy()).with_rate_limit(rate_limited),
    ))
}

pub async fn load_templates(config: &RunConfig) -> Result<PromptTemplates> {
    match &config.templates_path {
        Some(path) => PromptTemplates::load(path).await,
        None => Ok(PromptTemplates::default()),
    }
}

pub async fn build_sink(config: &RunConfig) -> Result<Arc<dyn SessionSink>> {
    let root = config.output_dir();
    match config.storage() {
        StorageKind::Json => Ok(Arc::new(JsonDirSink::new(root))),
        StorageKind::Sqlite => {
            tokio::fs::create_dir_all(&root)
                .await
                .with_context(|| format!("Failed to create output dir: {}", root.display()))?;
            let path = root.join(SQLITE_FILE);
            Ok(Arc::new(SqliteSink::open(&path.to_string_lossy())?))
        }
    }
}

/// Everything `run_episodes` needs, built from `config`.
pub async fn build_plan(config: &RunConfig) -> Result<EpisodePlan> {
    let llm = build_backend(config)?;
    let tokenizer = BpeTokenizer::for_model(config.llm_name())
        .context("Failed to load a tokenizer")?;
    let templates = load_templates(config).await?;
    let sink = build_sink(config).await?;

    Ok(EpisodePlan {
        agent_name: config.agent_name().to_string(),
        deps: AgentDeps {
            llm,
            window: ContextWindow::new(config.max_context_len(), Arc::new(tokenizer)),
            templates: Arc::new(templates),
            sink,
            destination: config.destination(),
            temperature: config.temperature(),
        },
        env: Arc::new(HttpEnvironment::new(config.env_url())),
        limits: SessionLimits {
            max_steps: config.max_steps(),
            max_invalid_actions: config.max_invalid_actions(),
        },
        workers: config.workers(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrun_config::LlmConfig;

    fn mock_config() -> RunConfig {
        RunConfig {
            llm: Some(LlmConfig {
                name: Some("gpt-3.5-turbo".into()),
                provider: Some(Provider::Mock),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn openrouter_without_key_is_rejected() {
        let mut config = mock_config();
        if let Some(llm) = config.llm.as_mut() {
            llm.provider = Some(Provider::OpenRouter);
        }
        let err = build_backend(&config).err().unwrap();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn registry_offers_openrouter_only_with_a_key() {
        let mut config = mock_config();
        assert_eq!(backend_registry(&config).list(), vec!["mock", "ollama"]);
        if let Some(llm) = config.llm.as_mut() {
            llm.api_key = Some("sk-test".into());
        }
        assert_eq!(backend_registry(&config).list(), vec!["mock", "ollama", "openrouter"]);
    }

    #[test]
    fn configured_provider_is_selected() {
        let mut config = mock_config();
        if let Some(llm) = config.llm.as_mut() {
            llm.provider = Some(Provider::OpenRouter);
            llm.api_key = Some("sk-test".into());
        }
        assert!(build_backend(&config).unwrap().rate_limited());
        if let Some(llm) = config.llm.as_mut() {
            llm.provider = Some(Provider::Ollama);
        }
        assert!(!build_backend(&config).unwrap().rate_limited());
    }

    #[test]
    fn rate_limit_override_reaches_backend() {
        let mut config = mock_config();
        assert!(!build_backend(&config).unwrap().rate_limited());
        if let Some(llm) = config.llm.as_mut() {
            llm.rate_limited = Some(true);
        }
        assert!(build_backend(&config).unwrap().rate_limited());
    }

    #[tokio::test]
    async fn plan_follows_config() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = mock_config();
        config.agent_name = Some("Planner_Webrun_Agent".into());
        config.output_dir = Some(tmp.path().to_path_buf());
        config.storage = Some(StorageKind::Sqlite);
        config.max_steps = Some(12);

        let plan = build_plan(&config).await.unwrap();
        assert_eq!(plan.agent_name, "Planner_Webrun_Agent");
        assert_eq!(plan.deps.destination, "Planner_Webrun_Agent_gpt-3.5-turbo");
        assert_eq!(plan.limits.max_steps, 12);
        assert!(tmp.path().join(SQLITE_FILE).exists());
    }
}
