//! Run configuration schema.
//!
//! Every field is optional in the file; [`crate::apply_all_defaults`] fills
//! the gaps and the accessors fall back to the same defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use webrun_llm::RetryPolicy;

use crate::defaults::*;

/// Root configuration of a webrun batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Registered agent name, e.g. `React_Webrun_Agent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    /// Model context budget in tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_len: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,

    /// Worker pool size for non-rate-limited backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Rejected actions tolerated per session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_invalid_actions: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionsConfig>,

    /// Base URL of the shopping environment server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageKind>,

    /// YAML file overriding the built-in prompt templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name as the provider knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Usually `${OPENROUTER_API_KEY}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Force sequential scheduling regardless of the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limited: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenRouter,
    Ollama,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Json,
    Sqlite,
}

/// Session ids `{prefix}{i}` for `start <= i < end`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl RunConfig {
    pub fn agent_name(&self) -> &str {
        self.agent_name.as_deref().unwrap_or(DEFAULT_AGENT_NAME)
    }

    pub fn llm_name(&self) -> &str {
        self.llm
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .unwrap_or(DEFAULT_LLM_NAME)
    }

    pub fn provider(&self) -> Provider {
        self.llm
            .as_ref()
            .and_then(|l| l.provider)
            .unwrap_or(Provider::OpenRouter)
    }

    pub fn temperature(&self) -> f32 {
        self.llm
            .as_ref()
            .and_then(|l| l.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.llm
            .as_ref()
            .and_then(|l| l.retry.clone())
            .unwrap_or_default()
    }

    pub fn max_context_len(&self) -> usize {
        self.max_context_len.unwrap_or(DEFAULT_MAX_CONTEXT_LEN)
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps.unwrap_or(DEFAULT_MAX_STEPS)
    }

    pub fn workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS)
    }

    pub fn max_invalid_actions(&self) -> usize {
        self.max_invalid_actions.unwrap_or(DEFAULT_MAX_INVALID_ACTIONS)
    }

    /// `(prefix, start, end)` of the session range.
    pub fn session_range(&self) -> (&str, usize, usize) {
        let s = self.sessions.as_ref();
        (
            s.and_then(|s| s.prefix.as_deref()).unwrap_or(DEFAULT_SESSION_PREFIX),
            s.and_then(|s| s.start).unwrap_or(DEFAULT_SESSION_START),
            s.and_then(|s| s.end).unwrap_or(DEFAULT_SESSION_END),
        )
    }

    pub fn env_url(&self) -> &str {
        self.env_url.as_deref().unwrap_or(DEFAULT_ENV_URL)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn storage(&self) -> StorageKind {
        self.storage.unwrap_or(StorageKind::Json)
    }

    /// Per-run output folder name, `{agent}_{llm}`.
    pub fn destination(&self) -> String {
        format!("{}_{}", self.agent_name(), self.llm_name().replace('/', "-"))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_yaml() {
        let yaml = r#"
agent_name: Planner_Webrun_Agent
llm:
  name: meta-llama/llama-3-8b-instruct
  provider: openrouter
  retry:
    max_attempts: 5
sessions:
  end: 10
storage: sqlite
"#;
        let cfg: RunConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.agent_name(), "Planner_Webrun_Agent");
        assert_eq!(cfg.retry_policy().max_attempts, 5);
        assert_eq!(cfg.retry_policy().base_delay_ms, RetryPolicy::default().base_delay_ms);
        assert_eq!(cfg.session_range(), ("fixed_", 0, 10));
        assert_eq!(cfg.storage(), StorageKind::Sqlite);
        assert_eq!(cfg.max_context_len(), DEFAULT_MAX_CONTEXT_LEN);
    }

    #[test]
    fn destination_is_filesystem_safe() {
        let cfg = RunConfig {
            llm: Some(LlmConfig {
                name: Some("meta-llama/llama-3-8b".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(cfg.destination(), "React_Webrun_Agent_meta-llama-llama-3-8b");
    }
}
