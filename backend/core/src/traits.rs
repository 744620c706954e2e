use anyhow::Result;
use async_trait::async_trait;

use crate::error::EnvError;
use crate::types::{SessionId, SessionRecord, StepResult};

/// Trait for LLM backends the agents generate actions with.
///
/// Backends own retries and rate limiting; the agents only issue requests.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend name (e.g. "openrouter", "ollama").
    fn name(&self) -> &str;

    /// Whether the backend throttles per request key. Rate-limited backends
    /// are driven sequentially instead of through the worker pool.
    fn rate_limited(&self) -> bool {
        false
    }

    /// Send a completion request and return the generated text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM backend. Unset options fall back to the backend defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmRequest {
    pub prompt: String,
    pub temperature: Option<f32>,
    pub stop: Vec<String>,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from an LLM backend.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub backend: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Counts tokens the way the target model does. Only the length matters.
pub trait Tokenizer: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// The simulated shopping environment.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Apply `action` to the session. `reset` starts the session.
    async fn step(&self, session: &SessionId, action: &str) -> Result<StepResult, EnvError>;
}

/// Where finished sessions are persisted.
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// Persist one session's history under `destination`. Overwrites any
    /// earlier record of the same session.
    async fn save(&self, record: &SessionRecord, destination: &str) -> Result<()>;

    /// Sessions already persisted under `destination`.
    async fn executed_sessions(&self, destination: &str) -> Result<Vec<SessionId>>;
}
