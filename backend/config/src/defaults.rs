//! Config defaults: applies the run defaults to a parsed config.

use crate::schema::{LlmConfig, Provider, RunConfig, SessionsConfig, StorageKind};

pub const DEFAULT_AGENT_NAME: &str = "React_Webrun_Agent";
pub const DEFAULT_LLM_NAME: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.9;

/// Context budget in tokens.
pub const DEFAULT_MAX_CONTEXT_LEN: usize = 1700;
pub const DEFAULT_MAX_STEPS: usize = 50;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_INVALID_ACTIONS: usize = 3;

/// The fixed evaluation split: `fixed_0` .. `fixed_899`.
pub const DEFAULT_SESSION_PREFIX: &str = "fixed_";
pub const DEFAULT_SESSION_START: usize = 0;
pub const DEFAULT_SESSION_END: usize = 900;

pub const DEFAULT_ENV_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_OUTPUT_DIR: &str = "./execution_data";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: RunConfig) -> RunConfig {
    let config = apply_llm_defaults(config);
    let config = apply_run_defaults(config);
    apply_output_defaults(config)
}

fn apply_llm_defaults(mut config: RunConfig) -> RunConfig {
    let llm = config.llm.get_or_insert_with(LlmConfig::default);
    llm.name.get_or_insert_with(|| DEFAULT_LLM_NAME.to_string());
    llm.provider.get_or_insert(Provider::OpenRouter);
    llm.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    llm.retry.get_or_insert_with(Default::default);
    config
}

fn apply_run_defaults(mut config: RunConfig) -> RunConfig {
    config
        .agent_name
        .get_or_insert_with(|| DEFAULT_AGENT_NAME.to_string());
    config.max_context_len.get_or_insert(DEFAULT_MAX_CONTEXT_LEN);
    config.max_steps.get_or_insert(DEFAULT_MAX_STEPS);
    config.workers.get_or_insert(DEFAULT_WORKERS);
    config
        .max_invalid_actions
        .get_or_insert(DEFAULT_MAX_INVALID_ACTIONS);

    let sessions = config.sessions.get_or_insert_with(SessionsConfig::default);
    sessions.start.get_or_insert(DEFAULT_SESSION_START);
    sessions.end.get_or_insert(DEFAULT_SESSION_END);
    sessions
        .prefix
        .get_or_insert_with(|| DEFAULT_SESSION_PREFIX.to_string());

    config
        .env_url
        .get_or_insert_with(|| DEFAULT_ENV_URL.to_string());
    config
}

fn apply_output_defaults(mut config: RunConfig) -> RunConfig {
    config
        .output_dir
        .get_or_insert_with(|| DEFAULT_OUTPUT_DIR.into());
    config.storage.get_or_insert(StorageKind::Json);
    config.log_dir.get_or_insert_with(|| DEFAULT_LOG_DIR.into());
    config
        .log_level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}
