//! Config validation: every problem found in one pass, with field paths.

use crate::schema::{Provider, RunConfig};
use thiserror::Error;
use webrun_agent::AgentKind;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &RunConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_agent(config, &mut report);
    validate_llm(config, &mut report);
    validate_limits(config, &mut report);
    validate_sessions(config, &mut report);
    validate_env(config, &mut report);
    report
}

fn validate_agent(config: &RunConfig, report: &mut ValidationReport) {
    let name = config.agent_name();
    if AgentKind::from_name(name).is_none() {
        report.error(
            "agent_name",
            format!(
                "Invalid agent name '{name}'. Allowed values are {:?}",
                AgentKind::selectable_names()
            ),
        );
    }
}

fn validate_llm(config: &RunConfig, report: &mut ValidationReport) {
    let Some(llm) = &config.llm else { return };
    if llm.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        report.error("llm.name", "Model name cannot be empty");
    }
    if config.provider() == Provider::OpenRouter
        && llm.api_key.as_deref().map(str::is_empty).unwrap_or(true)
    {
        report.error("llm.api_key", "OpenRouter requires an API key");
    }
    if let Some(t) = llm.temperature {
        if !(0.0..=2.0).contains(&t) {
            report.error("llm.temperature", format!("Temperature {t} outside [0, 2]"));
        }
    }
    if let Some(retry) = &llm.retry {
        if retry.max_attempts == 0 {
            report.error("llm.retry.max_attempts", "max_attempts must be >= 1");
        }
    }
}

fn validate_limits(config: &RunConfig, report: &mut ValidationReport) {
    if config.max_context_len() == 0 {
        report.error("max_context_len", "max_context_len must be > 0");
    }
    if config.max_steps() == 0 {
        report.error("max_steps", "max_steps must be >= 1");
    }
    if config.workers() == 0 {
        report.error("workers", "workers must be >= 1");
    }
}

fn validate_sessions(config: &RunConfig, report: &mut ValidationReport) {
    let (prefix, start, end) = config.session_range();
    if start > end {
        report.error("sessions", format!("start ({start}) is after end ({end})"));
    } else if start == end {
        report.warn("sessions", "Session range is empty; nothing will run");
    }
    if prefix.contains('/') {
        report.error("sessions.prefix", "Prefix cannot contain '/'");
    }
}

fn validate_env(config: &RunConfig, report: &mut ValidationReport) {
    let url = config.env_url();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error("env_url", format!("'{url}' is not an http(s) URL"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LlmConfig, SessionsConfig};

    fn mock_llm() -> Option<LlmConfig> {
        Some(LlmConfig {
            provider: Some(Provider::Mock),
            ..Default::default()
        })
    }

    #[test]
    fn default_mock_config_is_valid() {
        let cfg = RunConfig {
            llm: mock_llm(),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn unknown_agent_lists_allowed_names() {
        let cfg = RunConfig {
            agent_name: Some("React".into()),
            llm: mock_llm(),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "agent_name");
        assert!(report.errors[0].message.contains("React_Webrun_Agent"));
    }

    #[test]
    fn openrouter_needs_key() {
        let cfg = RunConfig::default();
        let report = validate(&cfg);
        assert!(report.is_valid(), "llm section absent means nothing to check");

        let cfg = crate::apply_all_defaults(RunConfig::default());
        let report = validate(&cfg);
        assert!(report.errors.iter().any(|e| e.path == "llm.api_key"));
    }

    #[test]
    fn zero_limits_and_reversed_range_are_errors() {
        let cfg = RunConfig {
            llm: mock_llm(),
            workers: Some(0),
            max_context_len: Some(0),
            sessions: Some(SessionsConfig {
                start: Some(10),
                end: Some(5),
                prefix: None,
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        let paths: Vec<&str> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"workers"));
        assert!(paths.contains(&"max_context_len"));
        assert!(paths.contains(&"sessions"));
    }

    #[test]
    fn empty_range_is_a_warning() {
        let cfg = RunConfig {
            llm: mock_llm(),
            sessions: Some(SessionsConfig {
                start: Some(3),
                end: Some(3),
                prefix: None,
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }
}
