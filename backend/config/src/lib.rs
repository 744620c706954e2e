//! `webrun-config`: run configuration for webrun batches.
//!
//! Provides:
//! - Typed run schema (agent, LLM backend, limits, session range, output)
//! - YAML loading and JSON merge-patch overrides
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with error/warning report
//! - Redacted snapshots for display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{apply_merge_patch, config_dir, config_file_path, load_config};
pub use redact::redact;
pub use schema::{LlmConfig, Provider, RunConfig, SessionsConfig, StorageKind};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load, patch, apply env substitution, apply defaults and validate.
///
/// `overrides` is a JSON merge patch applied before substitution (used for
/// command-line flags). Validation errors abort; warnings are logged.
pub async fn load_and_prepare(path: &Path, overrides: Option<&Value>) -> Result<RunConfig> {
    let mut config = load_config(path).await?;
    if let Some(patch) = overrides {
        config = apply_merge_patch(&config, patch)?;
    }
    prepare(config)
}

/// The in-memory half of [`load_and_prepare`].
pub fn prepare(config: RunConfig) -> Result<RunConfig> {
    let value = serde_json::to_value(&config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: RunConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.first() {
        bail!("{} ({} error(s) total)", first, report.errors.len());
    }

    Ok(config)
}
