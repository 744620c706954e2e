//! `webrun validate-config`: show the effective config and every problem in it.

use std::path::Path;

use anyhow::{bail, Context, Result};

use webrun_config::{
    apply_all_defaults, apply_merge_patch, collect_referenced_vars, load_config, redact,
    resolve_env_vars, validate, RunConfig,
};

use crate::config::Overrides;
use crate::terminal_output::{note_error, note_info, note_success, note_warn};

pub async fn run(config_path: &Path, overrides: &Overrides) -> Result<()> {
    let raw = load_config(config_path).await?;
    let raw = apply_merge_patch(&raw, &overrides.to_patch())?;

    let value = serde_json::to_value(&raw)?;
    let vars = collect_referenced_vars(&value);
    if !vars.is_empty() {
        note_info(&format!("Environment variables referenced: {}", vars.join(", ")));
    }
    let resolved = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: RunConfig = serde_json::from_value(resolved)?;
    let config = apply_all_defaults(config);

    println!("{}", serde_json::to_string_pretty(&redact(&config))?);

    let report = validate(&config);
    for warning in &report.warnings {
        note_warn(&warning.to_string());
    }
    for error in &report.errors {
        note_error(&error.to_string());
    }
    if !report.is_valid() {
        bail!("{} config error(s)", report.errors.len());
    }
    note_success(&format!("Config OK ({})", config_path.display()));
    Ok(())
}
