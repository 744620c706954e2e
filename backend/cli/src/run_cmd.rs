//! `webrun run`: run a batch of sessions and report the rewards.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use webrun_config::{apply_merge_patch, load_config, prepare};
use webrun_logging::init_logger;
use webrun_runner::{run_episodes, session_range, RunReport};

use crate::config::Overrides;
use crate::terminal_output::{note_error, note_info, note_success, note_warn, render_table, Column};
use crate::wiring::build_plan;

pub async fn run(config_path: &Path, overrides: &Overrides, json: bool) -> Result<()> {
    let raw = load_config(config_path).await?;
    let raw = apply_merge_patch(&raw, &overrides.to_patch())?;
    // logger first so config warnings land in the log
    init_logger(raw.log_dir(), raw.log_level());
    let config = prepare(raw)?;

    let plan = build_plan(&config).await?;
    let (prefix, start, end) = config.session_range();
    info!(
        agent = %config.agent_name(),
        llm = %config.llm_name(),
        destination = %config.destination(),
        start,
        end,
        "Running sessions"
    );
    let report = run_episodes(plan, session_range(prefix, start, end)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

pub fn report_rows(report: &RunReport) -> Vec<Vec<String>> {
    report
        .outcomes
        .iter()
        .map(|o| {
            vec![
                o.session_id.to_string(),
                format!("{:.2}", o.reward),
                o.steps.to_string(),
                o.invalid_actions.to_string(),
                serde_json::to_value(o.termination)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
            ]
        })
        .collect()
}

fn print_report(report: &RunReport) {
    if report.skipped > 0 {
        note_info(&format!("{} session(s) already executed, skipped", report.skipped));
    }
    if !report.outcomes.is_empty() {
        let columns = vec![
            Column::left("Session"),
            Column::right("Reward"),
            Column::right("Steps"),
            Column::right("Invalid"),
            Column::left("Ended by"),
        ];
        print!("{}", render_table(&columns, &report_rows(report)));
    }
    for failure in &report.failures {
        note_error(&format!("{}: {}", failure.session_id, failure.error));
    }

    let summary = format!(
        "{} completed, {} succeeded, mean reward {:.3}",
        report.completed(),
        report.successes(),
        report.mean_reward()
    );
    if report.failures.is_empty() {
        note_success(&summary);
    } else {
        note_warn(&format!("{summary}, {} failed", report.failures.len()));
    }
}
