//! Prompt assembly for each strategy family.
//!
//! Every prompt is `fixed prefix + trimmed history + cue`. The fixed prefix
//! (template, seed observation or instruction and plan) is never truncated;
//! only the oldest turns of the history are dropped to fit the context.

use webrun_core::AvailableActions;

use crate::context_window::{ContextWindow, tail_chars};
use crate::session_state::Session;

/// Longest available-action hint spliced into a prompt, in characters.
pub const ACTION_HINT_MAX_CHARS: usize = 3000;

const ACTION_CUE: &str = "\n\nAction:";

pub struct PromptBuilder;

impl PromptBuilder {
    /// One-shot demonstration + seed observation + history.
    pub fn reactive(template: &str, session: &Session, window: &ContextWindow) -> String {
        let seed = session.seed_observation();
        if session.is_first_step() {
            return format!("{template}{seed}{ACTION_CUE}");
        }
        let prefix = format!("{template}{seed}\n\n");
        let history = session.history();
        let history = window.fit(&prefix, &history);
        format!("{prefix}{history}{ACTION_CUE}")
    }

    /// Instructions + seed observation + history + available-action hint.
    ///
    /// The hint counts against the budget but sits after the history, right
    /// before the cue.
    pub fn zero_shot(
        template: &str,
        session: &Session,
        window: &ContextWindow,
        available: &AvailableActions,
    ) -> String {
        let seed = session.seed_observation();
        let hint = Self::available_action_hint(available);
        let actions_prompt = format!(
            "current available action is {}",
            tail_chars(&hint, ACTION_HINT_MAX_CHARS)
        );
        if session.is_first_step() {
            return format!("{template}{seed}{actions_prompt}{ACTION_CUE}");
        }
        let prefix = format!("{template}{seed}\n\n");
        let history = session.history();
        let history = window.fit(&format!("{prefix}{actions_prompt}"), &history);
        format!("{prefix}{history}{actions_prompt}{ACTION_CUE}")
    }

    /// Acting template + instruction + plan + history.
    pub fn planned(template: &str, session: &Session, window: &ContextWindow) -> String {
        let plan = session.plan.as_deref().unwrap_or("");
        let prefix = format!(
            "{template}\n\nInstruction: {}\nPlan: {plan}\n\n",
            session.task
        );
        if session.is_first_step() {
            return format!("{prefix}Action:");
        }
        let history = session.history();
        let history = window.fit(&prefix, &history);
        // history blocks already end with a blank line
        format!("{prefix}{history}Action:")
    }

    /// Plan-generation prompt for `task`.
    pub fn planning(template: &str, task: &str) -> String {
        format!("{template}\n\nInstruction: {task}\nPlan:")
    }

    /// `{search}` while the search bar is up, otherwise the tab-joined click
    /// targets.
    pub fn available_action_hint(available: &AvailableActions) -> String {
        if available.has_search() {
            "{search}".to_string()
        } else if available.has_click() {
            format!("click: [{}]", available.clickables.join("\t"))
        } else {
            String::new()
        }
    }
}
