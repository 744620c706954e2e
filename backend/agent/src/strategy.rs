//! The closed set of prompting strategies.

use webrun_core::{AvailableActions, LlmRequest};

use crate::action_parser::parse_action;
use crate::context_window::ContextWindow;
use crate::identity::AgentKind;
use crate::planning::Planning;
use crate::prompts::PromptTemplates;
use crate::session_state::Session;
use crate::system_prompt::PromptBuilder;

/// How a single-role agent turns its session into the next action.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// One-shot demonstration, raw output.
    React,
    /// Zero-shot instructions with the available-action hint.
    Zeroshot,
    /// Zero-shot with a reasoning step; sampled, single line.
    ZeroshotThink { temperature: f32 },
    /// Plan once, then act on the one-shot plan template.
    Planner(Planning),
    /// Plan once with the reactive plan template, then act on its one-shot.
    PlannerReact(Planning),
    /// Search role of the controller.
    SearchRole,
    /// Click role of the controller.
    ClickRole,
}

impl Strategy {
    /// Strategy for a single-role kind; `None` for the controller, which is
    /// composed of two single-role agents.
    pub fn for_kind(kind: AgentKind, templates: &PromptTemplates, temperature: f32) -> Option<Self> {
        let strategy = match kind {
            AgentKind::React => Strategy::React,
            AgentKind::Zeroshot => Strategy::Zeroshot,
            AgentKind::ZeroshotThink => Strategy::ZeroshotThink { temperature },
            AgentKind::Planner => Strategy::Planner(Planning::new(&templates.plan, temperature)),
            AgentKind::PlannerReact => {
                Strategy::PlannerReact(Planning::new(&templates.plan_react, temperature))
            }
            AgentKind::SearchRole => Strategy::SearchRole,
            AgentKind::ClickRole => Strategy::ClickRole,
            AgentKind::SearchClickController => return None,
        };
        Some(strategy)
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            Strategy::React => AgentKind::React,
            Strategy::Zeroshot => AgentKind::Zeroshot,
            Strategy::ZeroshotThink { .. } => AgentKind::ZeroshotThink,
            Strategy::Planner(_) => AgentKind::Planner,
            Strategy::PlannerReact(_) => AgentKind::PlannerReact,
            Strategy::SearchRole => AgentKind::SearchRole,
            Strategy::ClickRole => AgentKind::ClickRole,
        }
    }

    pub fn planning(&self) -> Option<&Planning> {
        match self {
            Strategy::Planner(planning) | Strategy::PlannerReact(planning) => Some(planning),
            _ => None,
        }
    }

    pub fn build_prompt(
        &self,
        templates: &PromptTemplates,
        session: &Session,
        window: &ContextWindow,
        available: &AvailableActions,
    ) -> String {
        match self {
            Strategy::React => PromptBuilder::reactive(&templates.oneshot, session, window),
            Strategy::Zeroshot => {
                PromptBuilder::zero_shot(&templates.zeroshot, session, window, available)
            }
            Strategy::ZeroshotThink { .. } => {
                PromptBuilder::zero_shot(&templates.zeroshot_think, session, window, available)
            }
            Strategy::Planner(_) => PromptBuilder::planned(&templates.oneshot_plan, session, window),
            Strategy::PlannerReact(_) => {
                PromptBuilder::planned(&templates.oneshot_plan_react, session, window)
            }
            Strategy::SearchRole => {
                PromptBuilder::zero_shot(&templates.search_agent, session, window, available)
            }
            Strategy::ClickRole => {
                PromptBuilder::zero_shot(&templates.click_agent, session, window, available)
            }
        }
    }

    pub fn request(&self, prompt: String) -> LlmRequest {
        match self {
            Strategy::ZeroshotThink { temperature } => LlmRequest::new(prompt)
                .with_temperature(*temperature)
                .with_stop(["\n"]),
            _ => LlmRequest::new(prompt),
        }
    }

    /// Turn raw model output into the action to record.
    pub fn postprocess(&self, raw: &str, available: &AvailableActions) -> String {
        match self {
            Strategy::React => raw.to_string(),
            Strategy::Planner(_) | Strategy::PlannerReact(_) => {
                parse_action(raw.trim_start_matches(' '), available)
            }
            Strategy::Zeroshot
            | Strategy::ZeroshotThink { .. }
            | Strategy::SearchRole
            | Strategy::ClickRole => parse_action(raw.trim_start(), available),
        }
    }
}
