//! Agent kinds and naming.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Every agent the runtime can build, including the two controller roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    React,
    Zeroshot,
    ZeroshotThink,
    Planner,
    PlannerReact,
    SearchClickController,
    SearchRole,
    ClickRole,
}

impl AgentKind {
    /// Kinds selectable from a run configuration.
    pub const SELECTABLE: [AgentKind; 6] = [
        AgentKind::React,
        AgentKind::Zeroshot,
        AgentKind::ZeroshotThink,
        AgentKind::Planner,
        AgentKind::PlannerReact,
        AgentKind::SearchClickController,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::React => "React_Webrun_Agent",
            AgentKind::Zeroshot => "Zeroshot_Webrun_Agent",
            AgentKind::ZeroshotThink => "ZeroshotThink_Webrun_Agent",
            AgentKind::Planner => "Planner_Webrun_Agent",
            AgentKind::PlannerReact => "PlannerReact_Webrun_Agent",
            AgentKind::SearchClickController => "Search_Click_Controller_Webrun_Agent",
            AgentKind::SearchRole => "Search_Webrun_Agent",
            AgentKind::ClickRole => "Click_Webrun_Agent",
        }
    }

    /// Resolve a configured agent name. Only selectable kinds resolve.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "React_Webrun_Agent" => Some(AgentKind::React),
            "Zeroshot_Webrun_Agent" => Some(AgentKind::Zeroshot),
            "ZeroshotThink_Webrun_Agent" => Some(AgentKind::ZeroshotThink),
            "Planner_Webrun_Agent" => Some(AgentKind::Planner),
            "PlannerReact_Webrun_Agent" => Some(AgentKind::PlannerReact),
            "Search_Click_Controller_Webrun_Agent" | "Search_Click_Control_Webrun_Agent" => {
                Some(AgentKind::SearchClickController)
            }
            _ => None,
        }
    }

    /// Names accepted by [`AgentKind::from_name`].
    pub fn selectable_names() -> Vec<String> {
        let mut names: Vec<String> = Self::SELECTABLE
            .iter()
            .map(|k| k.as_str().to_string())
            .collect();
        names.push("Search_Click_Control_Webrun_Agent".to_string());
        names
    }

    pub fn uses_planning(&self) -> bool {
        matches!(self, AgentKind::Planner | AgentKind::PlannerReact)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind plus a per-instance name, `{kind}_{created_at_millis}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub kind: AgentKind,
    pub name: String,
}

impl AgentIdentity {
    pub fn new(kind: AgentKind) -> Self {
        Self {
            kind,
            name: format!("{}_{}", kind, Utc::now().timestamp_millis()),
        }
    }
}
