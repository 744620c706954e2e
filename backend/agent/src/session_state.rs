//! Per-session history tracker.

use chrono::Utc;
use webrun_core::{RESET_ACTION, SessionId, SessionRecord};

/// One session's task and turn history.
///
/// `actions[0]` is always the reset sentinel. `forward` pushes the incoming
/// observation first and the chosen action second, so `actions[i]` pairs with
/// `observations[i]` (the observation that action produced) and
/// `observations[0]` is the seed page.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub task: String,
    pub actions: Vec<String>,
    pub observations: Vec<String>,
    pub item_recall: Vec<Vec<String>>,
    /// Memoized plan, planning strategies only.
    pub plan: Option<String>,
}

impl Session {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            actions: vec![RESET_ACTION.to_string()],
            observations: Vec::new(),
            item_recall: Vec::new(),
            plan: None,
        }
    }

    /// True until the agent has chosen its first action.
    pub fn is_first_step(&self) -> bool {
        self.actions.len() <= 1
    }

    /// The seed observation, empty before the first `forward`.
    pub fn seed_observation(&self) -> &str {
        self.observations.first().map(String::as_str).unwrap_or("")
    }

    /// Render the turns after the reset as `Action: a\nObservation: o\n\n` blocks.
    pub fn history(&self) -> String {
        let mut history = String::new();
        for (action, observation) in self
            .actions
            .iter()
            .zip(self.observations.iter())
            .skip(1)
        {
            history.push_str("Action: ");
            history.push_str(action);
            history.push_str("\nObservation: ");
            history.push_str(observation);
            history.push_str("\n\n");
        }
        history
    }

    pub fn to_record(&self, session_id: &SessionId, agent: &str) -> SessionRecord {
        SessionRecord {
            session_id: session_id.clone(),
            agent: agent.to_string(),
            actions: self.actions.clone(),
            observations: self.observations.clone(),
            item_recall: self.item_recall.clone(),
            saved_at: Utc::now(),
        }
    }
}
