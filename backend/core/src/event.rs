use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// Something that happened during a session, as emitted to the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: SessionId,
    pub agent: String,
    pub step: usize,
    pub timestamp: DateTime<Utc>,
    pub kind: SessionEventKind,
    pub payload: serde_json::Value,
}

/// Categories of events that can occur during a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    /// The environment was reset and the agent got its task
    SessionStarted,
    /// A planning strategy produced its plan
    PlanGenerated,
    /// The agent chose an action
    ActionChosen,
    /// The environment rejected the action
    ActionRejected,
    /// The environment answered with an observation
    ObservationReceived,
    /// The session ended (any path)
    SessionTerminated,
}

impl SessionEvent {
    pub fn new(
        session_id: SessionId,
        agent: impl Into<String>,
        step: usize,
        kind: SessionEventKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            session_id,
            agent: agent.into(),
            step,
            timestamp: Utc::now(),
            kind,
            payload,
        }
    }
}

impl std::fmt::Display for SessionEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}
