//! Session Event Logger
//!
//! Session lifecycle events written to the `session_events` tracing target,
//! which lands in the rolling NDJSON log.

use serde_json::Value;
use tracing::info;

use webrun_core::{SessionEvent, SessionEventKind, SessionId};

use crate::redact::redact_sensitive_data;

/// Emits [`SessionEvent`]s for one agent.
#[derive(Debug, Clone)]
pub struct SessionEventLogger {
    agent: String,
}

impl SessionEventLogger {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
        }
    }

    /// Build, redact and log an event. Returns it for callers that keep a trail.
    pub fn log(
        &self,
        session: &SessionId,
        step: usize,
        kind: SessionEventKind,
        payload: Value,
    ) -> SessionEvent {
        let event = SessionEvent::new(
            session.clone(),
            self.agent.clone(),
            step,
            kind,
            redact_value(payload),
        );
        info!(
            target: "session_events",
            session_id = %event.session_id,
            agent = %event.agent,
            step = event.step,
            kind = %event.kind,
            payload = %event.payload,
            "Session event"
        );
        event
    }
}

fn redact_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(redact_sensitive_data(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(redact_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, redact_value(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_is_redacted() {
        let logger = SessionEventLogger::new("React_Webrun_Agent");
        let event = logger.log(
            &SessionId::from("fixed_0"),
            3,
            SessionEventKind::ActionChosen,
            json!({"action": "search[lamp]", "debug": ["Bearer abc.def"]}),
        );
        assert_eq!(event.payload["action"], "search[lamp]");
        assert_eq!(event.payload["debug"][0], "[REDACTED_TOKEN]");
        assert_eq!(event.step, 3);
        assert_eq!(event.agent, "React_Webrun_Agent");
    }
}
