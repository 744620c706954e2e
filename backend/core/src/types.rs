use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Privileged first action of every session; initializes environment state.
pub const RESET_ACTION: &str = "reset";

/// Sentinel an overloaded or rate-limited backend answers with.
pub const NO_RESPONSE: &str = "No response";

/// Observation substituted when the environment rejects an action.
pub const INVALID_ACTION_OBSERVATION: &str = "Invalid action!";

/// Marker the environment puts in an observation when it hit a fatal condition.
pub const HANDLE_EXCEPTION: &str = "handle_exception";

/// Opaque identifier of one environment episode (e.g. `fixed_12`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Session id used by the fixed evaluation split: `{prefix}{index}`.
    pub fn indexed(prefix: &str, index: usize) -> Self {
        Self(format!("{prefix}{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<usize> for SessionId {
    fn from(n: usize) -> Self {
        Self(n.to_string())
    }
}

/// The environment-declared set of legal next actions.
///
/// `has_search_bar` plays the role of the `"search"` key, `clickables` the
/// ordered `"click"` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableActions {
    pub has_search_bar: bool,
    pub clickables: Vec<String>,
}

impl AvailableActions {
    pub fn search() -> Self {
        Self {
            has_search_bar: true,
            clickables: Vec::new(),
        }
    }

    pub fn clicks<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            has_search_bar: false,
            clickables: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Map the environment's raw button labels into available actions.
    ///
    /// A label equal to `search` (any case) flags the search bar; every other
    /// label is a click target, order preserved.
    pub fn from_buttons<S: AsRef<str>>(buttons: &[S]) -> Self {
        let mut actions = Self::default();
        for button in buttons {
            let label = button.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            if label.eq_ignore_ascii_case("search") {
                actions.has_search_bar = true;
            } else {
                actions.clickables.push(label.to_string());
            }
        }
        actions
    }

    pub fn has_search(&self) -> bool {
        self.has_search_bar
    }

    pub fn has_click(&self) -> bool {
        !self.clickables.is_empty()
    }
}

/// What the environment returns for one `step`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: String,
    #[serde(default)]
    pub reward: f64,
    #[serde(default)]
    pub done: bool,
    /// Item identifiers surfaced on this page.
    #[serde(default, alias = "asins")]
    pub retrieved_items: Vec<String>,
    #[serde(default)]
    pub buttons: Vec<String>,
}

impl StepResult {
    pub fn available_actions(&self) -> AvailableActions {
        AvailableActions::from_buttons(&self.buttons)
    }
}

/// A session's persisted history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub agent: String,
    pub actions: Vec<String>,
    pub observations: Vec<String>,
    pub item_recall: Vec<Vec<String>>,
    pub saved_at: DateTime<Utc>,
}
