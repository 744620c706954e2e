//! Two-role agent: a search role while the search bar is up, a click role
//! once only click targets remain.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use webrun_core::{AvailableActions, SessionId, SessionSink, WebrunError};

use crate::agent::{AgentDeps, StrategyAgent, WebAgent};
use crate::identity::{AgentIdentity, AgentKind};
use crate::session_state::Session;
use crate::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Search,
    Click,
}

impl Role {
    fn for_actions(available: &AvailableActions) -> Self {
        if available.has_search() {
            Role::Search
        } else {
            Role::Click
        }
    }
}

/// Composes a search-role and a click-role agent. Each role keeps its own
/// prompt history. The controller keeps the session timeline both roles act
/// on (every observation, action and recall entry in order), and that
/// timeline is what `save` persists.
pub struct ControlAgent {
    identity: AgentIdentity,
    search: StrategyAgent,
    click: StrategyAgent,
    active: HashMap<SessionId, Role>,
    timelines: HashMap<SessionId, Session>,
    sink: Arc<dyn SessionSink>,
    destination: String,
}

impl ControlAgent {
    pub fn new(deps: AgentDeps) -> Self {
        Self {
            identity: AgentIdentity::new(AgentKind::SearchClickController),
            sink: deps.sink.clone(),
            destination: deps.destination.clone(),
            search: StrategyAgent::new(Strategy::SearchRole, deps.clone()),
            click: StrategyAgent::new(Strategy::ClickRole, deps),
            active: HashMap::new(),
            timelines: HashMap::new(),
        }
    }

    /// Role that acted last in `session`; search until the first switch.
    pub fn active_role(&self, session: &SessionId) -> Role {
        self.active.get(session).copied().unwrap_or(Role::Search)
    }

    /// The history `role` prompts with.
    pub fn role_session(&self, role: Role, session: &SessionId) -> Option<&Session> {
        match role {
            Role::Search => self.search.session(session),
            Role::Click => self.click.session(session),
        }
    }

    fn timeline_mut(&mut self, session: &SessionId) -> Result<&mut Session, WebrunError> {
        self.timelines
            .get_mut(session)
            .ok_or_else(|| WebrunError::UnknownSession(session.to_string()))
    }

    fn role_agent_mut(&mut self, role: Role) -> &mut StrategyAgent {
        match role {
            Role::Search => &mut self.search,
            Role::Click => &mut self.click,
        }
    }
}

#[async_trait]
impl WebAgent for ControlAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    fn new_session(&mut self, session: &SessionId, task: &str) {
        self.search.new_session(session, task);
        self.click.new_session(session, task);
        self.active.insert(session.clone(), Role::Search);
        self.timelines.insert(session.clone(), Session::new(task));
    }

    fn add_retrieved_item(
        &mut self,
        session: &SessionId,
        items: Vec<String>,
    ) -> Result<(), WebrunError> {
        self.timeline_mut(session)?.item_recall.push(items);
        Ok(())
    }

    async fn planning(&mut self, _session: &SessionId) -> Result<Option<String>, WebrunError> {
        Ok(None)
    }

    async fn forward(
        &mut self,
        session: &SessionId,
        observation: &str,
        available: &AvailableActions,
    ) -> Result<String, WebrunError> {
        self.timeline_mut(session)?
            .observations
            .push(observation.to_string());

        let role = Role::for_actions(available);
        let previous = self.active.insert(session.clone(), role);
        if previous.is_some_and(|p| p != role) {
            info!(agent = %self.identity.name, session = %session, ?role, "Switching role");
        }
        let action = self
            .role_agent_mut(role)
            .forward(session, observation, available)
            .await?;

        self.timeline_mut(session)?.actions.push(action.clone());
        Ok(action)
    }

    async fn save(&self, session: &SessionId) -> Result<(), WebrunError> {
        let timeline = self
            .timelines
            .get(session)
            .ok_or_else(|| WebrunError::UnknownSession(session.to_string()))?;
        let record = timeline.to_record(session, self.identity.kind.as_str());
        self.sink
            .save(&record, &self.destination)
            .await
            .map_err(|e| WebrunError::Storage(e.to_string()))?;
        info!(agent = %self.identity.name, session = %session, turns = timeline.actions.len() - 1, "Session saved");
        Ok(())
    }

    fn session(&self, session: &SessionId) -> Option<&Session> {
        self.timelines.get(session)
    }
}
