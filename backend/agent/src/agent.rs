//! Single-role agents and the capability interface every agent exposes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use webrun_core::{AvailableActions, LlmBackend, SessionId, SessionSink, WebrunError};

use crate::context_window::ContextWindow;
use crate::identity::{AgentIdentity, AgentKind};
use crate::prompts::PromptTemplates;
use crate::session_state::Session;
use crate::strategy::Strategy;

/// What the session runner drives.
///
/// An agent may hold many sessions but every call names the session it acts
/// on; there is no implicit current session.
#[async_trait]
pub trait WebAgent: Send + Sync {
    fn identity(&self) -> &AgentIdentity;

    /// Start (or restart) `session` with `task`. Previous history is dropped.
    fn new_session(&mut self, session: &SessionId, task: &str);

    /// Append the items the environment surfaced on the latest step.
    fn add_retrieved_item(
        &mut self,
        session: &SessionId,
        items: Vec<String>,
    ) -> Result<(), WebrunError>;

    /// Generate the session plan if the strategy plans. Runs the backend at
    /// most once per session; later calls return the memoized plan.
    async fn planning(&mut self, session: &SessionId) -> Result<Option<String>, WebrunError>;

    /// Record `observation`, ask the backend for the next action, record and
    /// return it.
    async fn forward(
        &mut self,
        session: &SessionId,
        observation: &str,
        available: &AvailableActions,
    ) -> Result<String, WebrunError>;

    /// Persist the session's history.
    async fn save(&self, session: &SessionId) -> Result<(), WebrunError>;

    /// The session's history as the agent currently sees it.
    fn session(&self, session: &SessionId) -> Option<&Session>;
}

/// Everything an agent is wired to. Cheap to clone.
#[derive(Clone)]
pub struct AgentDeps {
    pub llm: Arc<dyn LlmBackend>,
    pub window: ContextWindow,
    pub templates: Arc<PromptTemplates>,
    pub sink: Arc<dyn SessionSink>,
    /// Where `save` writes, interpreted by the sink.
    pub destination: String,
    /// Sampling temperature for the strategies that sample.
    pub temperature: f32,
}

/// An agent running one [`Strategy`].
pub struct StrategyAgent {
    identity: AgentIdentity,
    strategy: Strategy,
    deps: AgentDeps,
    sessions: HashMap<SessionId, Session>,
}

impl StrategyAgent {
    pub fn new(strategy: Strategy, deps: AgentDeps) -> Self {
        Self {
            identity: AgentIdentity::new(strategy.kind()),
            strategy,
            deps,
            sessions: HashMap::new(),
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.identity.kind
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    fn session_mut(&mut self, session: &SessionId) -> Result<&mut Session, WebrunError> {
        self.sessions
            .get_mut(session)
            .ok_or_else(|| WebrunError::UnknownSession(session.to_string()))
    }
}

#[async_trait]
impl WebAgent for StrategyAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    fn new_session(&mut self, session: &SessionId, task: &str) {
        debug!(agent = %self.identity.name, session = %session, "New session");
        self.sessions.insert(session.clone(), Session::new(task));
    }

    fn add_retrieved_item(
        &mut self,
        session: &SessionId,
        items: Vec<String>,
    ) -> Result<(), WebrunError> {
        self.session_mut(session)?.item_recall.push(items);
        Ok(())
    }

    async fn planning(&mut self, session: &SessionId) -> Result<Option<String>, WebrunError> {
        let Some(planning) = self.strategy.planning() else {
            return Ok(None);
        };
        let state = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| WebrunError::UnknownSession(session.to_string()))?;
        if let Some(plan) = &state.plan {
            return Ok(Some(plan.clone()));
        }

        let plan = planning.generate(&self.deps.llm, &state.task).await?;
        info!(agent = %self.identity.name, session = %session, plan = %plan, "Plan generated");
        state.plan = Some(plan.clone());
        Ok(Some(plan))
    }

    #[instrument(skip(self, observation, available), fields(agent = %self.identity.name))]
    async fn forward(
        &mut self,
        session: &SessionId,
        observation: &str,
        available: &AvailableActions,
    ) -> Result<String, WebrunError> {
        let state = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| WebrunError::UnknownSession(session.to_string()))?;
        state.observations.push(observation.to_string());

        let prompt =
            self.strategy
                .build_prompt(&self.deps.templates, state, &self.deps.window, available);
        debug!(prompt_chars = prompt.len(), turn = state.actions.len(), "Calling LLM");

        let response = self
            .deps
            .llm
            .complete(&self.strategy.request(prompt))
            .await
            .map_err(|e| WebrunError::Backend {
                backend: self.deps.llm.name().to_string(),
                message: e.to_string(),
            })?;

        let action = self.strategy.postprocess(&response.content, available);
        debug!(raw = %response.content, action = %action, "Action chosen");
        state.actions.push(action.clone());
        Ok(action)
    }

    async fn save(&self, session: &SessionId) -> Result<(), WebrunError> {
        let state = self
            .sessions
            .get(session)
            .ok_or_else(|| WebrunError::UnknownSession(session.to_string()))?;
        let record = state.to_record(session, self.identity.kind.as_str());
        self.deps
            .sink
            .save(&record, &self.deps.destination)
            .await
            .map_err(|e| WebrunError::Storage(e.to_string()))?;
        info!(agent = %self.identity.name, session = %session, turns = state.actions.len() - 1, "Session saved");
        Ok(())
    }

    fn session(&self, session: &SessionId) -> Option<&Session> {
        self.sessions.get(session)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use webrun_core::NO_RESPONSE;
    use webrun_llm::MockBackend;

    fn sid() -> SessionId {
        SessionId::from("fixed_0")
    }

    #[tokio::test]
    async fn forward_records_observation_then_action() {
        let llm = Arc::new(MockBackend::new("mock").with_script(["search[red mug]"]));
        let mut agent = StrategyAgent::new(Strategy::Zeroshot, deps(llm, Arc::default()));
        agent.new_session(&sid(), "buy a red mug");

        let action = agent
            .forward(&sid(), "seed page", &AvailableActions::search())
            .await
            .unwrap();

        assert_eq!(action, "search[red mug]");
        let s = agent.session(&sid()).unwrap();
        assert_eq!(s.actions, vec!["reset", "search[red mug]"]);
        assert_eq!(s.observations, vec!["seed page"]);
    }

    #[tokio::test]
    async fn forward_without_session_is_an_error() {
        let llm = Arc::new(MockBackend::new("mock"));
        let mut agent = StrategyAgent::new(Strategy::React, deps(llm, Arc::default()));
        let err = agent
            .forward(&sid(), "page", &AvailableActions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WebrunError::UnknownSession(_)));
    }

    #[tokio::test]
    async fn react_prompt_grows_with_history() {
        let llm = Arc::new(MockBackend::new("mock").with_script(["search[mug]", "click[b01]"]));
        let mut agent = StrategyAgent::new(Strategy::React, deps(llm.clone(), Arc::default()));
        agent.new_session(&sid(), "buy a mug");
        agent.forward(&sid(), "SEED", &AvailableActions::search()).await.unwrap();
        agent.forward(&sid(), "RESULTS", &AvailableActions::clicks(["b01"])).await.unwrap();

        let prompts: Vec<String> = llm.requests().into_iter().map(|r| r.prompt).collect();
        assert!(prompts[0].ends_with("SEED\n\nAction:"));
        assert!(prompts[1].ends_with("SEED\n\nAction: search[mug]\nObservation: RESULTS\n\n\n\nAction:"));
    }

    #[tokio::test]
    async fn planning_is_memoized() {
        let llm = Arc::new(MockBackend::new("mock").with_script(["plan A", "plan B"]));
        let t = PromptTemplates::default();
        let strategy = Strategy::for_kind(AgentKind::Planner, &t, 0.9).unwrap();
        let mut agent = StrategyAgent::new(strategy, deps(llm.clone(), Arc::default()));
        agent.new_session(&sid(), "buy a lamp");

        assert_eq!(agent.planning(&sid()).await.unwrap().as_deref(), Some("plan A"));
        assert_eq!(agent.planning(&sid()).await.unwrap().as_deref(), Some("plan A"));
        assert_eq!(llm.call_count(), 1);
        assert_eq!(agent.session(&sid()).unwrap().plan.as_deref(), Some("plan A"));
    }

    #[tokio::test]
    async fn no_response_is_never_memoized_as_plan() {
        let llm = Arc::new(MockBackend::new("mock").with_script([NO_RESPONSE, "plan B"]));
        let t = PromptTemplates::default();
        let strategy = Strategy::for_kind(AgentKind::Planner, &t, 0.9).unwrap();
        let mut agent = StrategyAgent::new(strategy, deps(llm.clone(), Arc::default()));
        agent.new_session(&sid(), "buy a lamp");

        let err = agent.planning(&sid()).await.unwrap_err();
        assert!(matches!(err, WebrunError::Backend { .. }));
        assert_eq!(agent.session(&sid()).unwrap().plan, None);
        assert_eq!(agent.planning(&sid()).await.unwrap().as_deref(), Some("plan B"));
    }

    #[tokio::test]
    async fn non_planning_strategy_returns_no_plan() {
        let llm = Arc::new(MockBackend::new("mock"));
        let mut agent = StrategyAgent::new(Strategy::Zeroshot, deps(llm.clone(), Arc::default()));
        agent.new_session(&sid(), "task");
        assert_eq!(agent.planning(&sid()).await.unwrap(), None);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn save_writes_history_and_recall() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("click[Buy Now]"));
        let mut agent = StrategyAgent::new(Strategy::Zeroshot, deps(llm, sink.clone()));
        agent.new_session(&sid(), "task");
        agent.add_retrieved_item(&sid(), vec!["B01".into()]).unwrap();
        agent
            .forward(&sid(), "item page", &AvailableActions::clicks(["Buy Now"]))
            .await
            .unwrap();
        agent.save(&sid()).await.unwrap();

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        let (record, destination) = &saved[0];
        assert_eq!(destination, "test-run");
        assert_eq!(record.actions, vec!["reset", "click[Buy Now]"]);
        assert_eq!(record.item_recall, vec![vec!["B01".to_string()]]);
    }

    #[tokio::test]
    async fn new_session_resets_history() {
        let llm = Arc::new(MockBackend::new("mock").with_response("search[x]"));
        let mut agent = StrategyAgent::new(Strategy::Zeroshot, deps(llm, Arc::default()));
        agent.new_session(&sid(), "first");
        agent.forward(&sid(), "page", &AvailableActions::search()).await.unwrap();
        agent.new_session(&sid(), "second");

        let s = agent.session(&sid()).unwrap();
        assert_eq!(s.task, "second");
        assert_eq!(s.actions, vec!["reset"]);
        assert!(s.observations.is_empty());
    }
}
