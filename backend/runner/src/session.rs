//! Drives one agent through one environment session.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use webrun_agent::{WebAgent, extract_instruction};
use webrun_core::{
    Environment, EnvError, SessionEventKind, SessionId, WebrunError, HANDLE_EXCEPTION,
    INVALID_ACTION_OBSERVATION, NO_RESPONSE, RESET_ACTION,
};
use webrun_logging::SessionEventLogger;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The environment reported `done`.
    Done,
    /// The backend gave up (`No response` or a backend error).
    BackendExhausted,
    /// Too many rejected actions.
    InvalidActionLimit,
    /// The environment hit a fatal condition.
    HandleException,
    /// `max_steps` turns without `done`.
    StepLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session_id: SessionId,
    pub reward: f64,
    pub steps: usize,
    pub invalid_actions: usize,
    pub termination: Termination,
}

/// Limits applied to every session.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_steps: usize,
    /// Rejections tolerated; one more ends the session.
    pub max_invalid_actions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_steps: 50,
            max_invalid_actions: 3,
        }
    }
}

/// Run `session` to completion.
///
/// Every termination path saves the session exactly once before returning.
/// Environment transport failures and storage failures are returned as
/// errors; everything else ends in a [`SessionOutcome`].
pub async fn run_session(
    agent: &mut dyn WebAgent,
    env: &dyn Environment,
    session: &SessionId,
    limits: SessionLimits,
) -> Result<SessionOutcome, WebrunError> {
    let events = SessionEventLogger::new(agent.identity().name.clone());

    let reset = env.step(session, RESET_ACTION).await?;
    let task = extract_instruction(&reset.observation);
    agent.new_session(session, &task);
    agent.add_retrieved_item(session, reset.retrieved_items.clone())?;
    events.log(session, 0, SessionEventKind::SessionStarted, json!({ "task": task }));

    let mut observation = reset.observation.clone();
    let mut available = reset.available_actions();
    let mut invalid_actions = 0;

    let finish = |termination: Termination, reward: f64, steps: usize, invalid: usize| {
        SessionOutcome {
            session_id: session.clone(),
            reward,
            steps,
            invalid_actions: invalid,
            termination,
        }
    };

    match agent.planning(session).await {
        Ok(Some(plan)) if plan.contains(NO_RESPONSE) => {
            warn!(session = %session, "Planning got no response");
            let outcome = finish(Termination::BackendExhausted, 0.0, 0, 0);
            return conclude(agent, session, &events, outcome).await;
        }
        Ok(Some(plan)) => {
            events.log(session, 0, SessionEventKind::PlanGenerated, json!({ "plan": plan }));
            observation = plan;
        }
        Ok(None) => {}
        Err(WebrunError::Backend { backend, message }) => {
            warn!(session = %session, backend = %backend, error = %message, "Planning failed");
            let outcome = finish(Termination::BackendExhausted, 0.0, 0, 0);
            return conclude(agent, session, &events, outcome).await;
        }
        Err(e) => return Err(e),
    }

    for step in 1..=limits.max_steps {
        let action = match agent.forward(session, &observation, &available).await {
            Ok(action) => action.trim_start_matches(' ').to_string(),
            Err(WebrunError::Backend { backend, message }) => {
                warn!(session = %session, backend = %backend, error = %message, "Backend failed");
                let outcome = finish(Termination::BackendExhausted, 0.0, step, invalid_actions);
                return conclude(agent, session, &events, outcome).await;
            }
            Err(e) => return Err(e),
        };
        events.log(session, step, SessionEventKind::ActionChosen, json!({ "action": action }));

        if action.contains(NO_RESPONSE) {
            let outcome = finish(Termination::BackendExhausted, 0.0, step, invalid_actions);
            return conclude(agent, session, &events, outcome).await;
        }

        match env.step(session, &action).await {
            Ok(result) => {
                agent.add_retrieved_item(session, result.retrieved_items.clone())?;
                events.log(
                    session,
                    step,
                    SessionEventKind::ObservationReceived,
                    json!({ "reward": result.reward, "done": result.done }),
                );
                if result.done {
                    let outcome = finish(Termination::Done, result.reward, step, invalid_actions);
                    return conclude(agent, session, &events, outcome).await;
                }
                if result.observation.contains(HANDLE_EXCEPTION) {
                    let outcome =
                        finish(Termination::HandleException, 0.0, step, invalid_actions);
                    return conclude(agent, session, &events, outcome).await;
                }
                available = result.available_actions();
                observation = result.observation;
            }
            Err(EnvError::InvalidAction(reason)) => {
                invalid_actions += 1;
                debug!(session = %session, action = %action, reason = %reason, invalid_actions, "Action rejected");
                events.log(
                    session,
                    step,
                    SessionEventKind::ActionRejected,
                    json!({ "action": action, "reason": reason }),
                );
                if invalid_actions > limits.max_invalid_actions {
                    let outcome =
                        finish(Termination::InvalidActionLimit, 0.0, step, invalid_actions);
                    return conclude(agent, session, &events, outcome).await;
                }
                observation = INVALID_ACTION_OBSERVATION.to_string();
            }
            Err(e) => {
                agent.save(session).await?;
                return Err(e.into());
            }
        }
    }

    let outcome = finish(Termination::StepLimit, 0.0, limits.max_steps, invalid_actions);
    conclude(agent, session, &events, outcome).await
}

async fn conclude(
    agent: &mut dyn WebAgent,
    session: &SessionId,
    events: &SessionEventLogger,
    outcome: SessionOutcome,
) -> Result<SessionOutcome, WebrunError> {
    agent.save(session).await?;
    events.log(
        session,
        outcome.steps,
        SessionEventKind::SessionTerminated,
        json!({ "reward": outcome.reward, "termination": outcome.termination }),
    );
    info!(
        session = %session,
        reward = outcome.reward,
        steps = outcome.steps,
        termination = ?outcome.termination,
        "Session finished"
    );
    Ok(outcome)
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use webrun_agent::{AgentDeps, ContextWindow, PromptTemplates, select_agent};
    use webrun_core::{LlmBackend, LlmRequest, LlmResponse, StepResult};
    use webrun_llm::{MockBackend, RetryPolicy, RetryingBackend};

    use super::test_support::*;
    use super::*;

    fn agent(name: &str, llm: Arc<dyn LlmBackend>, sink: Arc<MemorySink>) -> Box<dyn WebAgent> {
        let deps = AgentDeps {
            llm,
            window: ContextWindow::new(1700, Arc::new(CharTokenizer)),
            templates: Arc::new(PromptTemplates::default()),
            sink,
            destination: "run".into(),
            temperature: 0.9,
        };
        select_agent(name, deps).unwrap()
    }

    fn sid() -> SessionId {
        SessionId::from("fixed_0")
    }

    fn bought(reward: f64) -> StepResult {
        StepResult {
            observation: "Thank you for shopping".into(),
            reward,
            done: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn done_returns_reward_and_saves_once() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_script(["search[red mug]", "click[Buy Now]"]));
        let env = ScriptedEnv::new(vec![
            Ok(page("results", &["Buy Now"])),
            Ok(bought(0.75)),
        ]);
        let mut agent = agent("Zeroshot_Webrun_Agent", llm, sink.clone());

        let outcome = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::Done);
        assert_eq!(outcome.reward, 0.75);
        assert_eq!(outcome.steps, 2);
        assert_eq!(sink.saves_of("fixed_0"), 1);
        assert_eq!(env.actions(), vec!["reset", "search[red mug]", "click[Buy Now]"]);
        let record = &sink.saved.lock().unwrap()[0];
        assert_eq!(record.actions, vec!["reset", "search[red mug]", "click[Buy Now]"]);
    }

    #[tokio::test]
    async fn fourth_rejection_ends_with_zero() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("dance"));
        let env = ScriptedEnv::new(
            (0..10)
                .map(|_| Err(EnvError::InvalidAction("unknown verb".into())))
                .collect(),
        );
        let mut agent = agent("Zeroshot_Webrun_Agent", llm, sink.clone());

        let outcome = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::InvalidActionLimit);
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(outcome.invalid_actions, 4);
        assert_eq!(env.actions().len(), 5);
        assert_eq!(sink.saves_of("fixed_0"), 1);
        let record = &sink.saved.lock().unwrap()[0];
        assert_eq!(record.observations[1], INVALID_ACTION_OBSERVATION);
    }

    #[tokio::test]
    async fn rejections_accumulate_across_valid_steps() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let bad = || Err(EnvError::InvalidAction("bad".into()));
        let env = ScriptedEnv::new(vec![
            bad(),
            bad(),
            Ok(page("results", &["search"])),
            bad(),
            Ok(page("results", &["search"])),
            bad(),
        ]);
        let mut agent = agent("Zeroshot_Webrun_Agent", llm, sink.clone());

        let outcome = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::InvalidActionLimit);
        assert_eq!(outcome.steps, 6);
    }

    #[tokio::test]
    async fn handle_exception_ends_with_zero() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let env = ScriptedEnv::new(vec![Ok(page("server handle_exception raised", &[]))]);
        let mut agent = agent("React_Webrun_Agent", llm, sink.clone());

        let outcome = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::HandleException);
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(sink.saves_of("fixed_0"), 1);
    }

    #[tokio::test]
    async fn no_response_ends_and_still_saves() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response(NO_RESPONSE));
        let env = ScriptedEnv::new(vec![]);
        let mut agent = agent("React_Webrun_Agent", llm, sink.clone());

        let outcome = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::BackendExhausted);
        assert_eq!(outcome.steps, 1);
        assert_eq!(env.actions(), vec!["reset"]);
        assert_eq!(sink.saves_of("fixed_0"), 1);
    }

    #[tokio::test]
    async fn step_limit_returns_zero() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("click[Back to Search]"));
        let env = ScriptedEnv::new(vec![]);
        let mut agent = agent("Zeroshot_Webrun_Agent", llm.clone(), sink.clone());
        let limits = SessionLimits {
            max_steps: 5,
            max_invalid_actions: 3,
        };

        let outcome = run_session(agent.as_mut(), &env, &sid(), limits).await.unwrap();

        assert_eq!(outcome.termination, Termination::StepLimit);
        assert_eq!(outcome.steps, 5);
        assert_eq!(llm.call_count(), 5);
        assert_eq!(sink.saves_of("fixed_0"), 1);
    }

    #[tokio::test]
    async fn plan_becomes_seed_observation() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(
            MockBackend::new("mock").with_script(["search for the mug then buy it", "search[red mug]"]),
        );
        let env = ScriptedEnv::new(vec![Ok(bought(1.0))]);
        let mut agent = agent("Planner_Webrun_Agent", llm.clone(), sink.clone());

        let outcome = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        assert_eq!(outcome.reward, 1.0);
        let requests = llm.requests();
        assert_eq!(requests[0].stop, vec!["\n"]);
        assert!(requests[0].prompt.ends_with("Instruction: buy a red mug\nPlan:"));
        assert!(requests[1].prompt.contains("Plan: search for the mug then buy it"));
        let record = &sink.saved.lock().unwrap()[0];
        assert_eq!(record.observations[0], "search for the mug then buy it");
    }

    struct DownBackend;

    #[async_trait::async_trait]
    impl LlmBackend for DownBackend {
        fn name(&self) -> &str {
            "down"
        }

        async fn complete(&self, _request: &LlmRequest) -> anyhow::Result<LlmResponse> {
            anyhow::bail!("503 service unavailable")
        }
    }

    #[tokio::test]
    async fn exhausted_planning_ends_before_first_step() {
        let sink = Arc::new(MemorySink::default());
        let policy = RetryPolicy {
            max_attempts: 1,
            base_delay_ms: 0,
            jitter: false,
            ..Default::default()
        };
        let llm = Arc::new(RetryingBackend::new(Arc::new(DownBackend), policy));
        let env = ScriptedEnv::new(vec![]);
        let mut agent = agent("Planner_Webrun_Agent", llm, sink.clone());

        let outcome = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        assert_eq!(outcome.termination, Termination::BackendExhausted);
        assert_eq!(outcome.steps, 0);
        assert_eq!(env.actions(), vec!["reset"]);
        assert_eq!(agent.session(&sid()).unwrap().plan, None);
        assert_eq!(sink.saves_of("fixed_0"), 1);
        let record = &sink.saved.lock().unwrap()[0];
        assert!(record.observations.is_empty());
        assert_eq!(record.actions, vec!["reset"]);
    }

    #[tokio::test]
    async fn transport_failure_saves_then_errors() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let env = ScriptedEnv::new(vec![Err(EnvError::Transport("connection reset".into()))]);
        let mut agent = agent("React_Webrun_Agent", llm, sink.clone());

        let err = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap_err();

        assert!(matches!(err, WebrunError::Environment(EnvError::Transport(_))));
        assert_eq!(sink.saves_of("fixed_0"), 1);
    }

    #[tokio::test]
    async fn controller_record_keeps_search_phase() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(
            MockBackend::new("mock").with_script(["search[red mug]", "click[Buy Now]"]),
        );
        let mut results = page("results", &["Buy Now"]);
        results.retrieved_items = vec!["B01".into()];
        let env = ScriptedEnv::new(vec![Ok(results), Ok(bought(1.0))]);
        let mut agent = agent("Search_Click_Controller_Webrun_Agent", llm, sink.clone());

        let outcome = run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        assert_eq!(outcome.reward, 1.0);
        assert_eq!(env.actions(), vec!["reset", "search[red mug]", "click[Buy Now]"]);
        assert_eq!(sink.saves_of("fixed_0"), 1);
        let record = &sink.saved.lock().unwrap()[0];
        assert_eq!(record.actions, vec!["reset", "search[red mug]", "click[Buy Now]"]);
        assert_eq!(record.item_recall.len(), 3);
        assert!(record.item_recall[0].is_empty());
        assert_eq!(record.item_recall[1], vec!["B01"]);
    }

    #[tokio::test]
    async fn recall_includes_reset_step() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("click[Buy Now]"));
        let mut results = page("results", &["Buy Now"]);
        results.retrieved_items = vec!["B01".into(), "B02".into()];
        let env = ScriptedEnv::new(vec![Ok(results), Ok(bought(1.0))]);
        let mut agent = agent("Zeroshot_Webrun_Agent", llm, sink.clone());

        run_session(agent.as_mut(), &env, &sid(), SessionLimits::default())
            .await
            .unwrap();

        let record = &sink.saved.lock().unwrap()[0];
        assert_eq!(record.item_recall.len(), 3);
        assert!(record.item_recall[0].is_empty());
        assert_eq!(record.item_recall[1], vec!["B01", "B02"]);
    }
}
