//! Episode scheduling: many sessions, one fresh agent each.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use webrun_agent::{AgentDeps, select_agent};
use webrun_core::{Environment, SessionId};

use crate::session::{SessionLimits, SessionOutcome, run_session};

/// Everything needed to run a batch of sessions.
#[derive(Clone)]
pub struct EpisodePlan {
    pub agent_name: String,
    pub deps: AgentDeps,
    pub env: Arc<dyn Environment>,
    pub limits: SessionLimits,
    /// Pool size when running in parallel.
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionFailure {
    pub session_id: SessionId,
    pub error: String,
}

/// Summary of one `run_episodes` call.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub agent: String,
    pub llm: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub parallel: bool,
    pub skipped: usize,
    pub outcomes: Vec<SessionOutcome>,
    pub failures: Vec<SessionFailure>,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn mean_reward(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.outcomes.iter().map(|o| o.reward).sum::<f64>() / self.outcomes.len() as f64
    }

    /// Sessions that earned the full reward.
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.reward >= 1.0).count()
    }
}

/// Session ids `{prefix}{i}` for `i` in `start..end`.
pub fn session_range(prefix: &str, start: usize, end: usize) -> Vec<SessionId> {
    (start..end).map(|i| SessionId::indexed(prefix, i)).collect()
}

/// Run every session not yet present in the sink.
///
/// Uses a pool of `plan.workers` tasks when there are more sessions than
/// workers and the backend is not rate-limited, otherwise runs sequentially.
/// A failing session is recorded in the report and does not stop the run.
pub async fn run_episodes(plan: EpisodePlan, sessions: Vec<SessionId>) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    let executed: HashSet<SessionId> = plan
        .deps
        .sink
        .executed_sessions(&plan.deps.destination)
        .await
        .context("Failed to list executed sessions")?
        .into_iter()
        .collect();
    let total = sessions.len();
    let pending: Vec<SessionId> = sessions
        .into_iter()
        .filter(|s| !executed.contains(s))
        .collect();
    let skipped = total - pending.len();

    let parallel = pending.len() > plan.workers && !plan.deps.llm.rate_limited();
    info!(
        run_id = %run_id,
        agent = %plan.agent_name,
        pending = pending.len(),
        skipped,
        parallel,
        "Starting episodes"
    );

    let mut results = if parallel {
        run_pool(&plan, pending).await
    } else {
        let mut results = Vec::with_capacity(pending.len());
        for (index, session) in pending.into_iter().enumerate() {
            let result = run_one(&plan, &session).await;
            results.push((index, session, result));
        }
        results
    };
    results.sort_by_key(|(index, _, _)| *index);

    let mut outcomes = Vec::new();
    let mut failures = Vec::new();
    for (_, session, result) in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                let error = format!("{e:#}");
                error!(run_id = %run_id, session = %session, error = %error, "Session failed");
                failures.push(SessionFailure {
                    session_id: session,
                    error,
                });
            }
        }
    }

    let report = RunReport {
        run_id,
        agent: plan.agent_name.clone(),
        llm: plan.deps.llm.name().to_string(),
        started_at,
        finished_at: Utc::now(),
        parallel,
        skipped,
        outcomes,
        failures,
    };
    info!(
        run_id = %run_id,
        completed = report.completed(),
        failed = report.failures.len(),
        mean_reward = report.mean_reward(),
        "Done the session running"
    );
    Ok(report)
}

/// Results come back tagged with each session's position in `pending`.
async fn run_pool(
    plan: &EpisodePlan,
    pending: Vec<SessionId>,
) -> Vec<(usize, SessionId, Result<SessionOutcome>)> {
    let permits = Arc::new(Semaphore::new(plan.workers.max(1)));
    let mut tasks = JoinSet::new();
    for (index, session) in pending.into_iter().enumerate() {
        let plan = plan.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => run_isolated(plan, session.clone()).await,
                Err(e) => Err(e.into()),
            };
            (index, session, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(tagged) => results.push(tagged),
            Err(e) => warn!(error = %e, "Session task aborted"),
        }
    }
    results
}

/// Run one session on its own task so a panic becomes a session failure.
async fn run_isolated(plan: EpisodePlan, session: SessionId) -> Result<SessionOutcome> {
    let handle = tokio::spawn(async move { run_one(&plan, &session).await });
    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(anyhow!("session task panicked")),
        Err(e) => Err(anyhow!("session task failed: {e}")),
    }
}

async fn run_one(plan: &EpisodePlan, session: &SessionId) -> Result<SessionOutcome> {
    let mut agent = select_agent(&plan.agent_name, plan.deps.clone())?;
    let outcome = run_session(agent.as_mut(), plan.env.as_ref(), session, plan.limits)
        .await
        .with_context(|| format!("session {session}"))?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::{CharTokenizer, MemorySink, home, page};
    use async_trait::async_trait;
    use webrun_agent::{ContextWindow, PromptTemplates};
    use webrun_core::{EnvError, LlmBackend, SessionSink, StepResult};
    use webrun_llm::MockBackend;

    /// Every session: reset shows the home page, the first action buys.
    /// Sessions listed in `broken` fail at transport level; a session named
    /// `crash` panics.
    struct ShopEnv {
        broken: Vec<SessionId>,
    }

    #[async_trait]
    impl Environment for ShopEnv {
        async fn step(&self, session: &SessionId, action: &str) -> Result<StepResult, EnvError> {
            if self.broken.contains(session) {
                return Err(EnvError::Transport("connection refused".into()));
            }
            if session.as_str() == "crash" {
                panic!("environment crashed");
            }
            if action == "reset" {
                return Ok(home());
            }
            let mut bought = page("Thank you", &[]);
            bought.done = true;
            bought.reward = if session.as_str().ends_with('0') { 1.0 } else { 0.5 };
            Ok(bought)
        }
    }

    fn plan(llm: Arc<dyn LlmBackend>, sink: Arc<MemorySink>, broken: Vec<SessionId>) -> EpisodePlan {
        EpisodePlan {
            agent_name: "Zeroshot_Webrun_Agent".into(),
            deps: AgentDeps {
                llm,
                window: ContextWindow::new(1700, Arc::new(CharTokenizer)),
                templates: Arc::new(PromptTemplates::default()),
                sink,
                destination: "Zeroshot_mock".into(),
                temperature: 0.9,
            },
            env: Arc::new(ShopEnv { broken }),
            limits: SessionLimits::default(),
            workers: 4,
        }
    }

    #[test]
    fn session_range_uses_prefix() {
        let ids = session_range("fixed_", 3, 6);
        assert_eq!(ids, vec!["fixed_3".into(), "fixed_4".into(), SessionId::from("fixed_5")]);
    }

    #[tokio::test]
    async fn pool_runs_every_session() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let report = run_episodes(plan(llm, sink.clone(), vec![]), session_range("fixed_", 0, 10))
            .await
            .unwrap();

        assert!(report.parallel);
        assert_eq!(report.completed(), 10);
        assert_eq!(report.successes(), 1);
        assert!((report.mean_reward() - 0.55).abs() < 1e-9);
        assert_eq!(sink.saved.lock().unwrap().len(), 10);
        assert_eq!(report.outcomes[0].session_id.as_str(), "fixed_0");
    }

    #[tokio::test]
    async fn outcomes_keep_input_order() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let report = run_episodes(plan(llm, sink, vec![]), session_range("fixed_", 0, 12))
            .await
            .unwrap();

        assert!(report.parallel);
        let order: Vec<&str> = report.outcomes.iter().map(|o| o.session_id.as_str()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("fixed_{i}")).collect();
        assert_eq!(order, expected);
    }

    #[tokio::test]
    async fn panicking_session_is_reported_as_failure() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let mut sessions = session_range("fixed_", 0, 5);
        sessions.insert(2, SessionId::from("crash"));
        let report = run_episodes(plan(llm, sink, vec![]), sessions).await.unwrap();

        assert!(report.parallel);
        assert_eq!(report.completed(), 5);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].session_id.as_str(), "crash");
        assert!(report.failures[0].error.contains("panicked"));
    }

    #[tokio::test]
    async fn rate_limited_backend_runs_sequentially() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(
            MockBackend::new("mock")
                .with_response("search[mug]")
                .with_rate_limit(true),
        );
        let report = run_episodes(plan(llm, sink, vec![]), session_range("fixed_", 0, 6))
            .await
            .unwrap();
        assert!(!report.parallel);
        assert_eq!(report.completed(), 6);
    }

    #[tokio::test]
    async fn few_sessions_run_sequentially() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let report = run_episodes(plan(llm, sink, vec![]), session_range("fixed_", 0, 4))
            .await
            .unwrap();
        assert!(!report.parallel);
    }

    #[tokio::test]
    async fn executed_sessions_are_skipped() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let p = plan(llm.clone(), sink.clone(), vec![]);
        run_episodes(p.clone(), session_range("fixed_", 0, 2)).await.unwrap();

        let report = run_episodes(p, session_range("fixed_", 0, 3)).await.unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.completed(), 1);
        assert_eq!(
            sink.executed_sessions("Zeroshot_mock").await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn failing_session_does_not_stop_the_run() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock").with_response("search[mug]"));
        let broken = vec![SessionId::from("fixed_1")];
        let report = run_episodes(plan(llm, sink, broken), session_range("fixed_", 0, 3))
            .await
            .unwrap();
        assert_eq!(report.completed(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].session_id.as_str(), "fixed_1");
    }

    #[tokio::test]
    async fn unknown_agent_is_reported_per_session() {
        let sink = Arc::new(MemorySink::default());
        let llm = Arc::new(MockBackend::new("mock"));
        let mut p = plan(llm, sink, vec![]);
        p.agent_name = "Nope_Agent".into();
        let report = run_episodes(p, session_range("fixed_", 0, 1)).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.contains("unknown agent"));
    }
}
