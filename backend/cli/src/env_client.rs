//! HTTP client for the shopping environment server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use webrun_core::{EnvError, Environment, SessionId, StepResult};

const STEP_TIMEOUT: Duration = Duration::from_secs(60);

/// Talks to a shopping environment exposing `POST {base_url}/step`.
pub struct HttpEnvironment {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct StepRequest<'a> {
    session_id: &'a str,
    action: &'a str,
}

impl HttpEnvironment {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(STEP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn step_url(&self) -> String {
        format!("{}/step", self.base_url)
    }
}

/// Map a non-success status to an environment error. The server answers
/// 400/422 when it refuses the action itself.
fn classify_failure(status: StatusCode, body: &str) -> EnvError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            EnvError::InvalidAction(body.trim().to_string())
        }
        _ => EnvError::Transport(format!("HTTP {status}: {}", body.trim())),
    }
}

fn parse_step(body: &str) -> Result<StepResult, EnvError> {
    serde_json::from_str(body)
        .map_err(|e| EnvError::Transport(format!("malformed step response: {e}")))
}

#[async_trait]
impl Environment for HttpEnvironment {
    async fn step(&self, session: &SessionId, action: &str) -> Result<StepResult, EnvError> {
        debug!(session = %session, action = %action, "Environment step");
        let response = self
            .client
            .post(self.step_url())
            .json(&StepRequest {
                session_id: session.as_str(),
                action,
            })
            .send()
            .await
            .map_err(|e| EnvError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EnvError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }
        parse_step(&body)
    }
}
