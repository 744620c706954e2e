use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use webrun_core::{LlmBackend, LlmRequest, LlmResponse};

/// A scripted backend: answers with queued responses in order, then with the
/// fixed fallback. Every request is recorded for inspection.
pub struct MockBackend {
    name: String,
    script: Mutex<VecDeque<String>>,
    fallback: String,
    requests: Mutex<Vec<LlmRequest>>,
    rate_limited: bool,
}

impl MockBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: "Mock response".to_string(),
            requests: Mutex::new(Vec::new()),
            rate_limited: false,
        }
    }

    /// Answer every request not covered by the script with `response`.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fallback = response.into();
        self
    }

    /// Queue responses to hand out one per request.
    pub fn with_script<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut script) = self.script.lock() {
            script.extend(responses.into_iter().map(Into::into));
        }
        self
    }

    pub fn with_rate_limit(mut self, rate_limited: bool) -> Self {
        self.rate_limited = rate_limited;
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn rate_limited(&self) -> bool {
        self.rate_limited
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let content = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone());

        Ok(LlmResponse {
            content,
            backend: self.name.clone(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
