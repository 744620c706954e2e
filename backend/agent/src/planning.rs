//! One-time plan generation shared by the planning strategies.

use std::sync::Arc;

use webrun_core::{LlmBackend, LlmRequest, NO_RESPONSE, WebrunError};

use crate::system_prompt::PromptBuilder;

/// Token cap for a generated plan.
pub const MAX_PLAN_TOKENS: u32 = 256;

/// Generates a single-line plan from a plan template and the task.
#[derive(Debug, Clone, PartialEq)]
pub struct Planning {
    template: String,
    temperature: f32,
    max_plan_tokens: u32,
}

impl Planning {
    pub fn new(template: impl Into<String>, temperature: f32) -> Self {
        Self {
            template: template.into(),
            temperature,
            max_plan_tokens: MAX_PLAN_TOKENS,
        }
    }

    /// The request that produces the plan: stops at the first newline.
    pub fn request(&self, task: &str) -> LlmRequest {
        LlmRequest::new(PromptBuilder::planning(&self.template, task))
            .with_temperature(self.temperature)
            .with_stop(["\n"])
            .with_max_tokens(self.max_plan_tokens)
    }

    /// Generate the plan. A `No response` answer is a backend failure, never
    /// a plan.
    pub async fn generate(&self, llm: &Arc<dyn LlmBackend>, task: &str) -> Result<String, WebrunError> {
        let response = llm
            .complete(&self.request(task))
            .await
            .map_err(|e| WebrunError::Backend {
                backend: llm.name().to_string(),
                message: e.to_string(),
            })?;
        if response.content.contains(NO_RESPONSE) {
            return Err(WebrunError::Backend {
                backend: llm.name().to_string(),
                message: "retry budget exhausted while planning".to_string(),
            });
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_request_is_single_line_and_capped() {
        let planning = Planning::new("PLAN", 0.9);
        let req = planning.request("buy a lamp");
        assert_eq!(req.prompt, "PLAN\n\nInstruction: buy a lamp\nPlan:");
        assert_eq!(req.stop, vec!["\n"]);
        assert_eq!(req.max_tokens, Some(MAX_PLAN_TOKENS));
        assert_eq!(req.temperature, Some(0.9));
    }

    #[tokio::test]
    async fn exhausted_backend_is_not_a_plan() {
        let llm: Arc<dyn LlmBackend> =
            Arc::new(webrun_llm::MockBackend::new("mock").with_response(NO_RESPONSE));
        let err = Planning::new("PLAN", 0.9)
            .generate(&llm, "buy a lamp")
            .await
            .unwrap_err();
        assert!(matches!(err, WebrunError::Backend { .. }));
    }
}
