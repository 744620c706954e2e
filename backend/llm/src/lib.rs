//! LLM backends the webrun agents generate actions with.
//!
//! Every backend implements [`webrun_core::LlmBackend`]. [`RetryingBackend`]
//! wraps any of them with exponential backoff and degrades to the
//! `"No response"` sentinel once the retry budget is spent.

pub mod providers;
pub mod retry;

pub use providers::mock::MockBackend;
pub use providers::ollama::OllamaBackend;
pub use providers::openrouter::OpenRouterBackend;
pub use providers::BackendRegistry;
pub use retry::{RetryPolicy, RetryState, RetryingBackend};
