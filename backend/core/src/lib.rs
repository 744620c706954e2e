//! Shared vocabulary of the webrun agent runtime.
//!
//! Holds the session/action types every other crate speaks, the traits for
//! the external collaborators the agents are driven against (LLM backend,
//! shopping environment, tokenizer, persistence sink) and the error taxonomy.

pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use error::{EnvError, WebrunError};
pub use event::{SessionEvent, SessionEventKind};
pub use traits::{Environment, LlmBackend, LlmRequest, LlmResponse, SessionSink, Tokenizer};
pub use types::{
    AvailableActions, SessionId, SessionRecord, StepResult, HANDLE_EXCEPTION,
    INVALID_ACTION_OBSERVATION, NO_RESPONSE, RESET_ACTION,
};
