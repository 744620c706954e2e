use thiserror::Error;

/// Top-level error type for the webrun runtime.
#[derive(Debug, Error)]
pub enum WebrunError {
    #[error("unknown agent '{name}'; allowed values are {allowed:?}")]
    UnknownAgent { name: String, allowed: Vec<String> },

    #[error("no active session '{0}'; call new_session first")]
    UnknownSession(String),

    #[error("LLM backend error ({backend}): {message}")]
    Backend { backend: String, message: String },

    #[error(transparent)]
    Environment(#[from] EnvError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised by a shopping environment on `step`.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The environment rejected the action. Recoverable: the runner counts it
    /// and substitutes an "Invalid action!" observation.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// The environment could not be reached or answered garbage.
    #[error("environment transport failure: {0}")]
    Transport(String),
}
