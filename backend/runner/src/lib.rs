//! Session runner and episode scheduler.
//!
//! `run_session` drives one agent through one environment session and owns
//! every termination rule; `run_episodes` fans a batch of sessions out over a
//! bounded worker pool (or runs them in order for rate-limited backends).

pub mod episodes;
pub mod session;

pub use episodes::{EpisodePlan, RunReport, SessionFailure, run_episodes, session_range};
pub use session::{SessionLimits, SessionOutcome, Termination, run_session};
