//! Telemetry and structured logging for webrun.
//!
//! Console plus daily-rotated NDJSON file output, session event logging, and
//! secret redaction.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::SessionEventLogger;
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
