//! Persistence sinks for finished sessions.

pub mod json_dir;
pub mod sqlite;

pub use json_dir::JsonDirSink;
pub use sqlite::SqliteSink;
