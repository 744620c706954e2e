use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use webrun_core::{SessionId, SessionRecord, SessionSink};

/// SQLite-backed session store. One row per `(destination, session_id)`;
/// saving again replaces the row.
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// Open or create the store at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let sink = Self {
            conn: Mutex::new(conn),
        };
        sink.init_schema()?;
        info!(path = %path, "Session store opened");
        Ok(sink)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite")?;
        let sink = Self {
            conn: Mutex::new(conn),
        };
        sink.init_schema()?;
        Ok(sink)
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("session store connection poisoned"))
    }

    fn init_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                destination TEXT NOT NULL,
                session_id TEXT NOT NULL,
                agent TEXT NOT NULL,
                actions TEXT NOT NULL,
                observations TEXT NOT NULL,
                item_recall TEXT NOT NULL,
                saved_at TEXT NOT NULL,
                PRIMARY KEY (destination, session_id)
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_destination ON sessions(destination);",
        )?;
        Ok(())
    }

    /// Read back a saved session.
    pub fn load(&self, destination: &str, session: &SessionId) -> Result<Option<SessionRecord>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT agent, actions, observations, item_recall, saved_at
                 FROM sessions WHERE destination = ?1 AND session_id = ?2",
                params![destination, session.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((agent, actions, observations, item_recall, saved_at)) = row else {
            return Ok(None);
        };
        Ok(Some(SessionRecord {
            session_id: session.clone(),
            agent,
            actions: serde_json::from_str(&actions)?,
            observations: serde_json::from_str(&observations)?,
            item_recall: serde_json::from_str(&item_recall)?,
            saved_at: DateTime::parse_from_rfc3339(&saved_at)?.with_timezone(&Utc),
        }))
    }

    /// Count saved sessions under `destination`.
    pub fn count(&self, destination: &str) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM sessions WHERE destination = ?1",
            params![destination],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl SessionSink for SqliteSink {
    async fn save(&self, record: &SessionRecord, destination: &str) -> Result<()> {
        let actions = serde_json::to_string(&record.actions)?;
        let observations = serde_json::to_string(&record.observations)?;
        let item_recall = serde_json::to_string(&record.item_recall)?;
        self.conn()?.execute(
            "INSERT INTO sessions (destination, session_id, agent, actions, observations, item_recall, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(destination, session_id) DO UPDATE SET
                agent = excluded.agent,
                actions = excluded.actions,
                observations = excluded.observations,
                item_recall = excluded.item_recall,
                saved_at = excluded.saved_at",
            params![
                destination,
                record.session_id.as_str(),
                record.agent,
                actions,
                observations,
                item_recall,
                record.saved_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn executed_sessions(&self, destination: &str) -> Result<Vec<SessionId>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT session_id FROM sessions WHERE destination = ?1 ORDER BY session_id ASC",
        )?;
        let sessions = stmt
            .query_map(params![destination], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .map(SessionId::from)
            .collect();
        Ok(sessions)
    }
}
