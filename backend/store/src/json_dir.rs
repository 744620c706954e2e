use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use webrun_core::{SessionId, SessionRecord, SessionSink};

/// One JSON file per session at `{root}/{destination}/{session_id}.json`.
/// Saving a session again overwrites its file.
pub struct JsonDirSink {
    root: PathBuf,
}

impl JsonDirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_path(&self, destination: &str, session: &SessionId) -> PathBuf {
        self.root
            .join(destination)
            .join(format!("{}.json", session.as_str()))
    }

    /// Read back a saved session, `None` if it was never saved.
    pub async fn load(&self, destination: &str, session: &SessionId) -> Result<Option<SessionRecord>> {
        let path = self.session_path(destination, session);
        if !path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(record))
    }
}

#[async_trait]
impl SessionSink for JsonDirSink {
    async fn save(&self, record: &SessionRecord, destination: &str) -> Result<()> {
        let dir = self.root.join(destination);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = self.session_path(destination, &record.session_id);
        let body = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "Session written");
        Ok(())
    }

    async fn executed_sessions(&self, destination: &str) -> Result<Vec<SessionId>> {
        let dir = self.root.join(destination);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to list {}", dir.display()))?;
        let mut sessions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                sessions.push(SessionId::from(stem));
            }
        }
        sessions.sort();
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, actions: &[&str]) -> SessionRecord {
        SessionRecord {
            session_id: SessionId::from(id),
            agent: "React_Webrun_Agent".into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            observations: vec!["seed".into()],
            item_recall: vec![vec!["B01".into()]],
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(tmp.path());
        sink.save(&record("fixed_0", &["reset"]), "React_mock").await.unwrap();

        assert!(tmp.path().join("React_mock/fixed_0.json").exists());
        let loaded = sink
            .load("React_mock", &SessionId::from("fixed_0"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.actions, vec!["reset"]);
        assert_eq!(loaded.item_recall, vec![vec!["B01".to_string()]]);
    }

    #[tokio::test]
    async fn resave_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(tmp.path());
        sink.save(&record("fixed_0", &["reset"]), "run").await.unwrap();
        sink.save(&record("fixed_0", &["reset", "search[x]"]), "run").await.unwrap();

        let loaded = sink.load("run", &SessionId::from("fixed_0")).await.unwrap().unwrap();
        assert_eq!(loaded.actions.len(), 2);
        assert_eq!(sink.executed_sessions("run").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn executed_sessions_lists_json_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(tmp.path());
        assert!(sink.executed_sessions("run").await.unwrap().is_empty());

        sink.save(&record("fixed_2", &["reset"]), "run").await.unwrap();
        sink.save(&record("fixed_1", &["reset"]), "run").await.unwrap();
        std::fs::write(tmp.path().join("run/notes.txt"), "x").unwrap();

        let ids = sink.executed_sessions("run").await.unwrap();
        assert_eq!(ids, vec![SessionId::from("fixed_1"), SessionId::from("fixed_2")]);
    }
}
