//! Command-line overrides, expressed as a JSON merge patch over the file config.

use clap::Args;
use serde_json::{json, Map, Value};

#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Agent to run, e.g. React_Webrun_Agent
    #[arg(long)]
    pub agent_name: Option<String>,
    /// Model name as the provider knows it
    #[arg(long)]
    pub llm_name: Option<String>,
    /// Model context budget in tokens
    #[arg(long)]
    pub max_context_len: Option<usize>,
    /// First session index (inclusive)
    #[arg(long)]
    pub start: Option<usize>,
    /// Last session index (exclusive)
    #[arg(long)]
    pub end: Option<usize>,
    /// Worker pool size
    #[arg(long)]
    pub workers: Option<usize>,
    /// Shopping environment base URL
    #[arg(long)]
    pub env_url: Option<String>,
}

impl Overrides {
    /// Only flags that were given appear in the patch.
    pub fn to_patch(&self) -> Value {
        let mut patch = Map::new();
        if let Some(name) = &self.agent_name {
            patch.insert("agent_name".into(), json!(name));
        }
        if let Some(name) = &self.llm_name {
            patch.insert("llm".into(), json!({ "name": name }));
        }
        if let Some(len) = self.max_context_len {
            patch.insert("max_context_len".into(), json!(len));
        }
        if let Some(workers) = self.workers {
            patch.insert("workers".into(), json!(workers));
        }
        if let Some(url) = &self.env_url {
            patch.insert("env_url".into(), json!(url));
        }

        let mut sessions = Map::new();
        if let Some(start) = self.start {
            sessions.insert("start".into(), json!(start));
        }
        if let Some(end) = self.end {
            sessions.insert("end".into(), json!(end));
        }
        if !sessions.is_empty() {
            patch.insert("sessions".into(), Value::Object(sessions));
        }
        Value::Object(patch)
    }
}
