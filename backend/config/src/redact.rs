//! Config redaction: safe-to-print snapshots with secrets masked.

use serde_json::Value;

use crate::schema::RunConfig;

static SENSITIVE_KEYS: &[&str] = &["api_key", "apiKey", "token", "secret", "password"];

/// Serialize `config` with every sensitive field masked as `"abcd***"`.
pub fn redact(config: &RunConfig) -> Value {
    serde_json::to_value(config)
        .map(|v| redact_value(&v, ""))
        .unwrap_or(Value::Null)
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_value(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            let head: String = s.chars().take(4).collect();
            if s.chars().count() > 4 {
                Value::String(format!("{head}***"))
            } else {
                Value::String("***".to_string())
            }
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_value(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_value(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LlmConfig;

    #[test]
    fn masks_api_key_only() {
        let cfg = RunConfig {
            agent_name: Some("React_Webrun_Agent".into()),
            llm: Some(LlmConfig {
                api_key: Some("sk-or-v1-secret".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let v = redact(&cfg);
        assert_eq!(v["llm"]["api_key"], "sk-o***");
        assert_eq!(v["agent_name"], "React_Webrun_Agent");
    }
}
