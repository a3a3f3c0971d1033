//! Foundational types for the workflow execution model.
//!
//! Every type here is `Serialize + Deserialize + Debug + Clone`. Keyed
//! collections use `BTreeMap` (never `HashMap`) to guarantee deterministic
//! serialization of snapshots and checkpoints — a correctness requirement,
//! not a style choice.

pub mod execution;
pub mod workflow;

pub use execution::*;
pub use workflow::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// `node_id` used for engine-level log records not tied to a single node.
pub const SYSTEM_NODE_ID: &str = "system";

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// Severity of an [`ExecutionLog`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

/// One append-only log record of a run. Engine-level records use
/// [`SYSTEM_NODE_ID`]; node-level records carry the node's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct ExecutionLog {
    pub timestamp: DateTime<Utc>,
    pub node_id: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ExecutionLog {
    /// A record timestamped now, without extra data.
    pub fn entry(node_id: &str, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            node_id: node_id.to_string(),
            level,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a structured payload to the record.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_level_wire_names() {
        assert_eq!(serde_json::to_string(&LogLevel::Info).unwrap(), r#""info""#);
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), r#""warn""#);
        assert_eq!(
            serde_json::to_string(&LogLevel::Error).unwrap(),
            r#""error""#
        );
        assert_eq!(
            serde_json::to_string(&LogLevel::Debug).unwrap(),
            r#""debug""#
        );
    }

    #[test]
    fn log_data_omitted_when_absent() {
        let entry = ExecutionLog::entry(SYSTEM_NODE_ID, LogLevel::Info, "starting");
        let text = serde_json::to_string(&entry).unwrap();
        assert!(!text.contains("data"), "got: {text}");

        let with = entry.with_data(json!({"batch": 1}));
        let text = serde_json::to_string(&with).unwrap();
        assert!(text.contains(r#""data":{"batch":1}"#), "got: {text}");
    }

    #[test]
    fn log_round_trip() {
        let entry =
            ExecutionLog::entry("n1", LogLevel::Warn, "skipped").with_data(json!({"reason": "x"}));
        let text = serde_json::to_string(&entry).unwrap();
        let back: ExecutionLog = serde_json::from_str(&text).unwrap();
        assert_eq!(entry, back);
    }
}
