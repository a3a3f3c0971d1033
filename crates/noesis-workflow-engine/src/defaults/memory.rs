//! In-memory collaborators for tests and backend-less embedding.
//!
//! Each one records the calls it receives; `call_log()` / `saved()` hand out
//! a shared handle that stays valid after the collaborator moves into the
//! engine builder.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::{CheckpointError, DelegationError, ToolError};
use crate::traits::{CheckpointSink, Delegation, Delegator, ToolInvoker};
use crate::types::Checkpoint;

// ---------------------------------------------------------------------------
// CannedToolInvoker
// ---------------------------------------------------------------------------

/// Tool invoker that answers from a fixed response table.
///
/// Operations without an entry fail with
/// [`ToolError::UnknownOperation`]; operations registered with
/// [`with_failure()`](Self::with_failure) fail with a backend error.
#[derive(Default)]
pub struct CannedToolInvoker {
    responses: BTreeMap<String, Value>,
    failures: BTreeMap<String, String>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl CannedToolInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `operation` with `response`.
    pub fn with_response(mut self, operation: &str, response: Value) -> Self {
        self.responses.insert(operation.to_string(), response);
        self
    }

    /// Fail `operation` with a backend error carrying `message`.
    pub fn with_failure(mut self, operation: &str, message: &str) -> Self {
        self.failures.insert(operation.to_string(), message.to_string());
        self
    }

    /// Shared handle to the recorded `(operation, params)` calls.
    pub fn call_log(&self) -> Arc<Mutex<Vec<(String, Value)>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ToolInvoker for CannedToolInvoker {
    async fn invoke(&self, operation: &str, params: &Value) -> Result<Value, ToolError> {
        self.calls
            .lock()
            .push((operation.to_string(), params.clone()));
        if let Some(message) = self.failures.get(operation) {
            return Err(ToolError::Backend {
                message: message.clone(),
            });
        }
        match self.responses.get(operation) {
            Some(response) => Ok(response.clone()),
            None => Err(ToolError::UnknownOperation {
                name: operation.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedDelegator
// ---------------------------------------------------------------------------

/// Delegator that answers from a fixed per-agent response table.
#[derive(Default)]
pub struct ScriptedDelegator {
    responses: BTreeMap<String, Value>,
    calls: Arc<Mutex<Vec<(String, String, Value)>>>,
}

impl ScriptedDelegator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer delegations to `agent` with `response`.
    pub fn with_response(mut self, agent: &str, response: Value) -> Self {
        self.responses.insert(agent.to_string(), response);
        self
    }

    /// Shared handle to the recorded `(agent, task, context)` calls.
    pub fn call_log(&self) -> Arc<Mutex<Vec<(String, String, Value)>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Delegator for ScriptedDelegator {
    async fn delegate(
        &self,
        target_agent: &str,
        task_description: &str,
        context: &Value,
    ) -> Result<Delegation, DelegationError> {
        self.calls.lock().push((
            target_agent.to_string(),
            task_description.to_string(),
            context.clone(),
        ));
        match self.responses.get(target_agent) {
            Some(response) => Ok(Delegation {
                agent: target_agent.to_string(),
                response: response.clone(),
                confidence: None,
                execution_time_ms: None,
            }),
            None => Err(DelegationError::UnknownAgent {
                agent: target_agent.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingCheckpointSink
// ---------------------------------------------------------------------------

/// Checkpoint sink that stores snapshots in memory.
pub struct RecordingCheckpointSink {
    saved: Arc<Mutex<Vec<Checkpoint>>>,
    fail: bool,
}

impl RecordingCheckpointSink {
    pub fn new() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// A sink whose every save fails, for exercising sink-error handling.
    pub fn failing() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// Shared handle to the stored checkpoints.
    pub fn saved(&self) -> Arc<Mutex<Vec<Checkpoint>>> {
        Arc::clone(&self.saved)
    }
}

impl Default for RecordingCheckpointSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointSink for RecordingCheckpointSink {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if self.fail {
            return Err(CheckpointError::Sink {
                message: "sink unavailable".to_string(),
            });
        }
        self.saved.lock().push(checkpoint.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn canned_invoker_answers_and_records() {
        let invoker = CannedToolInvoker::new().with_response("ping", json!({ "pong": true }));
        let calls = invoker.call_log();

        let out = invoker.invoke("ping", &json!({ "n": 1 })).await.unwrap();
        assert_eq!(out, json!({ "pong": true }));
        assert_eq!(calls.lock()[0], ("ping".to_string(), json!({ "n": 1 })));
    }

    #[tokio::test]
    async fn canned_invoker_unknown_operation_errors() {
        let invoker = CannedToolInvoker::new();
        let err = invoker.invoke("absent", &json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownOperation { .. }));
    }

    #[tokio::test]
    async fn canned_invoker_scripted_failure() {
        let invoker = CannedToolInvoker::new().with_failure("ping", "down");
        let err = invoker.invoke("ping", &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("down"));
    }

    #[tokio::test]
    async fn scripted_delegator_round_trip() {
        let delegator = ScriptedDelegator::new().with_response("writer", json!({ "ok": 1 }));
        let delegation = delegator
            .delegate("writer", "draft it", &json!({}))
            .await
            .unwrap();
        assert_eq!(delegation.agent, "writer");
        assert_eq!(delegation.response, json!({ "ok": 1 }));

        let err = delegator
            .delegate("stranger", "who", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, DelegationError::UnknownAgent { .. }));
    }

    #[tokio::test]
    async fn recording_sink_stores_and_failing_sink_errors() {
        let sink = RecordingCheckpointSink::new();
        let saved = sink.saved();
        let checkpoint = Checkpoint {
            execution_id: "exec-1".into(),
            workflow_id: "wf-1".into(),
            timestamp: chrono::Utc::now(),
            variables: Default::default(),
            results: Default::default(),
            status: crate::types::ExecutionStatus::Running,
        };
        sink.save(&checkpoint).await.unwrap();
        assert_eq!(saved.lock().len(), 1);

        let failing = RecordingCheckpointSink::failing();
        assert!(failing.save(&checkpoint).await.is_err());
    }
}
