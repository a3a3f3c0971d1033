//! Execution lifecycle events.
//!
//! The engine owns a single broadcast channel; every run publishes into it
//! and [`crate::engine::Engine::subscribe`] hands out receivers. Events are
//! tagged with the wire names used by the workflow editor, so a serialized
//! event can be forwarded to it unchanged. Slow subscribers lose old events
//! rather than blocking a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Checkpoint, ExecutionLog};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(tag = "event", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ExecutionEvent {
    /// A run passed validation and is about to execute its first batch.
    #[serde(rename = "execution:start")]
    ExecutionStarted {
        execution_id: String,
        workflow_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A node cleared the safety gate and its executor was invoked.
    #[serde(rename = "node:start")]
    NodeStarted {
        execution_id: String,
        node_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A node executor returned successfully.
    #[serde(rename = "node:complete")]
    NodeCompleted {
        execution_id: String,
        node_id: String,
        outcome: Value,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A node executor failed; the message is also recorded in the context.
    #[serde(rename = "node:error")]
    NodeFailed {
        execution_id: String,
        node_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// The safety gate withheld a node from execution.
    #[serde(rename = "node:skipped")]
    NodeSkipped {
        execution_id: String,
        node_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// One log record was appended to the run's log.
    #[serde(rename = "log")]
    Log {
        execution_id: String,
        record: ExecutionLog,
    },
    /// A checkpoint snapshot was taken after a batch.
    #[serde(rename = "checkpoint:saved")]
    CheckpointSaved {
        execution_id: String,
        checkpoint: Checkpoint,
        timestamp: DateTime<Utc>,
    },
    /// The run reached `completed`.
    #[serde(rename = "execution:complete")]
    ExecutionCompleted {
        execution_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// The run reached `failed`.
    #[serde(rename = "execution:error")]
    ExecutionFailed {
        execution_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// The run was flagged for cancellation.
    #[serde(rename = "execution:cancelled")]
    ExecutionCancelled {
        execution_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    /// The run this event belongs to.
    pub fn execution_id(&self) -> &str {
        match self {
            ExecutionEvent::ExecutionStarted { execution_id, .. }
            | ExecutionEvent::NodeStarted { execution_id, .. }
            | ExecutionEvent::NodeCompleted { execution_id, .. }
            | ExecutionEvent::NodeFailed { execution_id, .. }
            | ExecutionEvent::NodeSkipped { execution_id, .. }
            | ExecutionEvent::Log { execution_id, .. }
            | ExecutionEvent::CheckpointSaved { execution_id, .. }
            | ExecutionEvent::ExecutionCompleted { execution_id, .. }
            | ExecutionEvent::ExecutionFailed { execution_id, .. }
            | ExecutionEvent::ExecutionCancelled { execution_id, .. } => execution_id,
        }
    }
}
