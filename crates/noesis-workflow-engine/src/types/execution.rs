//! Execution state: per-run context, options, results, and checkpoints.
//!
//! All keyed collections use `BTreeMap` (never `HashMap`) so snapshots and
//! checkpoints serialize deterministically.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{ExecutionLog, LogLevel};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a run. Transitions are monotonic:
/// `Idle → Running → {Completed, Failed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ExecutionStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-run execution switches.
///
/// `dry_run` defaults to `true`: side-effecting operations are simulated
/// unless a caller explicitly opts in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case", default)]
pub struct ExecutionOptions {
    pub dry_run: bool,
    pub write_enabled: bool,
    pub parallel: bool,
    /// Concurrency cap within a parallel batch.
    pub max_parallel: usize,
    pub continue_on_error: bool,
    pub checkpoint: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            write_enabled: false,
            parallel: false,
            max_parallel: 3,
            continue_on_error: false,
            checkpoint: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Mutable state of one run. Created fresh inside `execute()`, mutated only
/// by that run's batch loop, and dropped from the active table on reaching a
/// terminal status. `results`, `errors`, and `logs` are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct ExecutionContext {
    pub workflow_id: String,
    pub execution_id: String,
    pub start_time: DateTime<Utc>,
    pub variables: BTreeMap<String, Value>,
    pub results: BTreeMap<String, Value>,
    pub errors: BTreeMap<String, String>,
    pub status: ExecutionStatus,
    pub dry_run: bool,
    pub write_enabled: bool,
    pub logs: Vec<ExecutionLog>,
}

impl ExecutionContext {
    /// Begin a new run in the `Running` state with a fresh execution id.
    pub fn begin(workflow_id: &str, options: &ExecutionOptions) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            execution_id: next_execution_id(),
            start_time: Utc::now(),
            variables: BTreeMap::new(),
            results: BTreeMap::new(),
            errors: BTreeMap::new(),
            status: ExecutionStatus::Running,
            dry_run: options.dry_run,
            write_enabled: options.write_enabled,
            logs: Vec::new(),
        }
    }

    /// Record a node outcome.
    pub fn record_result(&mut self, node_id: &str, outcome: Value) {
        self.results.insert(node_id.to_string(), outcome);
    }

    /// Record a node failure.
    pub fn record_error(&mut self, node_id: &str, message: impl Into<String>) {
        self.errors.insert(node_id.to_string(), message.into());
    }

    /// Append a log record and return a copy for event emission.
    pub fn push_log(
        &mut self,
        level: LogLevel,
        node_id: &str,
        message: impl Into<String>,
    ) -> ExecutionLog {
        let entry = ExecutionLog::entry(node_id, level, message);
        self.logs.push(entry.clone());
        entry
    }

    /// Move to a terminal status. Only a `Running` context transitions;
    /// a context already terminal (e.g. cancelled mid-run) keeps its status.
    pub fn finish(&mut self, status: ExecutionStatus) {
        if self.status == ExecutionStatus::Running && status.is_terminal() {
            self.status = status;
        }
    }

    /// Cooperative cancellation flag. Returns whether the flag was newly set.
    pub fn cancel(&mut self) -> bool {
        if self.status == ExecutionStatus::Running {
            self.status = ExecutionStatus::Cancelled;
            true
        } else {
            false
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ExecutionStatus::Cancelled
    }

    /// True when any recorded outcome carries an explicit `success: false`
    /// marker (a semantic failure without a thrown error).
    pub fn has_failed_outcome(&self) -> bool {
        self.results
            .values()
            .any(|v| v.get("success").and_then(Value::as_bool) == Some(false))
    }
}

/// Execution ids are `exec-<unix millis>-<short random suffix>`, unique and
/// roughly sortable by start time.
fn next_execution_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("exec-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A node failure as surfaced in [`ExecutionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct ExecutionError {
    pub node_id: String,
    pub message: String,
}

/// The immutable summary returned by `execute()`. Always carries the complete
/// log and error lists regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct ExecutionResult {
    pub success: bool,
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub duration_ms: u64,
    pub node_results: BTreeMap<String, Value>,
    pub errors: Vec<ExecutionError>,
    pub logs: Vec<ExecutionLog>,
}

impl ExecutionResult {
    /// Snapshot a finished context into the caller-facing result.
    pub fn from_context(ctx: &ExecutionContext) -> Self {
        let duration = Utc::now().signed_duration_since(ctx.start_time);
        let errors: Vec<ExecutionError> = ctx
            .errors
            .iter()
            .map(|(node_id, message)| ExecutionError {
                node_id: node_id.clone(),
                message: message.clone(),
            })
            .collect();
        Self {
            success: ctx.status == ExecutionStatus::Completed
                && errors.is_empty()
                && !ctx.has_failed_outcome(),
            execution_id: ctx.execution_id.clone(),
            status: ctx.status,
            duration_ms: duration.num_milliseconds().max(0) as u64,
            node_results: ctx.results.clone(),
            errors,
            logs: ctx.logs.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// A recovery snapshot emitted after each settled batch when checkpointing
/// is enabled. The engine never persists these itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct Checkpoint {
    pub execution_id: String,
    pub workflow_id: String,
    pub timestamp: DateTime<Utc>,
    pub variables: BTreeMap<String, Value>,
    pub results: BTreeMap<String, Value>,
    pub status: ExecutionStatus,
}

impl Checkpoint {
    pub fn of(ctx: &ExecutionContext) -> Self {
        Self {
            execution_id: ctx.execution_id.clone(),
            workflow_id: ctx.workflow_id.clone(),
            timestamp: Utc::now(),
            variables: ctx.variables.clone(),
            results: ctx.results.clone(),
            status: ctx.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
