//! Collaborator and executor contracts.
//!
//! Every pluggable component is defined as an async trait. Built-in node
//! executors live in [`crate::executors`]; ready-made collaborator
//! implementations live in [`crate::defaults`]. Adding a method to any trait
//! requires a default implementation to preserve backward compatibility.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{CheckpointError, DelegationError, NodeExecutionError, ToolError};
use crate::types::{Checkpoint, WorkflowNode};

// ---------------------------------------------------------------------------
// NodeExecutor
// ---------------------------------------------------------------------------

/// Every node type implements this trait. The engine resolves the executor
/// from the node's `type` tag and calls [`execute()`](Self::execute) with a
/// [`NodeCtx`] snapshot of the run.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Execute the node and return its outcome document.
    async fn execute(&self, node: &WorkflowNode, ctx: &NodeCtx)
        -> Result<Value, NodeExecutionError>;

    /// Validate node configuration before a run starts. Returns a list of
    /// validation error messages, or `Ok(())` if valid.
    fn validate(&self, _node: &WorkflowNode) -> Result<(), Vec<String>> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ToolInvoker
// ---------------------------------------------------------------------------

/// Where tool calls go.
///
/// Implementations might proxy a knowledge-base HTTP API, an in-process tool
/// registry, or a static test map. The engine calls
/// [`invoke()`](Self::invoke) for every `tool` node (and for unregistered
/// node types, which fall back to tool dispatch).
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Invoke a named tool operation with the given parameters.
    async fn invoke(&self, operation: &str, params: &Value) -> Result<Value, ToolError>;
}

// ---------------------------------------------------------------------------
// Delegator
// ---------------------------------------------------------------------------

/// Outcome of a delegated task, as reported by the downstream agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    /// Agent that handled the task.
    pub agent: String,
    /// The agent's response document.
    pub response: Value,
    /// Self-reported confidence in the response, `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Wall-clock time the agent spent, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

/// Where delegated tasks go.
///
/// A `delegate` node hands a task description to a named agent and waits for
/// its response.
#[async_trait]
pub trait Delegator: Send + Sync {
    /// Delegate `task_description` to `target_agent`. `context` carries any
    /// extra parameters from the node.
    async fn delegate(
        &self,
        target_agent: &str,
        task_description: &str,
        context: &Value,
    ) -> Result<Delegation, DelegationError>;
}

// ---------------------------------------------------------------------------
// CheckpointSink
// ---------------------------------------------------------------------------

/// Where checkpoints go.
///
/// The engine snapshots run state after each batch when checkpointing is
/// enabled. Sink failures are logged and do not fail the run.
#[async_trait]
pub trait CheckpointSink: Send + Sync {
    /// Persist one checkpoint.
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;
}

// ---------------------------------------------------------------------------
// NodeCtx
// ---------------------------------------------------------------------------

/// Runtime context handed to node executors.
///
/// Carries an immutable snapshot of the run's variables and accumulated
/// results, the safety flags, and the engine's collaborators. Typically only
/// constructed by the engine; tests build one directly.
#[derive(Clone)]
pub struct NodeCtx {
    execution_id: String,
    workflow_id: String,
    variables: Value,
    results: Value,
    dry_run: bool,
    write_enabled: bool,
    tools: Arc<dyn ToolInvoker>,
    delegator: Option<Arc<dyn Delegator>>,
}

impl NodeCtx {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        execution_id: impl Into<String>,
        workflow_id: impl Into<String>,
        variables: Value,
        results: Value,
        dry_run: bool,
        write_enabled: bool,
        tools: Arc<dyn ToolInvoker>,
        delegator: Option<Arc<dyn Delegator>>,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            workflow_id: workflow_id.into(),
            variables,
            results,
            dry_run,
            write_enabled,
            tools,
            delegator,
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Initial variables of the run, as a JSON object.
    pub fn variables(&self) -> &Value {
        &self.variables
    }

    /// Outcomes of nodes completed so far, keyed by node id.
    pub fn results(&self) -> &Value {
        &self.results
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn write_enabled(&self) -> bool {
        self.write_enabled
    }

    /// Flat evaluation scope for conditions: variables merged with results,
    /// results winning on key collisions.
    pub fn condition_scope(&self) -> Value {
        let mut scope = serde_json::Map::new();
        if let Value::Object(vars) = &self.variables {
            scope.extend(vars.clone());
        }
        if let Value::Object(results) = &self.results {
            scope.extend(results.clone());
        }
        Value::Object(scope)
    }

    pub fn tools(&self) -> &Arc<dyn ToolInvoker> {
        &self.tools
    }

    pub fn delegator(&self) -> Option<&Arc<dyn Delegator>> {
        self.delegator.as_ref()
    }
}

impl std::fmt::Debug for NodeCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCtx")
            .field("execution_id", &self.execution_id)
            .field("workflow_id", &self.workflow_id)
            .field("dry_run", &self.dry_run)
            .field("write_enabled", &self.write_enabled)
            .finish_non_exhaustive()
    }
}
