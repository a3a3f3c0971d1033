//! The workflow engine: validation, batching, dispatch and lifecycle.
//!
//! One [`Engine`] serves many concurrent runs. Each `execute()` call
//! validates the definition, partitions it into dependency batches and
//! drives them to a terminal status, publishing progress on a shared
//! broadcast channel. The engine holds no workflow state between runs;
//! everything a run accumulates lives in its
//! [`ExecutionContext`](crate::types::ExecutionContext).

mod builder;
mod error;
mod run;

pub use builder::EngineBuilder;
pub use error::EngineError;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::events::ExecutionEvent;
use crate::executors::ExecutorRegistry;
use crate::graph;
use crate::traits::{CheckpointSink, Delegator, NodeExecutor, ToolInvoker};
use crate::types::{
    ExecutionContext, ExecutionOptions, ExecutionResult, ExecutionStatus, LogLevel,
    WorkflowDefinition, SYSTEM_NODE_ID,
};
use crate::validate;

pub struct Engine {
    registry: RwLock<ExecutorRegistry>,
    tools: Arc<dyn ToolInvoker>,
    delegator: Option<Arc<dyn Delegator>>,
    checkpoints: Option<Arc<dyn CheckpointSink>>,
    events: broadcast::Sender<ExecutionEvent>,
    active: RwLock<HashMap<String, Arc<RwLock<ExecutionContext>>>>,
}

impl Engine {
    /// Start assembling an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Subscribe to the engine's event stream. Events from all runs arrive
    /// interleaved; filter by [`ExecutionEvent::execution_id`].
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    /// Register (or replace) the executor for a node type. Runs started
    /// after this call see the new executor.
    pub fn register_executor(&self, node_type: impl Into<String>, executor: Arc<dyn NodeExecutor>) {
        self.registry.write().register(node_type, executor);
    }

    /// Execute a workflow to a terminal status.
    ///
    /// Validation or a dependency cycle fail the call before any node runs
    /// and before any event is emitted. Node failures do not surface here;
    /// they are reported in the returned [`ExecutionResult`].
    pub async fn execute(
        &self,
        workflow: &WorkflowDefinition,
        options: ExecutionOptions,
    ) -> Result<ExecutionResult, EngineError> {
        {
            let registry = self.registry.read();
            validate::validate(workflow, &registry)
                .map_err(|errors| EngineError::Validation { errors })?;
        }
        let batches = graph::build_batches(workflow)?;

        let ctx = ExecutionContext::begin(&workflow.id, &options);
        let execution_id = ctx.execution_id.clone();
        let cell = Arc::new(RwLock::new(ctx));
        self.active
            .write()
            .insert(execution_id.clone(), Arc::clone(&cell));

        tracing::info!(
            execution_id = %execution_id,
            workflow_id = %workflow.id,
            batches = batches.len(),
            "starting workflow execution"
        );
        self.emit(ExecutionEvent::ExecutionStarted {
            execution_id: execution_id.clone(),
            workflow_id: workflow.id.clone(),
            timestamp: Utc::now(),
        });
        let record = cell.write().push_log(
            LogLevel::Info,
            SYSTEM_NODE_ID,
            format!("starting workflow execution: {execution_id}"),
        );
        self.emit(ExecutionEvent::Log {
            execution_id: execution_id.clone(),
            record,
        });

        run::drive(self, &cell, batches, &options).await;

        let (result, status) = {
            let mut ctx = cell.write();
            let failed = !ctx.errors.is_empty() || ctx.has_failed_outcome();
            ctx.finish(if failed {
                ExecutionStatus::Failed
            } else {
                ExecutionStatus::Completed
            });
            (ExecutionResult::from_context(&ctx), ctx.status)
        };
        self.active.write().remove(&execution_id);

        match status {
            ExecutionStatus::Completed => self.emit(ExecutionEvent::ExecutionCompleted {
                execution_id: execution_id.clone(),
                duration_ms: result.duration_ms,
                timestamp: Utc::now(),
            }),
            ExecutionStatus::Failed => {
                let error = if result.errors.is_empty() {
                    "one or more nodes reported failure".to_string()
                } else {
                    result
                        .errors
                        .iter()
                        .map(|e| format!("{}: {}", e.node_id, e.message))
                        .collect::<Vec<_>>()
                        .join("; ")
                };
                self.emit(ExecutionEvent::ExecutionFailed {
                    execution_id: execution_id.clone(),
                    error,
                    timestamp: Utc::now(),
                });
            }
            // cancellation was already announced by cancel()
            _ => {}
        }
        tracing::info!(
            execution_id = %execution_id,
            status = ?status,
            duration_ms = result.duration_ms,
            "workflow execution finished"
        );
        Ok(result)
    }

    /// Flag a running execution for cancellation.
    ///
    /// Cooperative and batch-granular: in-flight node work finishes, then
    /// the run stops before its next node or batch. Returns `false` for
    /// unknown or already-terminal executions.
    pub fn cancel(&self, execution_id: &str) -> bool {
        let cell = { self.active.read().get(execution_id).cloned() };
        let Some(cell) = cell else {
            return false;
        };
        let record = {
            let mut ctx = cell.write();
            if !ctx.cancel() {
                return false;
            }
            ctx.push_log(LogLevel::Warn, SYSTEM_NODE_ID, "cancellation requested")
        };
        self.emit(ExecutionEvent::Log {
            execution_id: execution_id.to_string(),
            record,
        });
        self.emit(ExecutionEvent::ExecutionCancelled {
            execution_id: execution_id.to_string(),
            timestamp: Utc::now(),
        });
        tracing::info!(execution_id = %execution_id, "execution cancelled");
        true
    }

    /// Snapshot of a live execution's context, for polling. `None` once the
    /// run reaches a terminal status and leaves the active table.
    pub fn execution_status(&self, execution_id: &str) -> Option<ExecutionContext> {
        self.active
            .read()
            .get(execution_id)
            .map(|cell| cell.read().clone())
    }

    fn emit(&self, event: ExecutionEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("active_runs", &self.active.read().len())
            .finish_non_exhaustive()
    }
}
