//! Batch driver for a single run.
//!
//! All node futures of a batch are multiplexed on the calling task; nothing
//! is spawned. Cancellation is observed between nodes and between batches,
//! so dispatched node work always settles before the run stops.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Semaphore;

use super::Engine;
use crate::events::ExecutionEvent;
use crate::safety::{self, GateDecision};
use crate::traits::NodeCtx;
use crate::types::{
    Checkpoint, ExecutionContext, ExecutionOptions, LogLevel, WorkflowNode, SYSTEM_NODE_ID,
};

type ContextCell = Arc<RwLock<ExecutionContext>>;

pub(super) async fn drive(
    engine: &Engine,
    cell: &ContextCell,
    batches: Vec<Vec<WorkflowNode>>,
    options: &ExecutionOptions,
) {
    let total = batches.len();
    for (index, batch) in batches.into_iter().enumerate() {
        log(
            engine,
            cell,
            LogLevel::Info,
            SYSTEM_NODE_ID,
            format!(
                "executing batch {}/{} with {} node(s)",
                index + 1,
                total,
                batch.len()
            ),
        );

        if options.parallel && batch.len() > 1 {
            run_parallel(engine, cell, batch, options.max_parallel).await;
        } else {
            run_sequential(engine, cell, batch).await;
        }

        if cell.read().is_cancelled() {
            log(
                engine,
                cell,
                LogLevel::Warn,
                SYSTEM_NODE_ID,
                "stopping: execution cancelled",
            );
            break;
        }
        if options.checkpoint {
            save_checkpoint(engine, cell).await;
        }
        let has_errors = !cell.read().errors.is_empty();
        if has_errors && !options.continue_on_error {
            log(
                engine,
                cell,
                LogLevel::Warn,
                SYSTEM_NODE_ID,
                format!("stopping after batch {} due to node errors", index + 1),
            );
            break;
        }
    }
}

async fn run_parallel(
    engine: &Engine,
    cell: &ContextCell,
    batch: Vec<WorkflowNode>,
    max_parallel: usize,
) {
    let permits = Arc::new(Semaphore::new(max_parallel.max(1)));
    let mut inflight = FuturesUnordered::new();
    for node in batch {
        let permits = Arc::clone(&permits);
        inflight.push(async move {
            let Ok(_permit) = permits.acquire().await else {
                return;
            };
            run_node(engine, cell, &node).await;
        });
    }
    while inflight.next().await.is_some() {}
}

async fn run_sequential(engine: &Engine, cell: &ContextCell, batch: Vec<WorkflowNode>) {
    for node in batch {
        if cell.read().is_cancelled() {
            break;
        }
        run_node(engine, cell, &node).await;
    }
}

async fn run_node(engine: &Engine, cell: &ContextCell, node: &WorkflowNode) {
    let execution_id = cell.read().execution_id.clone();

    log(
        engine,
        cell,
        LogLevel::Info,
        &node.id,
        format!("executing node: {}", node.name),
    );

    let decision = {
        let ctx = cell.read();
        safety::check(node, ctx.dry_run, ctx.write_enabled)
    };
    if let GateDecision::Skip(reason) = decision {
        cell.write()
            .record_result(&node.id, safety::skip_outcome(reason));
        log(
            engine,
            cell,
            LogLevel::Warn,
            &node.id,
            format!("node skipped: {reason}"),
        );
        engine.emit(ExecutionEvent::NodeSkipped {
            execution_id,
            node_id: node.id.clone(),
            reason: reason.as_str().to_string(),
            timestamp: Utc::now(),
        });
        tracing::debug!(node_id = %node.id, reason = %reason, "node withheld by safety gate");
        return;
    }

    engine.emit(ExecutionEvent::NodeStarted {
        execution_id: execution_id.clone(),
        node_id: node.id.clone(),
        timestamp: Utc::now(),
    });
    let started = tokio::time::Instant::now();

    let executor = engine.registry.read().resolve(&node.node_type);
    let node_ctx = {
        let ctx = cell.read();
        NodeCtx::new(
            ctx.execution_id.as_str(),
            ctx.workflow_id.as_str(),
            object_from(&ctx.variables),
            object_from(&ctx.results),
            ctx.dry_run,
            ctx.write_enabled,
            Arc::clone(&engine.tools),
            engine.delegator.clone(),
        )
    };

    match executor.execute(node, &node_ctx).await {
        Ok(outcome) => {
            let duration_ms = started.elapsed().as_millis() as u64;
            cell.write().record_result(&node.id, outcome.clone());
            log(
                engine,
                cell,
                LogLevel::Info,
                &node.id,
                format!("node completed: {}", summary(&outcome)),
            );
            engine.emit(ExecutionEvent::NodeCompleted {
                execution_id,
                node_id: node.id.clone(),
                outcome,
                duration_ms,
                timestamp: Utc::now(),
            });
        }
        Err(err) => {
            let message = err.to_string();
            cell.write().record_error(&node.id, message.clone());
            log(
                engine,
                cell,
                LogLevel::Error,
                &node.id,
                format!("node failed: {message}"),
            );
            engine.emit(ExecutionEvent::NodeFailed {
                execution_id,
                node_id: node.id.clone(),
                error: message,
                timestamp: Utc::now(),
            });
            tracing::warn!(node_id = %node.id, error = %err, "node execution failed");
        }
    }
}

async fn save_checkpoint(engine: &Engine, cell: &ContextCell) {
    let checkpoint = Checkpoint::of(&cell.read());
    if let Some(sink) = &engine.checkpoints {
        if let Err(err) = sink.save(&checkpoint).await {
            log(
                engine,
                cell,
                LogLevel::Warn,
                SYSTEM_NODE_ID,
                format!("checkpoint save failed: {err}"),
            );
            tracing::warn!(error = %err, "checkpoint sink failure");
        }
    }
    engine.emit(ExecutionEvent::CheckpointSaved {
        execution_id: checkpoint.execution_id.clone(),
        checkpoint,
        timestamp: Utc::now(),
    });
}

/// Append a log record to the run and publish it as an event.
fn log(
    engine: &Engine,
    cell: &ContextCell,
    level: LogLevel,
    node_id: &str,
    message: impl Into<String>,
) {
    let (execution_id, record) = {
        let mut ctx = cell.write();
        let record = ctx.push_log(level, node_id, message);
        (ctx.execution_id.clone(), record)
    };
    engine.emit(ExecutionEvent::Log {
        execution_id,
        record,
    });
}

fn object_from(map: &BTreeMap<String, Value>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn summary(outcome: &Value) -> String {
    let text = outcome.to_string();
    if text.chars().count() > 100 {
        let head: String = text.chars().take(100).collect();
        format!("{head}...")
    } else {
        text
    }
}
