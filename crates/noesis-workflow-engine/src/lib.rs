//! Noesis workflow engine — dependency-aware orchestration of
//! knowledge-base tools.
//!
//! Workflows are directed acyclic graphs of typed nodes. The engine
//! validates a definition, partitions it into dependency batches with
//! Kahn's algorithm, and runs each batch sequentially or concurrently,
//! with a safety gate that keeps write operations simulated until a caller
//! explicitly enables them. Progress is published on a broadcast event
//! stream compatible with the workflow editor's event names.
//!
//! The engine is designed to be embedded: tool invocation, delegation and
//! checkpoint persistence are traits, with an HTTP-backed tool invoker and
//! in-memory collaborators available in [`defaults`].

pub mod defaults;
pub mod engine;
pub mod errors;
pub mod events;
pub mod executors;
pub mod expression;
pub mod graph;
pub mod safety;
pub mod traits;
pub mod types;
pub mod validate;

// Re-export public types at the crate level.

// defaults
pub use defaults::{CannedToolInvoker, HttpToolInvoker, RecordingCheckpointSink, ScriptedDelegator};

// engine
pub use engine::{Engine, EngineBuilder, EngineError};

// errors
pub use errors::{
    CheckpointError, DelegationError, NodeExecutionError, ToolError,
};

// events
pub use events::ExecutionEvent;

// executors
pub use executors::{BranchExecutor, DelayExecutor, DelegateExecutor, ExecutorRegistry, ToolExecutor};

// expression
pub use expression::ExpressionError;

// graph
pub use graph::{build_batches, CycleError};

// safety
pub use safety::{is_write_operation, GateDecision, SkipReason, WRITE_OPERATIONS};

// traits
pub use traits::{CheckpointSink, Delegation, Delegator, NodeCtx, NodeExecutor, ToolInvoker};

// types
pub use types::{
    Checkpoint, ErrorPolicy, ExecutionContext, ExecutionError, ExecutionLog, ExecutionOptions,
    ExecutionResult, ExecutionStatus, LogLevel, WorkflowDefinition, WorkflowEdge, WorkflowNode,
    SYSTEM_NODE_ID,
};

// validate
pub use validate::validate;
