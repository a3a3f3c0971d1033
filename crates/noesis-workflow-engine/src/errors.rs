//! Error types for collaborator traits and node execution.

use thiserror::Error;

/// Errors from [`ToolInvoker`](super::traits::ToolInvoker).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },
    #[error("tool backend error: {message}")]
    Backend { message: String },
}

/// Errors from [`Delegator`](super::traits::Delegator).
#[derive(Debug, Error)]
pub enum DelegationError {
    #[error("unknown agent: {agent}")]
    UnknownAgent { agent: String },
    #[error("no delegator is configured")]
    NotConfigured,
    #[error("delegation backend error: {message}")]
    Backend { message: String },
}

/// Errors from [`CheckpointSink`](super::traits::CheckpointSink).
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint sink error: {message}")]
    Sink { message: String },
}

/// Errors from a node executor. Caught at the node-execution boundary,
/// recorded against the node, and never allowed to corrupt sibling outcomes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NodeExecutionError {
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),
    #[error("delegation error: {0}")]
    Delegation(#[from] DelegationError),
    #[error("condition error: {0}")]
    Condition(#[from] crate::expression::ExpressionError),
    #[error("invalid params: {message}")]
    InvalidParams { message: String },
    #[error("{message}")]
    Other { message: String },
}

impl NodeExecutionError {
    /// Convenience constructor for custom executors.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
