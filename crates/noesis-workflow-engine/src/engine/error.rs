//! Engine-level errors.
//!
//! These cover failures that prevent a run from being scheduled at all.
//! Failures of individual nodes are not errors at this level; they are
//! recorded in the [`crate::types::ExecutionContext`] and reported through
//! the [`crate::types::ExecutionResult`].

use thiserror::Error;

use crate::graph::CycleError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The workflow failed structural validation. No nodes were run and no
    /// events were emitted.
    #[error("workflow validation failed: {}", errors.join(", "))]
    Validation { errors: Vec<String> },

    /// The workflow's edges contain a dependency cycle.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// The engine could not be assembled from the builder's parts.
    #[error("engine build error: {message}")]
    Build { message: String },
}
