//! Execution graph construction.
//!
//! Orders workflow nodes into dependency batches with Kahn's algorithm:
//! each batch holds every node whose dependencies are all satisfied by
//! earlier batches, so the members of one batch are free to run
//! concurrently.

use std::collections::HashMap;

use thiserror::Error;

use crate::types::{WorkflowDefinition, WorkflowNode};

/// The workflow's edges contain a dependency cycle, so no execution order
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("workflow contains circular dependencies")]
pub struct CycleError;

/// Partition `workflow.nodes` into dependency-ordered batches.
///
/// Every node lands in exactly one batch, and every edge points from an
/// earlier batch into a strictly later one. Nodes keep their declaration
/// order within a batch. Expects a definition that already passed
/// [`crate::validate::validate`]; edges referencing unknown nodes are
/// ignored here.
pub fn build_batches(workflow: &WorkflowDefinition) -> Result<Vec<Vec<WorkflowNode>>, CycleError> {
    let mut in_degree: HashMap<&str, usize> =
        workflow.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

    for edge in &workflow.edges {
        if !in_degree.contains_key(edge.source.as_str()) {
            continue;
        }
        if let Some(degree) = in_degree.get_mut(edge.target.as_str()) {
            *degree += 1;
            successors
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
        }
    }

    let mut batches = Vec::new();
    while !in_degree.is_empty() {
        let ready: Vec<&WorkflowNode> = workflow
            .nodes
            .iter()
            .filter(|n| in_degree.get(n.id.as_str()) == Some(&0))
            .collect();
        if ready.is_empty() {
            return Err(CycleError);
        }
        for node in &ready {
            in_degree.remove(node.id.as_str());
            if let Some(targets) = successors.get(node.id.as_str()) {
                for target in targets {
                    if let Some(degree) = in_degree.get_mut(target) {
                        *degree -= 1;
                    }
                }
            }
        }
        batches.push(ready.into_iter().cloned().collect());
    }

    Ok(batches)
}
