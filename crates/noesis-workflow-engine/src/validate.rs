//! Structural validation of workflow definitions.

use std::collections::HashSet;

use crate::executors::ExecutorRegistry;
use crate::graph;
use crate::types::WorkflowDefinition;

/// Validate a [`WorkflowDefinition`] before execution.
///
/// Returns `Ok(())` if the workflow is runnable, or `Err(Vec<String>)` with
/// every problem found. Node types with no registered executor are not an
/// error; they dispatch through the tool fallback at run time.
pub fn validate(
    workflow: &WorkflowDefinition,
    registry: &ExecutorRegistry,
) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // 1. Workflow must have at least one node.
    if workflow.nodes.is_empty() {
        errors.push("Workflow must have at least one node".to_string());
    }

    // 2. Every node carries an id, a type and a name.
    for node in &workflow.nodes {
        if node.id.is_empty() {
            errors.push("Node missing ID".to_string());
            continue;
        }
        if node.node_type.is_empty() {
            errors.push(format!("Node {} missing type", node.id));
        }
        if node.name.is_empty() {
            errors.push(format!("Node {} missing name", node.id));
        }
    }

    // 3. No duplicate node IDs.
    let mut seen_ids = HashSet::new();
    for node in &workflow.nodes {
        if !seen_ids.insert(&node.id) {
            errors.push(format!("Duplicate node ID: {}", node.id));
        }
    }

    // 4. Type-specific parameter checks, where an executor is registered.
    for node in &workflow.nodes {
        if let Some(executor) = registry.get(&node.node_type) {
            if let Err(node_errors) = executor.validate(node) {
                for message in node_errors {
                    errors.push(format!("Node {}: {}", node.id, message));
                }
            }
        }
    }

    // 5. All edge endpoints reference existing nodes.
    let node_ids: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut edges_valid = true;
    for edge in &workflow.edges {
        if !node_ids.contains(edge.source.as_str()) {
            errors.push(format!(
                "Edge {} references unknown source node: {}",
                edge.id, edge.source
            ));
            edges_valid = false;
        }
        if !node_ids.contains(edge.target.as_str()) {
            errors.push(format!(
                "Edge {} references unknown target node: {}",
                edge.id, edge.target
            ));
            edges_valid = false;
        }
    }

    // 6. The dependency graph must be acyclic. Skipped when edges are
    //    already broken; the endpoint errors above explain the failure.
    if edges_valid && !workflow.nodes.is_empty() && graph::build_batches(workflow).is_err() {
        errors.push("Workflow contains circular dependencies".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::types::{WorkflowEdge, WorkflowNode};

    fn make_node(id: &str) -> WorkflowNode {
        WorkflowNode {
            id: id.to_string(),
            node_type: "tool".to_string(),
            name: format!("{id}_op"),
            params: json!({}),
            approval_required: false,
        }
    }

    fn make_edge(id: &str, source: &str, target: &str) -> WorkflowEdge {
        WorkflowEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn workflow(nodes: Vec<WorkflowNode>, edges: Vec<WorkflowEdge>) -> WorkflowDefinition {
        WorkflowDefinition {
            version: "1.0".to_string(),
            id: "wf-1".to_string(),
            nodes,
            edges,
            retries: 0,
            on_error: Default::default(),
        }
    }

    #[test]
    fn valid_linear_workflow() {
        let wf = workflow(
            vec![make_node("a"), make_node("b")],
            vec![make_edge("e1", "a", "b")],
        );
        assert!(validate(&wf, &ExecutorRegistry::with_builtins()).is_ok());
    }

    #[test]
    fn empty_workflow_is_rejected() {
        let wf = workflow(vec![], vec![]);
        let errs = validate(&wf, &ExecutorRegistry::with_builtins()).unwrap_err();
        assert!(errs.iter().any(|e| e.contains("at least one node")));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let mut anonymous = make_node("");
        anonymous.node_type.clear();
        let mut unnamed = make_node("b");
        unnamed.name.clear();
        let wf = workflow(vec![anonymous, unnamed], vec![]);
        let errs = validate(&wf, &ExecutorRegistry::with_builtins()).unwrap_err();
        assert!(errs.iter().any(|e| e.contains("Node missing ID")));
        assert!(errs.iter().any(|e| e.contains("Node b missing name")));
    }

    #[test]
    fn duplicate_node_ids_are_rejected() {
        let wf = workflow(vec![make_node("a"), make_node("a")], vec![]);
        let errs = validate(&wf, &ExecutorRegistry::with_builtins()).unwrap_err();
        assert!(errs.iter().any(|e| e.contains("Duplicate node ID: a")));
    }

    #[test]
    fn edge_endpoints_must_exist() {
        let wf = workflow(
            vec![make_node("a")],
            vec![make_edge("e1", "a", "missing"), make_edge("e2", "ghost", "a")],
        );
        let errs = validate(&wf, &ExecutorRegistry::with_builtins()).unwrap_err();
        assert!(errs.iter().any(|e| e.contains("unknown target node: missing")));
        assert!(errs.iter().any(|e| e.contains("unknown source node: ghost")));
    }

    #[test]
    fn cycles_are_reported() {
        let wf = workflow(
            vec![make_node("a"), make_node("b")],
            vec![make_edge("e1", "a", "b"), make_edge("e2", "b", "a")],
        );
        let errs = validate(&wf, &ExecutorRegistry::with_builtins()).unwrap_err();
        assert!(errs.iter().any(|e| e.contains("circular dependencies")));
    }

    #[test]
    fn executor_checks_are_prefixed_with_the_node_id() {
        let mut branch = make_node("check");
        branch.node_type = "branch".to_string();
        let wf = workflow(vec![branch], vec![]);
        let errs = validate(&wf, &ExecutorRegistry::with_builtins()).unwrap_err();
        assert!(errs
            .iter()
            .any(|e| e.contains("Node check:") && e.contains("params.condition")));
    }

    #[test]
    fn unregistered_types_pass_validation() {
        let mut exotic = make_node("x");
        exotic.node_type = "quantum".to_string();
        let wf = workflow(vec![exotic], vec![]);
        assert!(validate(&wf, &ExecutorRegistry::with_builtins()).is_ok());
    }

    #[test]
    fn validation_accumulates_rather_than_stopping() {
        let mut branch = make_node("check");
        branch.node_type = "branch".to_string();
        let wf = workflow(
            vec![branch, make_node("check")],
            vec![make_edge("e1", "check", "nowhere")],
        );
        let errs = validate(&wf, &ExecutorRegistry::with_builtins()).unwrap_err();
        assert!(errs.len() >= 3, "expected several errors, got {errs:?}");
    }

    #[test]
    fn validation_is_idempotent() {
        let wf = workflow(
            vec![make_node("a"), make_node("b")],
            vec![make_edge("e1", "a", "b"), make_edge("e2", "b", "a")],
        );
        let registry = ExecutorRegistry::with_builtins();
        let first = validate(&wf, &registry).unwrap_err();
        let second = validate(&wf, &registry).unwrap_err();
        assert_eq!(first, second);
    }
}
