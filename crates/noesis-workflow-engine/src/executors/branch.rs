//! Branch node — evaluates a condition and picks a path label.
//!
//! The condition is evaluated against a flat scope of the run's variables
//! merged with node results (results win). The outcome is
//! `{"branch": <true_path | false_path>}` with the param value named by the
//! verdict. The engine does not prune the unchosen subgraph; downstream
//! nodes see which way the branch went through this outcome.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::NodeExecutionError;
use crate::expression;
use crate::traits::{NodeCtx, NodeExecutor};
use crate::types::WorkflowNode;

pub struct BranchExecutor;

#[async_trait]
impl NodeExecutor for BranchExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        ctx: &NodeCtx,
    ) -> Result<Value, NodeExecutionError> {
        let condition = node
            .params
            .get("condition")
            .and_then(Value::as_str)
            .ok_or_else(|| NodeExecutionError::InvalidParams {
                message: "branch node requires params.condition".to_string(),
            })?;

        let scope = ctx.condition_scope();
        let verdict = expression::evaluate(condition, &scope)?;

        let key = if verdict { "true_path" } else { "false_path" };
        let chosen = node.params.get(key).cloned().unwrap_or(Value::Null);
        Ok(json!({ "branch": chosen }))
    }

    fn validate(&self, node: &WorkflowNode) -> Result<(), Vec<String>> {
        match node.params.get("condition").and_then(Value::as_str) {
            Some(c) if !c.trim().is_empty() => Ok(()),
            _ => Err(vec!["Branch node requires params.condition".to_string()]),
        }
    }
}
