//! Tool node — forwards to the tool invocation collaborator.
//!
//! The outcome is whatever the invoker returns, unchanged. This executor
//! also serves as the fallback for unregistered node types, keyed by
//! `node.name`, so workflows can call external operations the engine has
//! no dedicated executor for.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::NodeExecutionError;
use crate::traits::{NodeCtx, NodeExecutor};
use crate::types::WorkflowNode;

pub struct ToolExecutor;

#[async_trait]
impl NodeExecutor for ToolExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        ctx: &NodeCtx,
    ) -> Result<Value, NodeExecutionError> {
        let outcome = ctx.tools().invoke(&node.name, &node.params).await?;
        Ok(outcome)
    }

    fn validate(&self, node: &WorkflowNode) -> Result<(), Vec<String>> {
        if node.name.trim().is_empty() {
            return Err(vec!["Tool node requires a non-empty name".to_string()]);
        }
        Ok(())
    }
}
