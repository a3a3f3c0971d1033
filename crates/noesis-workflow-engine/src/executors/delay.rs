//! Delay node — suspends the run for a number of seconds.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::NodeExecutionError;
use crate::traits::{NodeCtx, NodeExecutor};
use crate::types::WorkflowNode;

pub struct DelayExecutor;

#[async_trait]
impl NodeExecutor for DelayExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        _ctx: &NodeCtx,
    ) -> Result<Value, NodeExecutionError> {
        let seconds_value = node
            .params
            .get("seconds")
            .cloned()
            .unwrap_or_else(|| json!(1));
        let seconds = seconds_value.as_f64().ok_or_else(|| {
            NodeExecutionError::InvalidParams {
                message: format!("delay seconds must be a number, got {seconds_value}"),
            }
        })?;
        let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
            NodeExecutionError::InvalidParams {
                message: format!("delay seconds out of range: {seconds}"),
            }
        })?;

        tokio::time::sleep(duration).await;
        Ok(json!({ "delayed": seconds_value }))
    }

    fn validate(&self, node: &WorkflowNode) -> Result<(), Vec<String>> {
        match node.params.get("seconds") {
            None => Ok(()),
            Some(value) => match value.as_f64() {
                Some(s) if s >= 0.0 => Ok(()),
                _ => Err(vec![
                    "Delay node seconds must be a non-negative number".to_string(),
                ]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::errors::ToolError;
    use crate::traits::ToolInvoker;

    struct NullTools;

    #[async_trait]
    impl ToolInvoker for NullTools {
        async fn invoke(&self, operation: &str, _params: &Value) -> Result<Value, ToolError> {
            Err(ToolError::UnknownOperation {
                name: operation.to_string(),
            })
        }
    }

    fn make_node(params: Value) -> WorkflowNode {
        WorkflowNode {
            id: "pause".into(),
            node_type: "delay".into(),
            name: "pause".into(),
            params,
            approval_required: false,
        }
    }

    fn make_ctx() -> NodeCtx {
        NodeCtx::new(
            "exec-1",
            "wf-1",
            json!({}),
            json!({}),
            true,
            false,
            Arc::new(NullTools),
            None,
        )
    }

    #[tokio::test]
    async fn sleeps_for_the_requested_seconds() {
        tokio::time::pause();
        let started = tokio::time::Instant::now();

        let node = make_node(json!({ "seconds": 2 }));
        let outcome = DelayExecutor.execute(&node, &make_ctx()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(outcome, json!({ "delayed": 2 }));
    }

    #[tokio::test]
    async fn defaults_to_one_second() {
        tokio::time::pause();
        let started = tokio::time::Instant::now();

        let node = make_node(json!({}));
        let outcome = DelayExecutor.execute(&node, &make_ctx()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(outcome, json!({ "delayed": 1 }));
    }

    #[tokio::test]
    async fn fractional_seconds_are_allowed() {
        tokio::time::pause();
        let node = make_node(json!({ "seconds": 0.25 }));
        let outcome = DelayExecutor.execute(&node, &make_ctx()).await.unwrap();
        assert_eq!(outcome, json!({ "delayed": 0.25 }));
    }

    #[tokio::test]
    async fn negative_seconds_are_rejected() {
        let node = make_node(json!({ "seconds": -1 }));
        let err = DelayExecutor.execute(&node, &make_ctx()).await.unwrap_err();
        assert!(matches!(err, NodeExecutionError::InvalidParams { .. }));
    }

    #[test]
    fn validate_rejects_non_numeric_seconds() {
        let node = make_node(json!({ "seconds": "soon" }));
        assert!(DelayExecutor.validate(&node).is_err());
        let node = make_node(json!({ "seconds": 1.5 }));
        assert!(DelayExecutor.validate(&node).is_ok());
        let node = make_node(json!({}));
        assert!(DelayExecutor.validate(&node).is_ok());
    }
}
