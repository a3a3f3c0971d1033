//! Delegate node — hands a task to a downstream agent.
//!
//! `target_agent` and `task_description` are lifted out of the node params;
//! whatever params remain travel with the task as delegation context.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{DelegationError, NodeExecutionError};
use crate::traits::{NodeCtx, NodeExecutor};
use crate::types::WorkflowNode;

const AGENT_KEY: &str = "target_agent";
const TASK_KEY: &str = "task_description";

pub struct DelegateExecutor;

fn param_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[async_trait]
impl NodeExecutor for DelegateExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        ctx: &NodeCtx,
    ) -> Result<Value, NodeExecutionError> {
        let target_agent = param_str(&node.params, AGENT_KEY).ok_or_else(|| {
            NodeExecutionError::InvalidParams {
                message: format!("delegate node requires params.{AGENT_KEY}"),
            }
        })?;
        let task_description = param_str(&node.params, TASK_KEY).ok_or_else(|| {
            NodeExecutionError::InvalidParams {
                message: format!("delegate node requires params.{TASK_KEY}"),
            }
        })?;

        let mut context = serde_json::Map::new();
        if let Value::Object(params) = &node.params {
            for (key, value) in params {
                if key != AGENT_KEY && key != TASK_KEY {
                    context.insert(key.clone(), value.clone());
                }
            }
        }

        let delegator = ctx.delegator().ok_or(DelegationError::NotConfigured)?;
        let delegation = delegator
            .delegate(target_agent, task_description, &Value::Object(context))
            .await?;
        serde_json::to_value(delegation)
            .map_err(|e| NodeExecutionError::other(format!("delegation outcome: {e}")))
    }

    fn validate(&self, node: &WorkflowNode) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if param_str(&node.params, AGENT_KEY).is_none() {
            errors.push(format!("Delegate node requires params.{AGENT_KEY}"));
        }
        if param_str(&node.params, TASK_KEY).is_none() {
            errors.push(format!("Delegate node requires params.{TASK_KEY}"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::errors::ToolError;
    use crate::traits::{Delegation, Delegator, ToolInvoker};

    struct NullTools;

    #[async_trait]
    impl ToolInvoker for NullTools {
        async fn invoke(&self, operation: &str, _params: &Value) -> Result<Value, ToolError> {
            Err(ToolError::UnknownOperation {
                name: operation.to_string(),
            })
        }
    }

    struct ScriptedDelegator {
        calls: Mutex<Vec<(String, String, Value)>>,
    }

    #[async_trait]
    impl Delegator for ScriptedDelegator {
        async fn delegate(
            &self,
            target_agent: &str,
            task_description: &str,
            context: &Value,
        ) -> Result<Delegation, DelegationError> {
            self.calls.lock().push((
                target_agent.to_string(),
                task_description.to_string(),
                context.clone(),
            ));
            Ok(Delegation {
                agent: target_agent.to_string(),
                response: json!({ "summary": "done" }),
                confidence: Some(0.9),
                execution_time_ms: Some(12),
            })
        }
    }

    fn make_node(params: Value) -> WorkflowNode {
        WorkflowNode {
            id: "d1".into(),
            node_type: "delegate".into(),
            name: "summarize".into(),
            params,
            approval_required: false,
        }
    }

    fn make_ctx(delegator: Option<Arc<ScriptedDelegator>>) -> NodeCtx {
        NodeCtx::new(
            "exec-1",
            "wf-1",
            json!({}),
            json!({}),
            true,
            false,
            Arc::new(NullTools),
            delegator.map(|d| d as Arc<dyn Delegator>),
        )
    }

    #[tokio::test]
    async fn forwards_task_and_passes_remaining_params_as_context() {
        let delegator = Arc::new(ScriptedDelegator {
            calls: Mutex::new(Vec::new()),
        });
        let ctx = make_ctx(Some(Arc::clone(&delegator)));
        let node = make_node(json!({
            "target_agent": "researcher",
            "task_description": "summarize recent facts",
            "depth": 3,
            "style": "terse"
        }));

        let outcome = DelegateExecutor.execute(&node, &ctx).await.unwrap();
        assert_eq!(outcome["agent"], json!("researcher"));
        assert_eq!(outcome["response"]["summary"], json!("done"));
        assert_eq!(outcome["confidence"], json!(0.9));

        let calls = delegator.calls.lock();
        assert_eq!(calls[0].0, "researcher");
        assert_eq!(calls[0].1, "summarize recent facts");
        assert_eq!(calls[0].2, json!({ "depth": 3, "style": "terse" }));
    }

    #[tokio::test]
    async fn missing_target_agent_is_an_error() {
        let ctx = make_ctx(None);
        let node = make_node(json!({ "task_description": "orphan task" }));
        let err = DelegateExecutor.execute(&node, &ctx).await.unwrap_err();
        assert!(err.to_string().contains("target_agent"));
    }

    #[tokio::test]
    async fn missing_delegator_is_an_error() {
        let ctx = make_ctx(None);
        let node = make_node(json!({
            "target_agent": "researcher",
            "task_description": "summarize"
        }));
        let err = DelegateExecutor.execute(&node, &ctx).await.unwrap_err();
        assert!(err.to_string().contains("no delegator"));
    }

    #[test]
    fn validate_reports_both_missing_params() {
        let node = make_node(json!({}));
        let errs = DelegateExecutor.validate(&node).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs[0].contains("target_agent"));
        assert!(errs[1].contains("task_description"));
    }
}
