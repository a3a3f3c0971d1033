//! Builder for assembling an [`Engine`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::{Engine, EngineError};
use crate::executors::ExecutorRegistry;
use crate::traits::{CheckpointSink, Delegator, NodeExecutor, ToolInvoker};

const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Assembles an [`Engine`] from its collaborators.
///
/// Only the tool invoker is required; everything else has a workable
/// default. The built-in `tool`, `delegate`, `branch` and `delay` executors
/// are preregistered and can be replaced with [`executor()`](Self::executor).
pub struct EngineBuilder {
    tools: Option<Arc<dyn ToolInvoker>>,
    delegator: Option<Arc<dyn Delegator>>,
    checkpoints: Option<Arc<dyn CheckpointSink>>,
    registry: ExecutorRegistry,
    event_capacity: usize,
}

impl EngineBuilder {
    pub(super) fn new() -> Self {
        Self {
            tools: None,
            delegator: None,
            checkpoints: None,
            registry: ExecutorRegistry::with_builtins(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Set the tool invoker. Required.
    pub fn tools(mut self, invoker: impl ToolInvoker + 'static) -> Self {
        self.tools = Some(Arc::new(invoker));
        self
    }

    /// Set the delegation collaborator. Optional; without one, `delegate`
    /// nodes fail at run time.
    pub fn delegator(mut self, delegator: impl Delegator + 'static) -> Self {
        self.delegator = Some(Arc::new(delegator));
        self
    }

    /// Set the checkpoint sink. Optional; checkpoints are broadcast as
    /// events either way.
    pub fn checkpoints(mut self, sink: impl CheckpointSink + 'static) -> Self {
        self.checkpoints = Some(Arc::new(sink));
        self
    }

    /// Register (or replace) a node executor.
    pub fn executor(mut self, node_type: &str, executor: impl NodeExecutor + 'static) -> Self {
        self.registry.register(node_type, Arc::new(executor));
        self
    }

    /// Capacity of the event broadcast channel. Slow subscribers that fall
    /// further behind than this lose the oldest events.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        let tools = self.tools.ok_or_else(|| EngineError::Build {
            message: "a tool invoker is required".to_string(),
        })?;
        let (events, _) = broadcast::channel(self.event_capacity);
        Ok(Engine {
            registry: RwLock::new(self.registry),
            tools,
            delegator: self.delegator,
            checkpoints: self.checkpoints,
            events,
            active: RwLock::new(HashMap::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::errors::ToolError;

    struct NullTools;

    #[async_trait]
    impl ToolInvoker for NullTools {
        async fn invoke(&self, _operation: &str, _params: &Value) -> Result<Value, ToolError> {
            Ok(json!({}))
        }
    }

    #[test]
    fn build_requires_a_tool_invoker() {
        let err = Engine::builder().build().unwrap_err();
        assert!(err.to_string().contains("tool invoker"));
    }

    #[test]
    fn build_succeeds_with_only_tools() {
        assert!(Engine::builder().tools(NullTools).build().is_ok());
    }

    #[test]
    fn engine_debug_stays_concise() {
        let engine = Engine::builder().tools(NullTools).build().unwrap();
        let text = format!("{engine:?}");
        assert!(text.contains("active_runs: 0"), "got: {text}");
        assert!(!text.contains("registry"), "got: {text}");
    }

    #[test]
    fn event_capacity_has_a_floor_of_one() {
        let engine = Engine::builder()
            .tools(NullTools)
            .event_capacity(0)
            .build()
            .unwrap();
        // a zero-capacity broadcast channel would panic at construction
        drop(engine.subscribe());
    }
}
