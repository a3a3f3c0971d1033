//! Built-in node executors and the type registry.

pub mod branch;
pub mod delay;
pub mod delegate;
pub mod tool;

pub use branch::BranchExecutor;
pub use delay::DelayExecutor;
pub use delegate::DelegateExecutor;
pub use tool::ToolExecutor;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::traits::NodeExecutor;

/// Maps node `type` tags to executors.
///
/// Unregistered types are not an error: [`resolve()`](Self::resolve) falls
/// back to tool dispatch, so a workflow may name external operations the
/// engine has never heard of.
pub struct ExecutorRegistry {
    executors: BTreeMap<String, Arc<dyn NodeExecutor>>,
    fallback: Arc<dyn NodeExecutor>,
}

impl ExecutorRegistry {
    /// Registry preloaded with the built-in `tool`, `delegate`, `branch` and
    /// `delay` executors, with tool dispatch as the fallback.
    pub fn with_builtins() -> Self {
        let tool: Arc<dyn NodeExecutor> = Arc::new(ToolExecutor);
        let mut executors: BTreeMap<String, Arc<dyn NodeExecutor>> = BTreeMap::new();
        executors.insert("tool".to_string(), Arc::clone(&tool));
        executors.insert("delegate".to_string(), Arc::new(DelegateExecutor));
        executors.insert("branch".to_string(), Arc::new(BranchExecutor));
        executors.insert("delay".to_string(), Arc::new(DelayExecutor));
        Self {
            executors,
            fallback: tool,
        }
    }

    /// Register (or replace) the executor for a node type.
    pub fn register(&mut self, node_type: impl Into<String>, executor: Arc<dyn NodeExecutor>) {
        self.executors.insert(node_type.into(), executor);
    }

    /// Executor registered for `node_type`, if any.
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.get(node_type).cloned()
    }

    /// Executor for `node_type`, falling back to tool dispatch.
    pub fn resolve(&self, node_type: &str) -> Arc<dyn NodeExecutor> {
        self.get(node_type).unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.executors.keys().map(String::as_str)
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
