//! Workflow definition wire types.
//!
//! These structs mirror the JSON the dashboard editor produces, key spellings
//! included (`approvalRequired`, `onError`, `type`). A definition is read-only
//! once handed to the engine; everything mutable lives in
//! [`ExecutionContext`](super::ExecutionContext).

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Nodes and edges
// ---------------------------------------------------------------------------

/// One operation in a workflow graph.
///
/// `node_type` selects the executor strategy; `name` identifies the concrete
/// operation behind it and doubles as the key for write-operation
/// classification. `params` is opaque to the engine and handed to the
/// executor verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    #[serde(default = "empty_params")]
    pub params: Value,
    #[serde(default)]
    pub approval_required: bool,
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A directed dependency: `target` runs only after `source` has an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Declared error policy. Carried on the wire for round-trip fidelity;
/// run-time behavior is governed by
/// [`ExecutionOptions`](super::ExecutionOptions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    #[default]
    Stop,
    Continue,
}

/// An immutable workflow: nodes, dependency edges, and declared policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub version: String,
    pub id: String,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

impl WorkflowDefinition {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_definition() -> WorkflowDefinition {
        WorkflowDefinition {
            version: "2.0".into(),
            id: "wf-kb-audit".into(),
            nodes: vec![
                WorkflowNode {
                    id: "n1".into(),
                    node_type: "tool".into(),
                    name: "get_facts_count".into(),
                    params: json!({}),
                    approval_required: false,
                },
                WorkflowNode {
                    id: "n2".into(),
                    node_type: "tool".into(),
                    name: "add_fact".into(),
                    params: json!({"statement": "IsA(Socrates, Philosopher)"}),
                    approval_required: true,
                },
            ],
            edges: vec![WorkflowEdge {
                id: "e1".into(),
                source: "n1".into(),
                target: "n2".into(),
            }],
            retries: 1,
            on_error: ErrorPolicy::Stop,
        }
    }

    #[test]
    fn wire_key_spellings() {
        let def = sample_definition();
        let text = serde_json::to_string(&def).unwrap();
        assert!(text.contains(r#""approvalRequired":true"#), "got: {text}");
        assert!(text.contains(r#""onError":"stop""#), "got: {text}");
        assert!(text.contains(r#""type":"tool""#), "got: {text}");
        assert!(!text.contains("node_type"), "got: {text}");
    }

    #[test]
    fn definition_round_trip() {
        let def = sample_definition();
        let text = serde_json::to_string(&def).unwrap();
        let back: WorkflowDefinition = serde_json::from_str(&text).unwrap();
        assert_eq!(def, back);
    }

    #[test]
    fn deserialize_editor_payload() {
        let text = r#"{
            "version": "2.0",
            "id": "wf-1",
            "nodes": [
                {"id": "a", "type": "tool", "name": "search_knowledge",
                 "params": {"query": "philosophers"}, "approvalRequired": false},
                {"id": "b", "type": "delay", "name": "pause",
                 "params": {"seconds": 2}, "approvalRequired": false}
            ],
            "edges": [{"id": "e1", "source": "a", "target": "b"}],
            "retries": 1,
            "onError": "continue"
        }"#;
        let def: WorkflowDefinition = serde_json::from_str(text).unwrap();
        assert_eq!(def.nodes.len(), 2);
        assert_eq!(def.nodes[0].node_type, "tool");
        assert_eq!(def.nodes[1].params["seconds"], json!(2));
        assert_eq!(def.on_error, ErrorPolicy::Continue);
    }

    #[test]
    fn optional_fields_default() {
        let text = r#"{
            "version": "2.0",
            "id": "wf-min",
            "nodes": [{"id": "a", "type": "tool", "name": "get_facts_count"}],
            "edges": []
        }"#;
        let def: WorkflowDefinition = serde_json::from_str(text).unwrap();
        assert_eq!(def.nodes[0].params, json!({}));
        assert!(!def.nodes[0].approval_required);
        assert_eq!(def.retries, 0);
        assert_eq!(def.on_error, ErrorPolicy::Stop);
    }

    #[test]
    fn node_lookup() {
        let def = sample_definition();
        assert_eq!(def.node("n2").unwrap().name, "add_fact");
        assert!(def.node("missing").is_none());
    }
}
