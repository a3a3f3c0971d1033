//! Write-operation gating.
//!
//! Nodes whose name matches a known write operation are skipped in dry-run
//! mode, and approval-required nodes are skipped until writes are enabled.
//! A skipped node still records an outcome so downstream conditions can see
//! it ran.

use serde_json::{json, Value};

use crate::types::WorkflowNode;

/// Tool operations that mutate the knowledge base, the filesystem, or the
/// backing database. Matched against the node `name`, not its `type`.
pub const WRITE_OPERATIONS: [&str; 17] = [
    "add_fact",
    "delete_fact",
    "update_fact",
    "write_file",
    "create_file",
    "delete_file",
    "move_file",
    "edit_file",
    "multi_edit",
    "db_vacuum",
    "db_enable_wal",
    "db_checkpoint",
    "backup_kb",
    "restore_kb",
    "bulk_delete",
    "bulk_translate_predicates",
    "project_snapshot",
];

pub fn is_write_operation(name: &str) -> bool {
    WRITE_OPERATIONS.contains(&name)
}

/// Why a node was withheld from execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DryRun,
    ApprovalRequired,
}

impl SkipReason {
    /// Reason string recorded in the node outcome and emitted on the
    /// `node:skipped` event.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::DryRun => "dry run mode",
            SkipReason::ApprovalRequired => "approval required",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate verdict for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Skip(SkipReason),
}

/// Decide whether `node` may run under the current safety flags.
///
/// Dry-run wins over approval: a write operation in dry-run mode is skipped
/// with the dry-run reason even when it also requires approval.
pub fn check(node: &WorkflowNode, dry_run: bool, write_enabled: bool) -> GateDecision {
    if dry_run && is_write_operation(&node.name) {
        return GateDecision::Skip(SkipReason::DryRun);
    }
    if node.approval_required && !write_enabled {
        return GateDecision::Skip(SkipReason::ApprovalRequired);
    }
    GateDecision::Proceed
}

/// Outcome document recorded for a skipped node.
pub fn skip_outcome(reason: SkipReason) -> Value {
    json!({ "skipped": true, "reason": reason.as_str() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(name: &str, approval_required: bool) -> WorkflowNode {
        WorkflowNode {
            id: "n1".into(),
            node_type: "tool".into(),
            name: name.into(),
            params: json!({}),
            approval_required,
        }
    }

    #[test]
    fn write_operations_are_skipped_in_dry_run() {
        let decision = check(&node("add_fact", false), true, false);
        assert_eq!(decision, GateDecision::Skip(SkipReason::DryRun));
    }

    #[test]
    fn read_operations_run_in_dry_run() {
        let decision = check(&node("search_knowledge", false), true, false);
        assert_eq!(decision, GateDecision::Proceed);
    }

    #[test]
    fn write_operations_run_when_dry_run_is_off() {
        let decision = check(&node("delete_fact", false), false, true);
        assert_eq!(decision, GateDecision::Proceed);
    }

    #[test]
    fn approval_required_without_write_enabled_skips() {
        let decision = check(&node("search_knowledge", true), false, false);
        assert_eq!(decision, GateDecision::Skip(SkipReason::ApprovalRequired));
    }

    #[test]
    fn approval_required_with_write_enabled_proceeds() {
        let decision = check(&node("search_knowledge", true), false, true);
        assert_eq!(decision, GateDecision::Proceed);
    }

    #[test]
    fn dry_run_reason_wins_over_approval() {
        let decision = check(&node("restore_kb", true), true, false);
        assert_eq!(decision, GateDecision::Skip(SkipReason::DryRun));
    }

    #[test]
    fn skip_outcome_shape() {
        let outcome = skip_outcome(SkipReason::ApprovalRequired);
        assert_eq!(
            outcome,
            json!({ "skipped": true, "reason": "approval required" })
        );
    }

    #[test]
    fn write_list_matches_name_exactly() {
        assert!(is_write_operation("db_vacuum"));
        assert!(!is_write_operation("db_vacuum_all"));
        assert!(!is_write_operation("get_facts_count"));
    }
}
