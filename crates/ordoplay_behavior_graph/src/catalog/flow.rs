// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow control nodes (Branch, Sequence).

use super::BuiltinNode;
use crate::node::{ExecutionResult, NodeBehavior, NodeCategory, NodeError, NodeInstance, NodeType};
use crate::port::node_ports;
use crate::value::PropertyKind;

node_ports! {
    /// `Branch` inputs
    pub enum BranchInput {
        /// Flow
        Exec => "Exec",
        /// Which way to go
        Condition => "Condition",
    }
}

node_ports! {
    /// `Branch` outputs
    pub enum BranchOutput {
        /// Taken when the condition holds
        True => "True",
        /// Taken otherwise
        False => "False",
    }
}

node_ports! {
    /// `Sequence` outputs, in priority order
    pub enum SequenceOutput {
        /// Tried first
        First => "First",
        /// Tried if `First` is unconnected
        Second => "Second",
        /// Tried last
        Third => "Third",
    }
}

pub(super) fn branch_type() -> NodeType {
    NodeType::new(
        BuiltinNode::Branch.type_name(),
        NodeCategory::Flow,
        NodeBehavior::Builtin(BuiltinNode::Branch),
    )
    .with_description("If/else branching")
    .with_exec_input(BranchInput::Exec)
    .with_data_input(BranchInput::Condition, PropertyKind::Bool, false)
    .with_exec_output(BranchOutput::True)
    .with_exec_output(BranchOutput::False)
}

pub(super) fn sequence_type() -> NodeType {
    let mut node_type = NodeType::new(
        BuiltinNode::Sequence.type_name(),
        NodeCategory::Flow,
        NodeBehavior::Builtin(BuiltinNode::Sequence),
    )
    .with_description("Continue along the first connected output")
    .with_exec_input(super::ExecPort::Exec);

    for port in SequenceOutput::ALL {
        node_type = node_type.with_exec_output(*port);
    }
    node_type
}

pub(super) fn branch(node: &NodeInstance) -> Result<ExecutionResult, NodeError> {
    let port = if node.bool(BranchInput::Condition.name())? {
        BranchOutput::True
    } else {
        BranchOutput::False
    };
    Ok(ExecutionResult::flow(port))
}

pub(super) fn sequence() -> ExecutionResult {
    ExecutionResult::MultiFlow {
        ports: SequenceOutput::ALL.iter().map(|p| String::from(*p)).collect(),
        sequential: true,
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::instance;
    use super::*;
    use crate::value::PropertyValue;

    #[test]
    fn test_branch_routes_by_condition() {
        let mut node = instance(BuiltinNode::Branch);
        assert_eq!(branch(&node).unwrap(), ExecutionResult::flow("False"));

        node.set_property("Condition", PropertyValue::Bool(true));
        assert_eq!(branch(&node).unwrap(), ExecutionResult::flow("True"));
    }

    #[test]
    fn test_branch_rejects_non_bool() {
        let mut node = instance(BuiltinNode::Branch);
        node.set_property("Condition", PropertyValue::Float(1.0));
        assert!(matches!(branch(&node), Err(NodeError::TypeMismatch { .. })));
    }

    #[test]
    fn test_sequence_is_sequential() {
        match sequence() {
            ExecutionResult::MultiFlow { ports, sequential } => {
                assert!(sequential);
                assert_eq!(ports, vec!["First", "Second", "Third"]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
