// SPDX-License-Identifier: MIT OR Apache-2.0
//! Arithmetic nodes.

use super::BuiltinNode;
use crate::node::{ExecutionResult, NodeBehavior, NodeCategory, NodeError, NodeInstance, NodeType};
use crate::port::node_ports;
use crate::value::{PropertyKind, PropertyValue};

node_ports! {
    /// Binary operator inputs
    pub enum OperandInput {
        /// Left operand
        A => "A",
        /// Right operand
        B => "B",
    }
}

node_ports! {
    /// Binary operator output
    pub enum MathOutput {
        /// Computed value
        Result => "Result",
    }
}

fn binary_type(builtin: BuiltinNode, description: &str) -> NodeType {
    NodeType::new(
        builtin.type_name(),
        NodeCategory::Math,
        NodeBehavior::Builtin(builtin),
    )
    .with_description(description)
    .with_data_input(OperandInput::A, PropertyKind::Float, 0.0f32)
    .with_data_input(OperandInput::B, PropertyKind::Float, 0.0f32)
    .with_data_output(MathOutput::Result, PropertyKind::Float)
}

pub(super) fn add_type() -> NodeType {
    binary_type(BuiltinNode::Add, "A + B")
}

pub(super) fn multiply_type() -> NodeType {
    binary_type(BuiltinNode::Multiply, "A * B")
}

pub(super) fn add(node: &NodeInstance) -> Result<ExecutionResult, NodeError> {
    binary(node, PropertyValue::add)
}

pub(super) fn multiply(node: &NodeInstance) -> Result<ExecutionResult, NodeError> {
    binary(node, PropertyValue::mul)
}

fn binary(
    node: &NodeInstance,
    op: fn(&PropertyValue, &PropertyValue) -> Option<PropertyValue>,
) -> Result<ExecutionResult, NodeError> {
    let a = operand(node, OperandInput::A)?;
    let b = operand(node, OperandInput::B)?;

    let result = op(&a, &b).ok_or_else(|| {
        NodeError::Custom(format!("Cannot combine {a} and {b} in {}", node.type_name))
    })?;

    Ok(ExecutionResult::value(MathOutput::Result, result))
}

fn operand(node: &NodeInstance, port: OperandInput) -> Result<PropertyValue, NodeError> {
    node.property(port.name())
        .cloned()
        .ok_or_else(|| NodeError::Custom(format!("Missing operand {}", port.name())))
}
