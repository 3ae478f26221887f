// SPDX-License-Identifier: MIT OR Apache-2.0
//! Variable access and debugging nodes.

use super::{BuiltinNode, ExecPort};
use crate::context::NodeContext;
use crate::node::{
    ExecutionResult, NodeBehavior, NodeCategory, NodeError, NodeInstance, NodeType,
    PropertyBinding,
};
use crate::port::node_ports;
use crate::value::PropertyKind;

/// Internal property naming the variable a node reads or writes
pub const VARIABLE_NAME: &str = "Name";

node_ports! {
    /// `SetVariable` inputs
    pub enum VariableInput {
        /// Flow
        Exec => "Exec",
        /// Value to store
        Value => "Value",
    }
}

node_ports! {
    /// `GetVariable` outputs
    pub enum VariableOutput {
        /// Stored value
        Value => "Value",
    }
}

node_ports! {
    /// `Print` inputs
    pub enum PrintInput {
        /// Flow
        Exec => "Exec",
        /// Value to log
        Value => "Value",
    }
}

pub(super) fn get_variable_type() -> NodeType {
    NodeType::new(
        BuiltinNode::GetVariable.type_name(),
        NodeCategory::Variable,
        NodeBehavior::Builtin(BuiltinNode::GetVariable),
    )
    .with_description("Read a graph variable")
    .with_property(VARIABLE_NAME, PropertyKind::String, "", PropertyBinding::Internal)
    .with_data_output(VariableOutput::Value, PropertyKind::Any)
}

pub(super) fn set_variable_type() -> NodeType {
    NodeType::new(
        BuiltinNode::SetVariable.type_name(),
        NodeCategory::Variable,
        NodeBehavior::Builtin(BuiltinNode::SetVariable),
    )
    .with_description("Write a graph variable")
    .with_property(VARIABLE_NAME, PropertyKind::String, "", PropertyBinding::Internal)
    .with_exec_input(VariableInput::Exec)
    .with_data_input(VariableInput::Value, PropertyKind::Any, PropertyKind::Any.zero())
    .with_exec_output(ExecPort::Exec)
}

pub(super) fn print_type() -> NodeType {
    NodeType::new(
        BuiltinNode::Print.type_name(),
        NodeCategory::Utility,
        NodeBehavior::Builtin(BuiltinNode::Print),
    )
    .with_description("Log a value to the console")
    .with_exec_input(PrintInput::Exec)
    .with_data_input(PrintInput::Value, PropertyKind::Any, "")
    .with_exec_output(ExecPort::Exec)
}

pub(super) fn get_variable(
    node: &NodeInstance,
    ctx: &NodeContext<'_>,
) -> Result<ExecutionResult, NodeError> {
    let name = node.string(VARIABLE_NAME)?;
    let value = ctx
        .variables
        .get(&name)
        .cloned()
        .ok_or(NodeError::UnknownVariable(name))?;
    Ok(ExecutionResult::value(VariableOutput::Value, value))
}

pub(super) fn set_variable(
    node: &NodeInstance,
    ctx: &mut NodeContext<'_>,
) -> Result<ExecutionResult, NodeError> {
    let name = node.string(VARIABLE_NAME)?;
    let value = node
        .property(VariableInput::Value.name())
        .cloned()
        .unwrap_or_default();

    ctx.variables.set(name, value);
    Ok(ExecutionResult::flow(ExecPort::Exec))
}

pub(super) fn print(
    node: &NodeInstance,
    ctx: &NodeContext<'_>,
) -> Result<ExecutionResult, NodeError> {
    let value = node
        .property(PrintInput::Value.name())
        .cloned()
        .unwrap_or_default();

    tracing::info!(entity = %ctx.entity, node = %node.id, "{value}");
    Ok(ExecutionResult::flow(ExecPort::Exec))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{instance, run, EmptyScene};
    use super::*;
    use crate::context::EntityId;
    use crate::graph::VariableTable;
    use crate::value::PropertyValue;

    #[test]
    fn test_set_then_get_variable() {
        let mut vars = VariableTable::new();
        let entity = EntityId::new();

        let mut setter = instance(BuiltinNode::SetVariable);
        setter.set_property(VARIABLE_NAME, "score".into());
        setter.set_property("Value", PropertyValue::Int(42));
        run(BuiltinNode::SetVariable, &mut setter, &mut EmptyScene, &mut vars, entity).unwrap();
        assert_eq!(vars.get("score"), Some(&PropertyValue::Int(42)));

        let mut getter = instance(BuiltinNode::GetVariable);
        getter.set_property(VARIABLE_NAME, "score".into());
        let result =
            run(BuiltinNode::GetVariable, &mut getter, &mut EmptyScene, &mut vars, entity).unwrap();
        assert_eq!(result, ExecutionResult::value("Value", 42i64));
    }

    #[test]
    fn test_unset_variable_is_an_error() {
        let mut vars = VariableTable::new();
        let mut getter = instance(BuiltinNode::GetVariable);
        getter.set_property(VARIABLE_NAME, "missing".into());

        let result =
            run(BuiltinNode::GetVariable, &mut getter, &mut EmptyScene, &mut vars, EntityId::new());
        assert!(matches!(result, Err(NodeError::UnknownVariable(name)) if name == "missing"));
    }
}
