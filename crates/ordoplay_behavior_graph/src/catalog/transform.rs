// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transform accessors and mutators.

use super::{BuiltinNode, ExecPort};
use crate::context::NodeContext;
use crate::node::{ExecutionResult, NodeBehavior, NodeCategory, NodeError, NodeInstance, NodeType};
use crate::port::node_ports;
use crate::value::{PropertyKind, PropertyValue};

node_ports! {
    /// `GetPosition` inputs
    pub enum GetPositionInput {
        /// Entity to read; unset means self
        Object => "Object",
    }
}

node_ports! {
    /// `GetPosition` outputs
    pub enum GetPositionOutput {
        /// World position
        Position => "Position",
    }
}

node_ports! {
    /// `SetPosition` inputs
    pub enum SetPositionInput {
        /// Flow
        Exec => "Exec",
        /// Entity to move; unset means self
        Object => "Object",
        /// New world position
        Position => "Position",
    }
}

pub(super) fn get_position_type() -> NodeType {
    NodeType::new(
        BuiltinNode::GetPosition.type_name(),
        NodeCategory::Transform,
        NodeBehavior::Builtin(BuiltinNode::GetPosition),
    )
    .with_description("Read an entity's world position")
    .with_data_input(GetPositionInput::Object, PropertyKind::Object, PropertyValue::Object(None))
    .with_data_output(GetPositionOutput::Position, PropertyKind::Vector3)
}

pub(super) fn set_position_type() -> NodeType {
    NodeType::new(
        BuiltinNode::SetPosition.type_name(),
        NodeCategory::Transform,
        NodeBehavior::Builtin(BuiltinNode::SetPosition),
    )
    .with_description("Move an entity")
    .with_exec_input(SetPositionInput::Exec)
    .with_data_input(SetPositionInput::Object, PropertyKind::Object, PropertyValue::Object(None))
    .with_data_input(SetPositionInput::Position, PropertyKind::Vector3, [0.0f32; 3])
    .with_exec_output(ExecPort::Exec)
}

pub(super) fn get_position(
    node: &NodeInstance,
    ctx: &NodeContext<'_>,
) -> Result<ExecutionResult, NodeError> {
    let target = ctx.resolve_object(node.object(GetPositionInput::Object.name())?);
    let position = ctx.scene.position(target)?;
    Ok(ExecutionResult::value(GetPositionOutput::Position, position))
}

pub(super) fn set_position(
    node: &NodeInstance,
    ctx: &mut NodeContext<'_>,
) -> Result<ExecutionResult, NodeError> {
    let target = ctx.resolve_object(node.object(SetPositionInput::Object.name())?);
    let position = node.vector3(SetPositionInput::Position.name())?;

    ctx.scene.set_position(target, position)?;
    Ok(ExecutionResult::flow(ExecPort::Exec))
}
