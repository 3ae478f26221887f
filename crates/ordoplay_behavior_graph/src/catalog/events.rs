// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event nodes: the roots every tick starts from.

use super::{BuiltinNode, ExecPort};
use crate::context::NodeContext;
use crate::node::{ExecutionResult, NodeBehavior, NodeCategory, NodeError, NodeType};
use crate::port::node_ports;
use crate::value::{PropertyKind, PropertyValue};
use indexmap::IndexMap;

node_ports! {
    /// `OnUpdate` outputs
    pub enum UpdateOutput {
        /// Flow
        Exec => "Exec",
        /// Seconds since the previous tick
        DeltaTime => "deltaTime",
    }
}

node_ports! {
    /// `OnCollision` outputs
    pub enum CollisionOutput {
        /// Flow
        Exec => "Exec",
        /// The entity collided with
        OtherObject => "otherObject",
    }
}

pub(super) fn on_start_type() -> NodeType {
    NodeType::new(
        BuiltinNode::OnStart.type_name(),
        NodeCategory::Event,
        NodeBehavior::Builtin(BuiltinNode::OnStart),
    )
    .with_description("Triggered on the first tick after play starts")
    .with_exec_output(ExecPort::Exec)
}

pub(super) fn on_update_type() -> NodeType {
    NodeType::new(
        BuiltinNode::OnUpdate.type_name(),
        NodeCategory::Event,
        NodeBehavior::Builtin(BuiltinNode::OnUpdate),
    )
    .with_description("Triggered every tick")
    .with_exec_output(UpdateOutput::Exec)
    .with_data_output(UpdateOutput::DeltaTime, PropertyKind::Float)
}

pub(super) fn on_collision_type() -> NodeType {
    NodeType::new(
        BuiltinNode::OnCollision.type_name(),
        NodeCategory::Event,
        NodeBehavior::Builtin(BuiltinNode::OnCollision),
    )
    .with_description("Triggered when the owning entity collides")
    .with_exec_output(CollisionOutput::Exec)
    .with_data_output(CollisionOutput::OtherObject, PropertyKind::Object)
    .triggered_by_collision()
}

pub(super) fn on_start(ctx: &NodeContext<'_>) -> Result<ExecutionResult, NodeError> {
    if ctx.frame == 0 {
        Ok(ExecutionResult::flow(ExecPort::Exec))
    } else {
        Ok(ExecutionResult::NoOp)
    }
}

pub(super) fn on_update(ctx: &NodeContext<'_>) -> Result<ExecutionResult, NodeError> {
    let mut values = IndexMap::new();
    values.insert(
        UpdateOutput::DeltaTime.into(),
        PropertyValue::Float(ctx.delta_time),
    );
    Ok(ExecutionResult::FlowWithValues {
        port: UpdateOutput::Exec.into(),
        values,
    })
}

pub(super) fn on_collision(ctx: &NodeContext<'_>) -> Result<ExecutionResult, NodeError> {
    let Some(other) = ctx.collision_other() else {
        return Ok(ExecutionResult::NoOp);
    };

    let mut values = IndexMap::new();
    values.insert(
        CollisionOutput::OtherObject.into(),
        PropertyValue::Object(Some(other)),
    );
    Ok(ExecutionResult::FlowWithValues {
        port: CollisionOutput::Exec.into(),
        values,
    })
}
