// SPDX-License-Identifier: MIT OR Apache-2.0
//! Physics bridge nodes.

use super::{BuiltinNode, ExecPort};
use crate::context::NodeContext;
use crate::node::{ExecutionResult, NodeBehavior, NodeCategory, NodeError, NodeInstance, NodeType};
use crate::port::node_ports;
use crate::value::{PropertyKind, PropertyValue};

node_ports! {
    /// `ApplyForce` inputs
    pub enum ApplyForceInput {
        /// Flow
        Exec => "Exec",
        /// Entity to push; unset means self
        Object => "Object",
        /// Force vector in newtons
        Force => "Force",
    }
}

pub(super) fn apply_force_type() -> NodeType {
    NodeType::new(
        BuiltinNode::ApplyForce.type_name(),
        NodeCategory::Physics,
        NodeBehavior::Builtin(BuiltinNode::ApplyForce),
    )
    .with_description("Apply a force to an entity's rigidbody")
    .with_exec_input(ApplyForceInput::Exec)
    .with_data_input(ApplyForceInput::Object, PropertyKind::Object, PropertyValue::Object(None))
    .with_data_input(ApplyForceInput::Force, PropertyKind::Vector3, [0.0f32; 3])
    .with_exec_output(ExecPort::Exec)
}

pub(super) fn apply_force(
    node: &NodeInstance,
    ctx: &mut NodeContext<'_>,
) -> Result<ExecutionResult, NodeError> {
    let target = ctx.resolve_object(node.object(ApplyForceInput::Object.name())?);
    let force = node.vector3(ApplyForceInput::Force.name())?;

    ctx.scene.apply_force(target, force)?;
    Ok(ExecutionResult::flow(ExecPort::Exec))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{instance, run};
    use super::*;
    use crate::context::CapabilityError;
    use crate::graph::VariableTable;
    use crate::scene::SceneWorld;

    #[test]
    fn test_force_reaches_rigidbody() {
        let mut scene = SceneWorld::new();
        let body = scene.spawn("Crate", [0.0; 3]);
        scene.add_rigidbody(body, 2.0);
        let mut node = instance(BuiltinNode::ApplyForce);
        node.set_property("Force", PropertyValue::Vector3([0.0, 10.0, 0.0]));
        let mut vars = VariableTable::new();

        run(BuiltinNode::ApplyForce, &mut node, &mut scene, &mut vars, body).unwrap();
        run(BuiltinNode::ApplyForce, &mut node, &mut scene, &mut vars, body).unwrap();
        assert_eq!(scene.take_force(body), Some([0.0, 20.0, 0.0]));
        assert_eq!(scene.take_force(body), Some([0.0; 3]));
    }

    #[test]
    fn test_without_rigidbody() {
        let mut scene = SceneWorld::new();
        let wall = scene.spawn("Wall", [0.0; 3]);
        let mut node = instance(BuiltinNode::ApplyForce);
        let mut vars = VariableTable::new();

        let result = run(BuiltinNode::ApplyForce, &mut node, &mut scene, &mut vars, wall);
        assert!(matches!(
            result,
            Err(NodeError::MissingCapability(CapabilityError::MissingComponent { .. }))
        ));
    }
}
