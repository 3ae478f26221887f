// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node catalog.
//!
//! Every built-in kind is a variant of [`BuiltinNode`], so adding one forces
//! both its definition and its execution function to be handled. Nodes that
//! live outside the catalog go through [`crate::node::NodeBehavior::Custom`].

mod events;
mod flow;
mod math;
mod physics;
mod transform;
mod utility;

pub use events::{CollisionOutput, UpdateOutput};
pub use flow::{BranchInput, BranchOutput, SequenceOutput};
pub use math::{MathOutput, OperandInput};
pub use physics::ApplyForceInput;
pub use transform::{GetPositionInput, GetPositionOutput, SetPositionInput};
pub use utility::{PrintInput, VariableInput, VariableOutput, VARIABLE_NAME};

use crate::context::NodeContext;
use crate::node::{ExecutionResult, NodeError, NodeInstance, NodeRegistry, NodeType};
use crate::port::node_ports;

node_ports! {
    /// The single flow port most nodes share
    pub enum ExecPort {
        /// Flow in or out
        Exec => "Exec",
    }
}

/// Built-in node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinNode {
    /// Fires on the first tick after play starts
    OnStart,
    /// Fires every tick with the frame delta
    OnUpdate,
    /// Fires once per collision involving the owning entity
    OnCollision,
    /// Routes flow by a boolean
    Branch,
    /// Takes the first connected of three outputs
    Sequence,
    /// Sums two values
    Add,
    /// Multiplies two values
    Multiply,
    /// Reads an entity position
    GetPosition,
    /// Writes an entity position
    SetPosition,
    /// Pushes a force into an entity's rigidbody
    ApplyForce,
    /// Reads a graph variable
    GetVariable,
    /// Writes a graph variable
    SetVariable,
    /// Logs a value
    Print,
}

impl BuiltinNode {
    /// Every built-in, in registration order
    pub const ALL: &'static [BuiltinNode] = &[
        Self::OnStart,
        Self::OnUpdate,
        Self::OnCollision,
        Self::Branch,
        Self::Sequence,
        Self::Add,
        Self::Multiply,
        Self::GetPosition,
        Self::SetPosition,
        Self::ApplyForce,
        Self::GetVariable,
        Self::SetVariable,
        Self::Print,
    ];

    /// Registry key
    pub fn type_name(self) -> &'static str {
        match self {
            Self::OnStart => "OnStart",
            Self::OnUpdate => "OnUpdate",
            Self::OnCollision => "OnCollision",
            Self::Branch => "Branch",
            Self::Sequence => "Sequence",
            Self::Add => "Add",
            Self::Multiply => "Multiply",
            Self::GetPosition => "GetPosition",
            Self::SetPosition => "SetPosition",
            Self::ApplyForce => "ApplyForce",
            Self::GetVariable => "GetVariable",
            Self::SetVariable => "SetVariable",
            Self::Print => "Print",
        }
    }

    /// Full type definition
    pub fn node_type(self) -> NodeType {
        match self {
            Self::OnStart => events::on_start_type(),
            Self::OnUpdate => events::on_update_type(),
            Self::OnCollision => events::on_collision_type(),
            Self::Branch => flow::branch_type(),
            Self::Sequence => flow::sequence_type(),
            Self::Add => math::add_type(),
            Self::Multiply => math::multiply_type(),
            Self::GetPosition => transform::get_position_type(),
            Self::SetPosition => transform::set_position_type(),
            Self::ApplyForce => physics::apply_force_type(),
            Self::GetVariable => utility::get_variable_type(),
            Self::SetVariable => utility::set_variable_type(),
            Self::Print => utility::print_type(),
        }
    }

    /// Run this kind against one instance
    pub fn execute(
        self,
        node: &mut NodeInstance,
        ctx: &mut NodeContext<'_>,
    ) -> Result<ExecutionResult, NodeError> {
        match self {
            Self::OnStart => events::on_start(ctx),
            Self::OnUpdate => events::on_update(ctx),
            Self::OnCollision => events::on_collision(ctx),
            Self::Branch => flow::branch(node),
            Self::Sequence => Ok(flow::sequence()),
            Self::Add => math::add(node),
            Self::Multiply => math::multiply(node),
            Self::GetPosition => transform::get_position(node, ctx),
            Self::SetPosition => transform::set_position(node, ctx),
            Self::ApplyForce => physics::apply_force(node, ctx),
            Self::GetVariable => utility::get_variable(node, ctx),
            Self::SetVariable => utility::set_variable(node, ctx),
            Self::Print => utility::print(node, ctx),
        }
    }
}

/// Register every built-in kind
pub fn register_builtins(registry: &mut NodeRegistry) {
    for builtin in BuiltinNode::ALL {
        registry.register(builtin.node_type());
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for driving single nodes without a graph.

    use super::*;
    use crate::context::{CapabilityError, EntityId, SceneAccess};
    use crate::graph::VariableTable;
    use crate::node::NodeId;

    /// Scene without any capabilities
    pub struct EmptyScene;

    impl SceneAccess for EmptyScene {
        fn position(&self, entity: EntityId) -> Result<[f32; 3], CapabilityError> {
            Err(CapabilityError::NoEntity(entity))
        }

        fn set_position(&mut self, entity: EntityId, _: [f32; 3]) -> Result<(), CapabilityError> {
            Err(CapabilityError::NoEntity(entity))
        }

        fn apply_force(&mut self, entity: EntityId, _: [f32; 3]) -> Result<(), CapabilityError> {
            Err(CapabilityError::NoEntity(entity))
        }
    }

    /// Instantiate a built-in with its declared defaults
    pub fn instance(builtin: BuiltinNode) -> NodeInstance {
        let node_type = builtin.node_type();
        NodeInstance::new(
            NodeId::from_parts(0, 0),
            builtin.type_name(),
            [0.0, 0.0],
            node_type.seed_properties(None),
        )
    }

    /// Run a built-in once against `scene`
    pub fn run(
        builtin: BuiltinNode,
        node: &mut NodeInstance,
        scene: &mut dyn SceneAccess,
        variables: &mut VariableTable,
        entity: EntityId,
    ) -> Result<ExecutionResult, NodeError> {
        let mut ctx = NodeContext {
            delta_time: 0.25,
            frame: 3,
            entity,
            collision: None,
            scene,
            variables,
        };
        builtin.execute(node, &mut ctx)
    }
}
