// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-tick execution context and the host capabilities nodes may use.

use crate::graph::VariableTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a scene entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Two entities that collided this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// First entity
    pub a: EntityId,
    /// Second entity
    pub b: EntityId,
}

impl CollisionEvent {
    /// Create a new collision event
    pub fn new(a: EntityId, b: EntityId) -> Self {
        Self { a, b }
    }

    /// The entity `entity` collided with, if it took part
    pub fn other(&self, entity: EntityId) -> Option<EntityId> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A capability the host could not provide
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The entity is not in the scene
    #[error("Entity not found: {0}")]
    NoEntity(EntityId),

    /// The entity lacks the component the node needs
    #[error("Entity {entity} has no {component} component")]
    MissingComponent {
        /// Target entity
        entity: EntityId,
        /// Missing component name
        component: &'static str,
    },
}

/// Scene capabilities the host exposes to built-in nodes.
///
/// The interpreter never owns the scene; it borrows it for the duration of
/// one tick.
pub trait SceneAccess {
    /// World position of an entity
    fn position(&self, entity: EntityId) -> Result<[f32; 3], CapabilityError>;

    /// Move an entity
    fn set_position(&mut self, entity: EntityId, position: [f32; 3]) -> Result<(), CapabilityError>;

    /// Forward a force to the entity's force-capable component
    fn apply_force(&mut self, entity: EntityId, force: [f32; 3]) -> Result<(), CapabilityError>;
}

/// What the host hands the executor for one graph on one tick
pub struct ExecutionContext<'a> {
    /// Seconds since the previous tick
    pub delta_time: f32,
    /// Ticks since play started, zero on the first
    pub frame: u64,
    /// Entity that owns the graph being ticked
    pub entity: EntityId,
    /// Collision involving `entity` this tick, if any
    pub collision: Option<CollisionEvent>,
    /// Host scene
    pub scene: &'a mut dyn SceneAccess,
}

impl<'a> ExecutionContext<'a> {
    /// Create a context with no collision
    pub fn new(
        entity: EntityId,
        delta_time: f32,
        frame: u64,
        scene: &'a mut dyn SceneAccess,
    ) -> Self {
        Self {
            delta_time,
            frame,
            entity,
            collision: None,
            scene,
        }
    }

    /// Attach a collision event
    pub fn with_collision(mut self, collision: CollisionEvent) -> Self {
        self.collision = Some(collision);
        self
    }
}

/// What a single node invocation can see and touch
pub struct NodeContext<'a> {
    /// Seconds since the previous tick
    pub delta_time: f32,
    /// Ticks since play started
    pub frame: u64,
    /// Entity that owns the graph
    pub entity: EntityId,
    /// Collision involving `entity` this tick, if any
    pub collision: Option<CollisionEvent>,
    /// Host scene
    pub scene: &'a mut dyn SceneAccess,
    /// The graph's variables
    pub variables: &'a mut VariableTable,
}

impl NodeContext<'_> {
    /// Resolve an object reference, defaulting to the owning entity
    pub fn resolve_object(&self, object: Option<EntityId>) -> EntityId {
        object.unwrap_or(self.entity)
    }

    /// The other party of this tick's collision
    pub fn collision_other(&self) -> Option<EntityId> {
        self.collision.and_then(|c| c.other(self.entity))
    }
}
