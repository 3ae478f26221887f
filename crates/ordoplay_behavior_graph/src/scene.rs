// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory scene implementing the host capabilities.
//!
//! Holds transforms and optional rigidbodies. Forces applied by graphs
//! accumulate on the rigidbody until the host drains them with
//! [`SceneWorld::take_force`]; there is no integration step.

use crate::context::{CapabilityError, EntityId, SceneAccess};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Entity transform
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Position (x, y, z)
    pub position: [f32; 3],
}

/// Rigidbody state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rigidbody {
    /// Mass in kilograms
    pub mass: f32,
    /// Force gathered since it was last drained
    #[serde(default)]
    pub accumulated_force: [f32; 3],
}

impl Rigidbody {
    /// Create a body with no pending force
    pub fn new(mass: f32) -> Self {
        Self {
            mass,
            accumulated_force: [0.0; 3],
        }
    }
}

/// A scene entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntity {
    /// Display name
    pub name: String,
    /// Transform component
    #[serde(default)]
    pub transform: Transform,
    /// Rigidbody component
    #[serde(default)]
    pub rigidbody: Option<Rigidbody>,
}

impl SceneEntity {
    /// Create an entity at a position
    pub fn new(name: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            transform: Transform { position },
            rigidbody: None,
        }
    }
}

/// All entities in the scene, in spawn order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneWorld {
    /// Entities by id
    pub entities: IndexMap<EntityId, SceneEntity>,
}

impl SceneWorld {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity and return its id
    pub fn spawn(&mut self, name: impl Into<String>, position: [f32; 3]) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(id, SceneEntity::new(name, position));
        id
    }

    /// Give an entity a rigidbody, replacing any existing one
    pub fn add_rigidbody(&mut self, entity: EntityId, mass: f32) -> bool {
        match self.entities.get_mut(&entity) {
            Some(data) => {
                data.rigidbody = Some(Rigidbody::new(mass));
                true
            }
            None => false,
        }
    }

    /// Get an entity
    pub fn entity(&self, id: EntityId) -> Option<&SceneEntity> {
        self.entities.get(&id)
    }

    /// Get an entity mutably
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut SceneEntity> {
        self.entities.get_mut(&id)
    }

    /// Find an entity by name
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, data)| data.name == name)
            .map(|(id, _)| *id)
    }

    /// Drain the force gathered on an entity's rigidbody
    pub fn take_force(&mut self, entity: EntityId) -> Option<[f32; 3]> {
        let body = self.entities.get_mut(&entity)?.rigidbody.as_mut()?;
        Some(std::mem::take(&mut body.accumulated_force))
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the scene is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SceneAccess for SceneWorld {
    fn position(&self, entity: EntityId) -> Result<[f32; 3], CapabilityError> {
        self.entities
            .get(&entity)
            .map(|data| data.transform.position)
            .ok_or(CapabilityError::NoEntity(entity))
    }

    fn set_position(&mut self, entity: EntityId, position: [f32; 3]) -> Result<(), CapabilityError> {
        let data = self
            .entities
            .get_mut(&entity)
            .ok_or(CapabilityError::NoEntity(entity))?;
        data.transform.position = position;
        Ok(())
    }

    fn apply_force(&mut self, entity: EntityId, force: [f32; 3]) -> Result<(), CapabilityError> {
        let data = self
            .entities
            .get_mut(&entity)
            .ok_or(CapabilityError::NoEntity(entity))?;
        let body = data.rigidbody.as_mut().ok_or(CapabilityError::MissingComponent {
            entity,
            component: "Rigidbody",
        })?;

        for (total, f) in body.accumulated_force.iter_mut().zip(force) {
            *total += f;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_find() {
        let mut scene = SceneWorld::new();
        let player = scene.spawn("Player", [1.0, 0.0, 0.0]);
        scene.spawn("Wall", [4.0, 0.0, 0.0]);

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.find("Player"), Some(player));
        assert_eq!(scene.find("Ghost"), None);
        assert_eq!(scene.position(player).unwrap(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_entity() {
        let mut scene = SceneWorld::new();
        let stranger = EntityId::new();

        assert_eq!(scene.position(stranger), Err(CapabilityError::NoEntity(stranger)));
        assert!(scene.set_position(stranger, [0.0; 3]).is_err());
        assert!(!scene.add_rigidbody(stranger, 1.0));
    }

    #[test]
    fn test_forces_accumulate_until_drained() {
        let mut scene = SceneWorld::new();
        let ball = scene.spawn("Ball", [0.0; 3]);
        let wall = scene.spawn("Wall", [3.0, 0.0, 0.0]);
        scene.add_rigidbody(ball, 2.0);

        scene.apply_force(ball, [4.0, 0.0, 0.0]).unwrap();
        scene.apply_force(ball, [0.0, 1.0, 0.0]).unwrap();
        assert_eq!(scene.take_force(ball), Some([4.0, 1.0, 0.0]));
        assert_eq!(scene.take_force(ball), Some([0.0; 3]));

        assert_eq!(
            scene.apply_force(wall, [1.0, 0.0, 0.0]),
            Err(CapabilityError::MissingComponent {
                entity: wall,
                component: "Rigidbody",
            })
        );
        assert_eq!(scene.take_force(wall), None);
        // Forces never move anything
        assert_eq!(scene.position(ball).unwrap(), [0.0; 3]);
    }
}
