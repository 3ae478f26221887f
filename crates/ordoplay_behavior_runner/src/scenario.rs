// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenario documents: a scene, its behavior graphs and scripted collisions.
//!
//! Nodes and entities are referred to by name so scenarios can be written by
//! hand; [`Scenario::build`] resolves them into a live interpreter and scene.

use indexmap::IndexMap;
use ordoplay_behavior_graph::{
    BehaviorInterpreter, CollisionEvent, EntityId, GraphError, InterpreterSettings, NodeId,
    PropertyValue, SceneWorld, TickStats,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Runner failures
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Could not read or write a file
    #[error("Failed to access {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The scenario is not valid RON
    #[error("Invalid scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON encoding failed
    #[error("Failed to encode RON: {0}")]
    Ron(#[from] ron::Error),

    /// JSON encoding failed
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A graph edit was rejected
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Two entities share a name
    #[error("Duplicate entity name '{0}'")]
    DuplicateEntity(String),

    /// A name does not match any entity
    #[error("No entity named '{0}'")]
    UnknownEntity(String),

    /// A connection names a node key the graph does not define
    #[error("Graph of '{entity}' has no node '{key}'")]
    UnknownNodeKey {
        /// Owning entity name
        entity: String,
        /// Node key
        key: String,
    },
}

fn default_ticks() -> u32 {
    60
}

fn default_delta_time() -> f32 {
    1.0 / 60.0
}

/// A scene entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Unique name
    pub name: String,
    /// Starting position
    #[serde(default)]
    pub position: [f32; 3],
    /// Rigidbody mass; no rigidbody when absent
    #[serde(default)]
    pub mass: Option<f32>,
}

/// A node, addressed by key within its graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Key used by connections
    pub key: String,
    /// Registered type name
    pub type_name: String,
    /// Canvas position
    #[serde(default)]
    pub position: [f32; 2],
    /// Property overrides
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
    /// Object properties given as entity names
    #[serde(default)]
    pub objects: IndexMap<String, String>,
}

/// A connection between two keyed nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDef {
    /// Source node key
    pub from: String,
    /// Source output port
    pub from_port: String,
    /// Target node key
    pub to: String,
    /// Target input port
    pub to_port: String,
}

/// One entity's behavior graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDef {
    /// Owning entity name
    pub entity: String,
    /// Nodes
    pub nodes: Vec<NodeDef>,
    /// Connections, in creation order
    #[serde(default)]
    pub connections: Vec<LinkDef>,
    /// Initial variables
    #[serde(default)]
    pub variables: IndexMap<String, PropertyValue>,
}

/// A collision reported on a given tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionDef {
    /// Zero-based tick
    pub tick: u32,
    /// First entity name
    pub a: String,
    /// Second entity name
    pub b: String,
}

/// A complete scenario document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Interpreter settings
    #[serde(default)]
    pub settings: InterpreterSettings,
    /// Ticks to run
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Seconds per tick, before time scaling
    #[serde(default = "default_delta_time")]
    pub delta_time: f32,
    /// Scene entities
    pub entities: Vec<EntityDef>,
    /// Behavior graphs
    #[serde(default)]
    pub graphs: Vec<GraphDef>,
    /// Scripted collisions
    #[serde(default)]
    pub collisions: Vec<CollisionDef>,
}

/// A built scenario, ready to tick
pub struct Simulation {
    /// The interpreter, in play mode
    pub interpreter: BehaviorInterpreter,
    /// The scene graphs act on
    pub scene: SceneWorld,
    /// Entity ids by name
    pub names: IndexMap<String, EntityId>,
    collisions: Vec<(u32, CollisionEvent)>,
    delta_time: f32,
    tick: u32,
}

impl Scenario {
    /// Load a scenario file
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&content)
    }

    /// Parse a scenario document
    pub fn from_ron(source: &str) -> Result<Self, RunnerError> {
        Ok(ron::from_str(source)?)
    }

    /// Encode as pretty RON
    pub fn to_ron(&self) -> Result<String, RunnerError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Spawn the scene, build every graph and enter play mode
    pub fn build(&self) -> Result<Simulation, RunnerError> {
        let mut scene = SceneWorld::new();
        let mut names = IndexMap::new();

        for def in &self.entities {
            if names.contains_key(&def.name) {
                return Err(RunnerError::DuplicateEntity(def.name.clone()));
            }
            let id = scene.spawn(def.name.clone(), def.position);
            if let Some(mass) = def.mass {
                scene.add_rigidbody(id, mass);
            }
            names.insert(def.name.clone(), id);
        }

        let lookup = |name: &str| {
            names
                .get(name)
                .copied()
                .ok_or_else(|| RunnerError::UnknownEntity(name.to_string()))
        };

        let mut interpreter = BehaviorInterpreter::new(self.settings.clone());
        for def in &self.graphs {
            let entity = lookup(&def.entity)?;
            interpreter.create_graph(entity)?;
            build_graph(&mut interpreter, entity, def, &lookup)?;
        }

        let collisions = self
            .collisions
            .iter()
            .map(|c| -> Result<_, RunnerError> {
                Ok((c.tick, CollisionEvent::new(lookup(&c.a)?, lookup(&c.b)?)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        interpreter.play();
        tracing::info!(
            entities = names.len(),
            graphs = interpreter.store().len(),
            "Scenario loaded"
        );

        Ok(Simulation {
            interpreter,
            scene,
            names,
            collisions,
            delta_time: self.delta_time,
            tick: 0,
        })
    }

    /// A pushed player that counts its hits and remembers where the last
    /// one landed
    pub fn sample() -> Self {
        let node = |key: &str, type_name: &str, x: f32| NodeDef {
            key: key.to_string(),
            type_name: type_name.to_string(),
            position: [x, 0.0],
            properties: IndexMap::new(),
            objects: IndexMap::new(),
        };
        let link = |from: &str, from_port: &str, to: &str, to_port: &str| LinkDef {
            from: from.to_string(),
            from_port: from_port.to_string(),
            to: to.to_string(),
            to_port: to_port.to_string(),
        };

        let mut greet = node("greet", "Print", 200.0);
        greet
            .properties
            .insert("Value".to_string(), "Player ready".into());

        let mut push = node("push", "ApplyForce", 200.0);
        push.properties
            .insert("Force".to_string(), PropertyValue::Vector3([2.0, 0.0, 0.0]));

        let mut remember = node("remember", "SetVariable", 600.0);
        remember
            .properties
            .insert("Name".to_string(), "last_hit_position".into());

        let mut read_hits = node("read_hits", "GetVariable", 600.0);
        read_hits.properties.insert("Name".to_string(), "hits".into());
        let mut bump = node("bump", "Add", 800.0);
        bump.properties.insert("B".to_string(), PropertyValue::Int(1));
        let mut count = node("count", "SetVariable", 1000.0);
        count.properties.insert("Name".to_string(), "hits".into());

        Self {
            settings: InterpreterSettings::default(),
            ticks: default_ticks(),
            delta_time: default_delta_time(),
            entities: vec![
                EntityDef {
                    name: "Player".to_string(),
                    position: [0.0; 3],
                    mass: Some(1.0),
                },
                EntityDef {
                    name: "Wall".to_string(),
                    position: [1.0, 0.0, 0.0],
                    mass: None,
                },
            ],
            graphs: vec![GraphDef {
                entity: "Player".to_string(),
                nodes: vec![
                    node("start", "OnStart", 0.0),
                    greet,
                    node("update", "OnUpdate", 0.0),
                    push,
                    node("hit", "OnCollision", 0.0),
                    node("log_hit", "Print", 200.0),
                    node("locate", "GetPosition", 400.0),
                    remember,
                    read_hits,
                    bump,
                    count,
                ],
                connections: vec![
                    link("start", "Exec", "greet", "Exec"),
                    link("update", "Exec", "push", "Exec"),
                    link("hit", "otherObject", "log_hit", "Value"),
                    link("hit", "otherObject", "locate", "Object"),
                    link("locate", "Position", "remember", "Value"),
                    link("hit", "Exec", "log_hit", "Exec"),
                    link("log_hit", "Exec", "remember", "Exec"),
                    link("read_hits", "Value", "bump", "A"),
                    link("bump", "Result", "count", "Value"),
                    link("remember", "Exec", "count", "Exec"),
                ],
                variables: IndexMap::from([("hits".to_string(), PropertyValue::Int(0))]),
            }],
            collisions: vec![CollisionDef {
                tick: 30,
                a: "Player".to_string(),
                b: "Wall".to_string(),
            }],
        }
    }
}

fn build_graph(
    interpreter: &mut BehaviorInterpreter,
    entity: EntityId,
    def: &GraphDef,
    lookup: &impl Fn(&str) -> Result<EntityId, RunnerError>,
) -> Result<(), RunnerError> {
    let mut keys: IndexMap<&str, NodeId> = IndexMap::new();

    for node in &def.nodes {
        let id = interpreter.add_node(entity, &node.type_name, node.position)?;
        for (name, value) in &node.properties {
            interpreter.set_property(entity, id, name, value.clone())?;
        }
        for (name, target) in &node.objects {
            interpreter.set_property(entity, id, name, lookup(target)?)?;
        }
        keys.insert(node.key.as_str(), id);
    }

    let resolve = |key: &str| {
        keys.get(key).copied().ok_or_else(|| RunnerError::UnknownNodeKey {
            entity: def.entity.clone(),
            key: key.to_string(),
        })
    };

    for link in &def.connections {
        let from = resolve(&link.from)?;
        let to = resolve(&link.to)?;
        interpreter.connect(entity, from, &link.from_port, to, &link.to_port)?;
    }

    for (name, value) in &def.variables {
        interpreter.set_variable(entity, name, value.clone())?;
    }
    Ok(())
}

impl Simulation {
    /// Run one tick
    pub fn step(&mut self) -> TickStats {
        let collisions: Vec<CollisionEvent> = self
            .collisions
            .iter()
            .filter(|(tick, _)| *tick == self.tick)
            .map(|(_, event)| *event)
            .collect();

        let stats = self
            .interpreter
            .update(self.delta_time, &mut self.scene, &collisions);
        self.tick += 1;
        stats
    }

    /// Run `ticks` ticks and sum their stats
    pub fn run(&mut self, ticks: u32) -> TickStats {
        let mut total = TickStats::default();
        for _ in 0..ticks {
            total += self.step();
        }
        total
    }

    /// Ticks run so far
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Name of an entity id
    pub fn name_of(&self, entity: EntityId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, id)| **id == entity)
            .map(|(name, _)| name.as_str())
    }
}
