// SPDX-License-Identifier: MIT OR Apache-2.0
//! Play mode facade over the registry, the graph store and the executor.
//!
//! The host calls [`BehaviorInterpreter::update`] once per frame. Nothing runs
//! unless the interpreter is playing. Entering play mode snapshots every
//! graph and stopping restores that snapshot, so variables and properties
//! written during play do not leak into the authored graphs.

use crate::connection::ConnectionId;
use crate::context::{CollisionEvent, EntityId, ExecutionContext, SceneAccess};
use crate::executor::{Executor, TickStats};
use crate::graph::{BehaviorGraph, GraphError, GraphId};
use crate::node::{NodeId, NodeInstance, NodeRegistry, NodeType};
use crate::serializer::{self, PortableGraph};
use crate::settings::InterpreterSettings;
use crate::store::GraphStore;
use crate::value::PropertyValue;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Play mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayState {
    /// Editing; ticks are ignored
    #[default]
    Stopped,
    /// Ticks run graphs
    Playing,
    /// Play mode is active but ticks are ignored
    Paused,
}

impl PlayState {
    /// Check if we're in any play mode (playing or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, PlayState::Playing | PlayState::Paused)
    }

    /// Check if ticks currently run
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayState::Playing)
    }
}

/// Owns the node registry and every entity's behavior graph
pub struct BehaviorInterpreter {
    registry: NodeRegistry,
    store: GraphStore,
    settings: InterpreterSettings,
    state: PlayState,
    /// Graphs as they were when play started
    backup: Option<GraphStore>,
    frame: u64,
    elapsed: f64,
}

impl Default for BehaviorInterpreter {
    fn default() -> Self {
        Self::new(InterpreterSettings::default())
    }
}

impl BehaviorInterpreter {
    /// Create an interpreter with the built-in catalog registered
    pub fn new(settings: InterpreterSettings) -> Self {
        Self::with_registry(NodeRegistry::with_builtins(), settings)
    }

    /// Create an interpreter over a prepared registry
    pub fn with_registry(registry: NodeRegistry, settings: InterpreterSettings) -> Self {
        let mut interpreter = Self {
            registry,
            store: GraphStore::new(),
            settings,
            state: PlayState::Stopped,
            backup: None,
            frame: 0,
            elapsed: 0.0,
        };
        if interpreter.settings.start_playing {
            interpreter.play();
        }
        interpreter
    }

    // Play mode

    /// Enter play mode or resume from pause.
    ///
    /// Returns false if already playing.
    pub fn play(&mut self) -> bool {
        match self.state {
            PlayState::Stopped => {
                self.backup = Some(self.store.clone());
                self.state = PlayState::Playing;
                self.frame = 0;
                self.elapsed = 0.0;
                tracing::info!(graphs = self.store.len(), "Entered play mode");
                true
            }
            PlayState::Paused => {
                self.state = PlayState::Playing;
                tracing::info!("Resumed play mode");
                true
            }
            PlayState::Playing => false,
        }
    }

    /// Pause play mode
    pub fn pause(&mut self) -> bool {
        if self.state == PlayState::Playing {
            self.state = PlayState::Paused;
            tracing::info!("Paused play mode");
            true
        } else {
            false
        }
    }

    /// Leave play mode and restore the graphs captured by [`Self::play`]
    pub fn stop(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }

        self.state = PlayState::Stopped;
        if let Some(backup) = self.backup.take() {
            self.store = backup;
        }
        tracing::info!(frames = self.frame, elapsed = self.elapsed, "Exited play mode");
        self.frame = 0;
        self.elapsed = 0.0;
        true
    }

    /// Current play state
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Ticks run since play started
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Scaled seconds since play started
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Run one tick over every graph.
    ///
    /// Each graph sees the first collision involving its entity during the
    /// normal tick; any further collisions re-fire only the collision-driven
    /// event nodes. Does nothing unless playing.
    pub fn update(
        &mut self,
        delta_time: f32,
        scene: &mut dyn SceneAccess,
        collisions: &[CollisionEvent],
    ) -> TickStats {
        if !self.state.is_playing() {
            return TickStats::default();
        }

        let delta_time = self.settings.scaled(delta_time);
        let executor = Executor::new(&self.registry).with_max_depth(self.settings.max_dispatch_depth);
        let mut stats = TickStats::default();

        for graph in self.store.graphs_mut() {
            let entity = graph.entity();
            let mut involved = collisions
                .iter()
                .copied()
                .filter(|c| c.other(entity).is_some());

            let mut ctx = ExecutionContext::new(entity, delta_time, self.frame, &mut *scene);
            ctx.collision = involved.next();
            stats += executor.run_tick(graph, &mut ctx);

            for collision in involved {
                ctx.collision = Some(collision);
                stats += executor.run_collision_roots(graph, &mut ctx);
            }
        }

        tracing::debug!(frame = self.frame, ?stats, "Tick complete");
        self.frame += 1;
        self.elapsed += f64::from(delta_time);
        stats
    }

    // Registry

    /// Node type registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Register a node type, replacing any type of the same name.
    ///
    /// Nodes already in graphs pick up newly declared properties.
    pub fn register(&mut self, node_type: NodeType) -> Option<NodeType> {
        let previous = self.registry.register(node_type);
        for graph in self.store.graphs_mut() {
            graph.reseed(&self.registry);
        }
        previous
    }

    // Graphs

    /// Graph store
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Get an entity's graph
    pub fn graph(&self, entity: EntityId) -> Option<&BehaviorGraph> {
        self.store.graph(entity)
    }

    /// Create an empty graph for `entity`
    pub fn create_graph(&mut self, entity: EntityId) -> Result<GraphId, GraphError> {
        self.store.create_graph(entity)
    }

    /// Discard any graph `entity` has and create an empty one
    pub fn replace_graph(&mut self, entity: EntityId) -> GraphId {
        self.store.replace_graph(entity)
    }

    /// Discard an entity's graph
    pub fn detach(&mut self, entity: EntityId) -> Option<BehaviorGraph> {
        self.store.detach(entity)
    }

    /// Add a node to an entity's graph
    pub fn add_node(
        &mut self,
        entity: EntityId,
        type_name: &str,
        position: [f32; 2],
    ) -> Result<NodeId, GraphError> {
        self.store
            .require_mut(entity)?
            .add_node(&self.registry, type_name, position)
    }

    /// Remove a node and its connections from an entity's graph
    pub fn remove_node(&mut self, entity: EntityId, node: NodeId) -> Result<NodeInstance, GraphError> {
        self.store.require_mut(entity)?.remove_node(node)
    }

    /// Connect two ports in an entity's graph
    pub fn connect(
        &mut self,
        entity: EntityId,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Result<ConnectionId, GraphError> {
        self.store
            .require_mut(entity)?
            .connect(&self.registry, from_node, from_port, to_node, to_port)
    }

    /// Remove a connection from an entity's graph
    pub fn disconnect(&mut self, entity: EntityId, connection: ConnectionId) -> Result<(), GraphError> {
        self.store.require_mut(entity)?.disconnect(connection).map(|_| ())
    }

    /// Set a node property in an entity's graph
    pub fn set_property(
        &mut self,
        entity: EntityId,
        node: NodeId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), GraphError> {
        self.store.require_mut(entity)?.set_property(node, name, value)
    }

    /// Write a variable in an entity's graph
    pub fn set_variable(
        &mut self,
        entity: EntityId,
        name: &str,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>, GraphError> {
        Ok(self.store.require_mut(entity)?.variables_mut().set(name, value))
    }

    /// Capture an entity's graph in portable form
    pub fn save_graph(&self, entity: EntityId) -> Result<PortableGraph, GraphError> {
        self.store
            .graph(entity)
            .map(serializer::serialize)
            .ok_or(GraphError::NoGraph(entity))
    }

    /// Attach a portable graph to its entity, replacing any graph it has.
    ///
    /// Returns the non-fatal problems found while loading.
    pub fn load_graph(&mut self, portable: PortableGraph) -> Result<Vec<GraphError>, GraphError> {
        let loaded = serializer::deserialize(&self.registry, portable)?;
        let entity = loaded.graph.entity();
        if self.store.detach(entity).is_some() {
            tracing::debug!(%entity, "Replaced behavior graph on load");
        }
        self.store.insert(loaded.graph)?;
        Ok(loaded.warnings)
    }

    /// Current settings
    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    /// Change the time scale, clamped
    pub fn set_time_scale(&mut self, scale: f32) {
        self.settings.set_time_scale(scale);
    }
}

/// Interpreter behind a lock, for hosts that edit and tick from different
/// threads
#[derive(Clone)]
pub struct SharedInterpreter {
    inner: Arc<Mutex<BehaviorInterpreter>>,
}

impl SharedInterpreter {
    /// Wrap an interpreter
    pub fn new(interpreter: BehaviorInterpreter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(interpreter)),
        }
    }

    /// Lock for edits or queries
    pub fn lock(&self) -> MutexGuard<'_, BehaviorInterpreter> {
        self.inner.lock()
    }

    /// Run one tick under the lock
    pub fn update(
        &self,
        delta_time: f32,
        scene: &mut dyn SceneAccess,
        collisions: &[CollisionEvent],
    ) -> TickStats {
        self.inner.lock().update(delta_time, scene, collisions)
    }
}
