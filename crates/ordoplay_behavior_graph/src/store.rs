// SPDX-License-Identifier: MIT OR Apache-2.0
//! Associates each entity with at most one behavior graph.

use crate::context::EntityId;
use crate::graph::{BehaviorGraph, GraphError, GraphId};
use indexmap::IndexMap;

/// Entity-to-graph table.
///
/// Graphs are kept in attachment order so ticks visit them deterministically.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    graphs: IndexMap<EntityId, BehaviorGraph>,
}

impl GraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph for `entity`.
    ///
    /// Fails with [`GraphError::GraphExists`] if the entity already has one;
    /// use [`GraphStore::replace_graph`] to discard it instead.
    pub fn create_graph(&mut self, entity: EntityId) -> Result<GraphId, GraphError> {
        if self.graphs.contains_key(&entity) {
            return Err(GraphError::GraphExists(entity));
        }

        let graph = BehaviorGraph::new(entity);
        let id = graph.id();
        self.graphs.insert(entity, graph);
        tracing::debug!(%entity, graph = %id, "Created behavior graph");
        Ok(id)
    }

    /// Discard any graph `entity` has and create an empty one
    pub fn replace_graph(&mut self, entity: EntityId) -> GraphId {
        if self.detach(entity).is_some() {
            tracing::debug!(%entity, "Discarded previous behavior graph");
        }
        let graph = BehaviorGraph::new(entity);
        let id = graph.id();
        self.graphs.insert(entity, graph);
        id
    }

    /// Attach an existing graph to its entity, e.g. one just deserialized
    pub fn insert(&mut self, graph: BehaviorGraph) -> Result<GraphId, GraphError> {
        let entity = graph.entity();
        if self.graphs.contains_key(&entity) {
            return Err(GraphError::GraphExists(entity));
        }

        let id = graph.id();
        self.graphs.insert(entity, graph);
        Ok(id)
    }

    /// Detach an entity, discarding its graph
    pub fn detach(&mut self, entity: EntityId) -> Option<BehaviorGraph> {
        self.graphs.shift_remove(&entity)
    }

    /// Get an entity's graph
    pub fn graph(&self, entity: EntityId) -> Option<&BehaviorGraph> {
        self.graphs.get(&entity)
    }

    /// Get an entity's graph mutably
    pub fn graph_mut(&mut self, entity: EntityId) -> Option<&mut BehaviorGraph> {
        self.graphs.get_mut(&entity)
    }

    /// Get an entity's graph or fail with [`GraphError::NoGraph`]
    pub fn require_mut(&mut self, entity: EntityId) -> Result<&mut BehaviorGraph, GraphError> {
        self.graphs.get_mut(&entity).ok_or(GraphError::NoGraph(entity))
    }

    /// Check if an entity has a graph
    pub fn contains(&self, entity: EntityId) -> bool {
        self.graphs.contains_key(&entity)
    }

    /// All graphs in attachment order
    pub fn graphs(&self) -> impl Iterator<Item = &BehaviorGraph> {
        self.graphs.values()
    }

    /// All graphs, mutably
    pub fn graphs_mut(&mut self) -> impl Iterator<Item = &mut BehaviorGraph> {
        self.graphs.values_mut()
    }

    /// Number of attached graphs
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Check if no graphs are attached
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeRegistry;

    #[test]
    fn test_one_graph_per_entity() {
        let mut store = GraphStore::new();
        let entity = EntityId::new();

        let id = store.create_graph(entity).unwrap();
        assert_eq!(store.create_graph(entity), Err(GraphError::GraphExists(entity)));
        assert_eq!(store.graph(entity).map(BehaviorGraph::id), Some(id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_discards_previous() {
        let registry = NodeRegistry::with_builtins();
        let mut store = GraphStore::new();
        let entity = EntityId::new();

        let first = store.create_graph(entity).unwrap();
        store
            .graph_mut(entity)
            .unwrap()
            .add_node(&registry, "OnStart", [0.0, 0.0])
            .unwrap();

        let second = store.replace_graph(entity);
        assert_ne!(first, second);
        assert_eq!(store.graph(entity).unwrap().node_count(), 0);
    }

    #[test]
    fn test_detach_discards_graph() {
        let mut store = GraphStore::new();
        let entity = EntityId::new();
        store.create_graph(entity).unwrap();

        assert!(store.detach(entity).is_some());
        assert!(!store.contains(entity));
        assert!(store.detach(entity).is_none());
        assert!(matches!(store.require_mut(entity), Err(GraphError::NoGraph(_))));
    }

    #[test]
    fn test_insert_respects_ownership() {
        let mut store = GraphStore::new();
        let entity = EntityId::new();
        store.create_graph(entity).unwrap();

        let stray = BehaviorGraph::new(entity);
        assert_eq!(store.insert(stray), Err(GraphError::GraphExists(entity)));
        assert!(store.insert(BehaviorGraph::new(EntityId::new())).is_ok());
        assert_eq!(store.len(), 2);
    }
}
