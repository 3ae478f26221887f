// SPDX-License-Identifier: MIT OR Apache-2.0
//! Behavior graph: node instances, connections and variables for one entity.

use crate::arena::NodeArena;
use crate::connection::{Connection, ConnectionId};
use crate::context::EntityId;
use crate::node::{NodeId, NodeInstance, NodeRegistry};
use crate::value::PropertyValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a behavior graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Graph-scoped named values, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTable {
    values: IndexMap<String, PropertyValue>,
}

impl VariableTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a variable
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Write a variable, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.values.insert(name.into(), value)
    }

    /// Remove a variable
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.values.shift_remove(name)
    }

    /// Variables in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A behavior graph attached to one entity
#[derive(Debug, Clone)]
pub struct BehaviorGraph {
    id: GraphId,
    entity: EntityId,
    pub(crate) nodes: NodeArena,
    pub(crate) connections: IndexMap<ConnectionId, Connection>,
    pub(crate) variables: VariableTable,
}

impl BehaviorGraph {
    /// Create a new empty graph for `entity`
    pub fn new(entity: EntityId) -> Self {
        Self::with_id(GraphId::new(), entity)
    }

    pub(crate) fn with_id(id: GraphId, entity: EntityId) -> Self {
        Self {
            id,
            entity,
            nodes: NodeArena::new(),
            connections: IndexMap::new(),
            variables: VariableTable::new(),
        }
    }

    /// Graph ID
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Owning entity
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Instantiate a registered node type at `position`
    pub fn add_node(
        &mut self,
        registry: &NodeRegistry,
        type_name: &str,
        position: [f32; 2],
    ) -> Result<NodeId, GraphError> {
        let node_type = registry
            .lookup(type_name)
            .ok_or_else(|| GraphError::UnknownNodeType(type_name.to_string()))?;

        let properties = node_type.seed_properties(None);
        let id = self
            .nodes
            .insert_with(|id| NodeInstance::new(id, type_name, position, properties));
        tracing::debug!(graph = %self.id, node = %id, "Added {type_name} node");
        Ok(id)
    }

    /// Remove a node and every connection touching it
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<NodeInstance, GraphError> {
        let node = self
            .nodes
            .remove(node_id)
            .ok_or(GraphError::UnknownNode(node_id))?;
        self.connections.retain(|_, c| !c.involves_node(node_id));
        Ok(node)
    }

    /// Connect an output port to an input port
    pub fn connect(
        &mut self,
        registry: &NodeRegistry,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Result<ConnectionId, GraphError> {
        self.validate_link(registry, from_node, from_port, to_node, to_port)?;

        let connection = Connection::new(from_node, from_port, to_node, to_port);
        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Check that an output port may feed an input port without connecting
    pub(crate) fn validate_link(
        &self,
        registry: &NodeRegistry,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Result<(), GraphError> {
        let source = self.nodes.get(from_node).ok_or(GraphError::UnknownNode(from_node))?;
        let target = self.nodes.get(to_node).ok_or(GraphError::UnknownNode(to_node))?;

        let source_type = registry
            .lookup(&source.type_name)
            .ok_or_else(|| GraphError::UnknownNodeType(source.type_name.clone()))?;
        let target_type = registry
            .lookup(&target.type_name)
            .ok_or_else(|| GraphError::UnknownNodeType(target.type_name.clone()))?;

        let source_port = source_type.output(from_port).ok_or_else(|| GraphError::InvalidPort {
            node: from_node,
            port: from_port.to_string(),
        })?;
        let target_port = target_type.input(to_port).ok_or_else(|| GraphError::InvalidPort {
            node: to_node,
            port: to_port.to_string(),
        })?;

        if !source_port.can_connect(target_port) {
            return Err(GraphError::IncompatiblePorts {
                from: from_port.to_string(),
                to: to_port.to_string(),
            });
        }
        Ok(())
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Result<Connection, GraphError> {
        // shift_remove keeps the remaining connections in creation order
        self.connections
            .shift_remove(&connection_id)
            .ok_or(GraphError::UnknownConnection(connection_id))
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut NodeInstance> {
        self.nodes.get_mut(node_id)
    }

    /// Check if a node is in the graph
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains(node_id)
    }

    /// Get all nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.iter()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Read a node property
    pub fn property(&self, node_id: NodeId, name: &str) -> Option<&PropertyValue> {
        self.nodes.get(node_id)?.property(name)
    }

    /// Overwrite a node property
    pub fn set_property(
        &mut self,
        node_id: NodeId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(node_id).ok_or(GraphError::UnknownNode(node_id))?;
        if node.set_property(name, value.into()) {
            Ok(())
        } else {
            Err(GraphError::UnknownProperty {
                node: node_id,
                property: name.to_string(),
            })
        }
    }

    /// Move a node on the editor canvas
    pub fn set_node_position(&mut self, node_id: NodeId, position: [f32; 2]) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(node_id).ok_or(GraphError::UnknownNode(node_id))?;
        node.position = position;
        Ok(())
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections in creation order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections leaving an output port
    pub fn connections_from<'a>(
        &'a self,
        node_id: NodeId,
        port: &'a str,
    ) -> impl Iterator<Item = &'a Connection> {
        self.connections.values().filter(move |c| c.is_from(node_id, port))
    }

    /// Get connections entering an input port
    pub fn connections_to<'a>(
        &'a self,
        node_id: NodeId,
        port: &'a str,
    ) -> impl Iterator<Item = &'a Connection> {
        self.connections.values().filter(move |c| c.is_to(node_id, port))
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Graph variables
    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    /// Mutable graph variables
    pub fn variables_mut(&mut self) -> &mut VariableTable {
        &mut self.variables
    }

    /// Rebuild every property table against the registry's current types.
    ///
    /// Values whose keys are still declared survive; new keys get defaults.
    /// Nodes whose type is not registered are left untouched.
    pub fn reseed(&mut self, registry: &NodeRegistry) {
        for node in self.nodes.iter_mut() {
            if let Some(node_type) = registry.lookup(&node.type_name) {
                node.properties = node_type.seed_properties(Some(&node.properties));
            }
        }
    }
}

/// Error from a graph editing or loading operation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Node type is not registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node is not in this graph
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    /// Port is not declared on the node's type
    #[error("Node {node} has no port '{port}'")]
    InvalidPort {
        /// Node the port was looked up on
        node: NodeId,
        /// Port name
        port: String,
    },

    /// Flow and data ports mixed, or data kinds do not convert
    #[error("Cannot connect '{from}' to '{to}'")]
    IncompatiblePorts {
        /// Source port
        from: String,
        /// Target port
        to: String,
    },

    /// Connection is not in this graph
    #[error("Connection not found: {0}")]
    UnknownConnection(ConnectionId),

    /// Property is not part of the node's table
    #[error("Node {node} has no property '{property}'")]
    UnknownProperty {
        /// Node
        node: NodeId,
        /// Property name
        property: String,
    },

    /// The entity already owns a graph
    #[error("Entity {0} already has a behavior graph")]
    GraphExists(EntityId),

    /// The entity owns no graph
    #[error("Entity {0} has no behavior graph")]
    NoGraph(EntityId),

    /// Two serialized nodes share an id
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// A stored node id lies far beyond the slots the data accounts for
    #[error("Node id {node} is out of range (limit {limit})")]
    NodeIndexOutOfRange {
        /// Offending id
        node: NodeId,
        /// First index that is rejected
        limit: usize,
    },

    /// Portable data written by a newer format
    #[error("Unsupported graph format version {found} (expected at most {supported})")]
    UnsupportedVersion {
        /// Version in the data
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },

    /// A loaded node's type is no longer registered
    #[error("Node {node} has unregistered type '{type_name}'; kept as inert placeholder")]
    DeserializationTypeMismatch {
        /// Node
        node: NodeId,
        /// Type name stored with the node
        type_name: String,
    },
}
