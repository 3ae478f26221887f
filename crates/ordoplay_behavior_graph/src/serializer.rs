// SPDX-License-Identifier: MIT OR Apache-2.0
//! Portable graph form and its encoders.
//!
//! [`PortableGraph`] is plain data: node ids, type names, canvas positions,
//! property values, connections, variables and the ids vacant node slots
//! would hand out next, so a reloaded graph never reissues a removed id. It is what project files,
//! snapshots and interop payloads carry. Encoders:
//! - RON for project files
//! - bincode for compact snapshots
//! - JSON for interop

use crate::arena::NodeArena;
use crate::connection::Connection;
use crate::context::EntityId;
use crate::graph::{BehaviorGraph, GraphError, GraphId};
use crate::node::{NodeId, NodeInstance, NodeRegistry};
use crate::value::PropertyValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current portable graph format version
pub const FORMAT_VERSION: u32 = 1;

/// Encoding or decoding failures
#[derive(Debug, Error)]
pub enum SerializationError {
    /// RON encoding failed
    #[error("RON encode error: {0}")]
    RonEncode(#[from] ron::Error),

    /// RON decoding failed
    #[error("RON decode error: {0}")]
    RonDecode(#[from] ron::error::SpannedError),

    /// bincode failed
    #[error("Binary snapshot error: {0}")]
    Binary(#[from] bincode::Error),

    /// JSON failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A node as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableNode {
    /// Node ID
    pub id: NodeId,
    /// Registered type name
    pub type_name: String,
    /// Canvas position
    pub position: [f32; 2],
    /// Property values
    pub properties: IndexMap<String, PropertyValue>,
}

/// A graph as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableGraph {
    /// Format version
    pub version: u32,
    /// Graph ID
    pub id: GraphId,
    /// Owning entity
    pub entity: EntityId,
    /// Nodes in id order
    pub nodes: Vec<PortableNode>,
    /// Connections in creation order
    pub connections: Vec<Connection>,
    /// Variables in insertion order
    pub variables: Vec<(String, PropertyValue)>,
    /// Vacant node slots, as the id each would hand out next
    #[serde(default)]
    pub vacant: Vec<NodeId>,
}

/// Result of [`deserialize`]
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    /// The rebuilt graph
    pub graph: BehaviorGraph,
    /// Problems that did not stop the load
    pub warnings: Vec<GraphError>,
}

/// Capture a graph in portable form
pub fn serialize(graph: &BehaviorGraph) -> PortableGraph {
    PortableGraph {
        version: FORMAT_VERSION,
        id: graph.id(),
        entity: graph.entity(),
        nodes: graph
            .nodes()
            .map(|node| PortableNode {
                id: node.id,
                type_name: node.type_name.clone(),
                position: node.position,
                properties: node.properties.clone(),
            })
            .collect(),
        connections: graph.connections().cloned().collect(),
        variables: graph
            .variables()
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
        vacant: graph.nodes.vacancies().collect(),
    }
}

/// Rebuild a graph from portable form.
///
/// Properties of registered types start from the current declared defaults
/// and take every stored value whose key is still declared. Nodes whose type
/// is not registered are kept as inert placeholders with their stored values
/// and reported in [`LoadedGraph::warnings`], as are connections that no
/// longer line up.
pub fn deserialize(
    registry: &NodeRegistry,
    portable: PortableGraph,
) -> Result<LoadedGraph, GraphError> {
    if portable.version > FORMAT_VERSION {
        return Err(GraphError::UnsupportedVersion {
            found: portable.version,
            supported: FORMAT_VERSION,
        });
    }

    let mut graph = BehaviorGraph::with_id(portable.id, portable.entity);
    let mut warnings = Vec::new();
    let mut nodes = Vec::with_capacity(portable.nodes.len());

    for stored in portable.nodes {
        let properties = match registry.lookup(&stored.type_name) {
            Some(node_type) => node_type.seed_properties(Some(&stored.properties)),
            None => {
                tracing::warn!(graph = %portable.id, node = %stored.id, "Keeping node of unregistered type '{}' as inert", stored.type_name);
                warnings.push(GraphError::DeserializationTypeMismatch {
                    node: stored.id,
                    type_name: stored.type_name.clone(),
                });
                stored.properties
            }
        };

        nodes.push(NodeInstance::new(stored.id, stored.type_name, stored.position, properties));
    }
    graph.nodes = NodeArena::restore(nodes, &portable.vacant)?;

    for connection in portable.connections {
        if let Err(err) = check_connection(registry, &graph, &connection) {
            tracing::warn!(graph = %portable.id, connection = %connection.id, "Dropping connection: {err}");
            warnings.push(err);
            continue;
        }
        graph.connections.insert(connection.id, connection);
    }

    for (name, value) in portable.variables {
        graph.variables.set(name, value);
    }

    Ok(LoadedGraph { graph, warnings })
}

/// Endpoints must exist; ports are only checked when both types are known
fn check_connection(
    registry: &NodeRegistry,
    graph: &BehaviorGraph,
    connection: &Connection,
) -> Result<(), GraphError> {
    let (Some(source), Some(target)) = (
        graph.node(connection.from_node),
        graph.node(connection.to_node),
    ) else {
        let missing = if graph.contains_node(connection.from_node) {
            connection.to_node
        } else {
            connection.from_node
        };
        return Err(GraphError::UnknownNode(missing));
    };

    if registry.contains(&source.type_name) && registry.contains(&target.type_name) {
        graph.validate_link(
            registry,
            connection.from_node,
            &connection.from_port,
            connection.to_node,
            &connection.to_port,
        )?;
    }
    Ok(())
}

impl PortableGraph {
    /// Encode as pretty RON
    pub fn to_ron(&self) -> Result<String, SerializationError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Decode from RON
    pub fn from_ron(source: &str) -> Result<Self, SerializationError> {
        Ok(ron::from_str(source)?)
    }

    /// Encode as a bincode snapshot
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a bincode snapshot
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Encode as JSON
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    pub fn from_json(source: &str) -> Result<Self, SerializationError> {
        Ok(serde_json::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::VARIABLE_NAME;
    use crate::node::{ExecutionResult, NodeBehavior, NodeCategory, NodeType};
    use crate::value::PropertyKind;

    fn sample(registry: &NodeRegistry) -> (BehaviorGraph, NodeId, NodeId) {
        let mut graph = BehaviorGraph::new(EntityId::new());
        let update = graph.add_node(registry, "OnUpdate", [0.0, 0.0]).unwrap();
        let add = graph.add_node(registry, "Add", [200.0, 40.0]).unwrap();
        // Reuse a freed slot so one id carries a non-zero generation
        let scratch = graph.add_node(registry, "Print", [0.0, 200.0]).unwrap();
        graph.remove_node(scratch).unwrap();
        let store = graph.add_node(registry, "SetVariable", [400.0, 0.0]).unwrap();

        graph.set_property(add, "B", 10.0f32).unwrap();
        graph.set_property(store, VARIABLE_NAME, "total").unwrap();
        graph.connect(registry, update, "deltaTime", add, "A").unwrap();
        graph.connect(registry, add, "Result", store, "Value").unwrap();
        graph.connect(registry, update, "Exec", store, "Exec").unwrap();
        graph.variables_mut().set("lives", PropertyValue::Int(3));
        graph.variables_mut().set("name", "hero".into());
        (graph, add, store)
    }

    fn assert_same(a: &BehaviorGraph, b: &BehaviorGraph) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.entity(), b.entity());
        assert_eq!(a.nodes().collect::<Vec<_>>(), b.nodes().collect::<Vec<_>>());
        assert_eq!(
            a.connections().collect::<Vec<_>>(),
            b.connections().collect::<Vec<_>>()
        );
        assert_eq!(a.variables(), b.variables());
    }

    #[test]
    fn test_roundtrip_preserves_graph() {
        let registry = NodeRegistry::with_builtins();
        let (graph, _, _) = sample(&registry);

        let loaded = deserialize(&registry, serialize(&graph)).unwrap();
        assert!(loaded.warnings.is_empty());
        assert_same(&graph, &loaded.graph);
    }

    #[test]
    fn test_roundtrip_through_encoders() {
        let registry = NodeRegistry::with_builtins();
        let (graph, _, _) = sample(&registry);
        let portable = serialize(&graph);

        let from_ron = PortableGraph::from_ron(&portable.to_ron().unwrap()).unwrap();
        let from_bytes = PortableGraph::from_bytes(&portable.to_bytes().unwrap()).unwrap();
        let from_json = PortableGraph::from_json(&portable.to_json().unwrap()).unwrap();

        for decoded in [from_ron, from_bytes, from_json] {
            assert_eq!(decoded, portable);
            let loaded = deserialize(&registry, decoded).unwrap();
            assert_same(&graph, &loaded.graph);
        }
    }

    #[test]
    fn test_new_nodes_do_not_collide_after_load() {
        let registry = NodeRegistry::with_builtins();
        let (graph, _, _) = sample(&registry);
        let mut loaded = deserialize(&registry, serialize(&graph)).unwrap().graph;

        let before: Vec<NodeId> = loaded.nodes().map(|n| n.id).collect();
        let fresh = loaded.add_node(&registry, "Print", [0.0, 0.0]).unwrap();
        assert!(!before.contains(&fresh));
        assert_eq!(loaded.node_count(), before.len() + 1);
    }

    #[test]
    fn test_removed_ids_stay_retired_after_load() {
        let registry = NodeRegistry::with_builtins();
        let mut graph = BehaviorGraph::new(EntityId::new());
        let removed = graph.add_node(&registry, "Add", [0.0, 0.0]).unwrap();
        let kept = graph.add_node(&registry, "Add", [0.0, 0.0]).unwrap();
        graph.remove_node(removed).unwrap();

        let portable = serialize(&graph);
        assert_eq!(portable.vacant.len(), 1);
        let text = portable.to_ron().unwrap();
        let mut loaded = deserialize(&registry, PortableGraph::from_ron(&text).unwrap())
            .unwrap()
            .graph;

        let fresh = loaded.add_node(&registry, "Add", [0.0, 0.0]).unwrap();
        assert_ne!(fresh, removed);
        assert_ne!(fresh, kept);
        assert_eq!(fresh.index(), removed.index());
        assert!(loaded.node(removed).is_none());
    }

    #[test]
    fn test_out_of_range_node_id_rejected() {
        let registry = NodeRegistry::with_builtins();
        let (graph, add, _) = sample(&registry);
        let mut portable = serialize(&graph);
        let far = NodeId::from_parts(50_000_000, 0);
        portable.nodes.iter_mut().find(|n| n.id == add).unwrap().id = far;

        assert!(matches!(
            deserialize(&registry, portable),
            Err(GraphError::NodeIndexOutOfRange { node, .. }) if node == far
        ));
    }

    #[test]
    fn test_properties_follow_current_declaration() {
        let registry = NodeRegistry::with_builtins();
        let (graph, add, _) = sample(&registry);
        let mut portable = serialize(&graph);

        let stored = portable.nodes.iter_mut().find(|n| n.id == add).unwrap();
        stored.properties.shift_remove("A");
        stored.properties.insert("Obsolete".to_string(), PropertyValue::Bool(true));

        let loaded = deserialize(&registry, portable).unwrap().graph;
        assert_eq!(loaded.property(add, "A"), Some(&PropertyValue::Float(0.0)));
        assert_eq!(loaded.property(add, "B"), Some(&PropertyValue::Float(10.0)));
        assert_eq!(loaded.property(add, "Obsolete"), None);
    }

    #[test]
    fn test_unknown_type_kept_inert() {
        let mut registry = NodeRegistry::with_builtins();
        registry.register(
            NodeType::new(
                "Plugin",
                NodeCategory::Custom,
                NodeBehavior::from_fn(|_, _| Ok(ExecutionResult::flow("Exec"))),
            )
            .with_exec_input("Exec")
            .with_exec_output("Exec")
            .with_property("Speed", PropertyKind::Float, 2.5f32, crate::node::PropertyBinding::Internal),
        );

        let mut graph = BehaviorGraph::new(EntityId::new());
        let start = graph.add_node(&registry, "OnStart", [0.0, 0.0]).unwrap();
        let plugin = graph.add_node(&registry, "Plugin", [100.0, 0.0]).unwrap();
        graph.connect(&registry, start, "Exec", plugin, "Exec").unwrap();
        let portable = serialize(&graph);

        registry.unregister("Plugin");
        let first = deserialize(&registry, portable.clone()).unwrap();
        let second = deserialize(&registry, portable.clone()).unwrap();

        assert_eq!(
            first.warnings,
            vec![GraphError::DeserializationTypeMismatch {
                node: plugin,
                type_name: "Plugin".to_string(),
            }]
        );
        assert_eq!(first.warnings, second.warnings);
        assert_same(&first.graph, &second.graph);

        let placeholder = first.graph.node(plugin).unwrap();
        assert_eq!(placeholder.type_name, "Plugin");
        assert_eq!(placeholder.property("Speed"), Some(&PropertyValue::Float(2.5)));
        assert_eq!(first.graph.connection_count(), 1);

        // Re-export keeps the placeholder unchanged
        assert_eq!(serialize(&first.graph), portable);
    }

    #[test]
    fn test_dangling_connection_dropped() {
        let registry = NodeRegistry::with_builtins();
        let (graph, add, _) = sample(&registry);
        let mut portable = serialize(&graph);
        portable.nodes.retain(|n| n.id != add);

        let loaded = deserialize(&registry, portable).unwrap();
        assert_eq!(loaded.graph.connection_count(), 1);
        assert_eq!(loaded.warnings.len(), 2);
        assert!(loaded
            .warnings
            .iter()
            .all(|w| *w == GraphError::UnknownNode(add)));
    }

    #[test]
    fn test_invalid_port_dropped() {
        let registry = NodeRegistry::with_builtins();
        let (graph, add, store) = sample(&registry);
        let mut portable = serialize(&graph);
        portable.connections.push(Connection::new(add, "Missing", store, "Value"));

        let loaded = deserialize(&registry, portable).unwrap();
        assert_eq!(loaded.graph.connection_count(), 3);
        assert!(matches!(
            loaded.warnings.as_slice(),
            [GraphError::InvalidPort { port, .. }] if port == "Missing"
        ));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let registry = NodeRegistry::with_builtins();
        let (graph, add, _) = sample(&registry);
        let mut portable = serialize(&graph);
        let copy = portable.nodes.iter().find(|n| n.id == add).cloned().unwrap();
        portable.nodes.push(copy);

        assert_eq!(
            deserialize(&registry, portable).map(|_| ()),
            Err(GraphError::DuplicateNode(add))
        );
    }

    #[test]
    fn test_newer_version_rejected() {
        let registry = NodeRegistry::with_builtins();
        let (graph, _, _) = sample(&registry);
        let mut portable = serialize(&graph);
        portable.version = FORMAT_VERSION + 1;

        assert!(matches!(
            deserialize(&registry, portable),
            Err(GraphError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }
}
