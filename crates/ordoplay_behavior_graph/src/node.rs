// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node types, node instances and the registry that maps names to types.

use crate::catalog::BuiltinNode;
use crate::context::{CapabilityError, EntityId, NodeContext};
use crate::port::{Port, PortType};
use crate::value::{PropertyKind, PropertyValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a node within its graph.
///
/// An arena index paired with the slot generation; stable across
/// serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Build an id from its raw parts
    pub fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Traversal roots, invoked every tick
    Event,
    /// Branching and sequencing
    Flow,
    /// Arithmetic
    Math,
    /// Transform accessors and mutators
    Transform,
    /// Physics bridge
    Physics,
    /// Graph variable access
    Variable,
    /// Debugging and misc
    Utility,
    /// Custom/user-defined
    Custom,
}

impl NodeCategory {
    /// Lower-case label for menus and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Flow => "flow",
            Self::Math => "math",
            Self::Transform => "transform",
            Self::Physics => "physics",
            Self::Variable => "variable",
            Self::Utility => "utility",
            Self::Custom => "custom",
        }
    }
}

/// How a declared property relates to the node's ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyBinding {
    /// Backs an input port; upstream values are written here
    Input,
    /// Mirrors the last value published on an output port
    Output,
    /// Configuration only
    Internal,
}

/// A property declared by a node type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// Semantic kind
    pub kind: PropertyKind,
    /// Value new instances start with
    pub default: PropertyValue,
    /// Port binding
    pub binding: PropertyBinding,
}

/// Outcome of a single node invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// The node did not fire
    NoOp,
    /// Continue along one output port
    Flow(String),
    /// Continue along several output ports.
    ///
    /// When `sequential`, only the first port with a live connection is
    /// taken.
    MultiFlow {
        /// Ports in priority order
        ports: Vec<String>,
        /// Stop after the first connected port
        sequential: bool,
    },
    /// Publish values on output ports
    Values(IndexMap<String, PropertyValue>),
    /// Publish values, then continue along one output port
    FlowWithValues {
        /// Flow port followed after the values land
        port: String,
        /// Values by output port
        values: IndexMap<String, PropertyValue>,
    },
}

impl ExecutionResult {
    /// Continue along `port`
    pub fn flow(port: impl Into<String>) -> Self {
        Self::Flow(port.into())
    }

    /// Publish a single value
    pub fn value(port: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let mut values = IndexMap::new();
        values.insert(port.into(), value.into());
        Self::Values(values)
    }

    /// Check if the node fired
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

/// Error raised inside a node's execution function.
///
/// The executor logs these and treats the node as [`ExecutionResult::NoOp`].
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The target entity lacks a capability the node needs
    #[error("Missing capability: {0}")]
    MissingCapability(#[from] CapabilityError),

    /// An input held a value of the wrong kind
    #[error("Property '{property}' expected {expected:?}, found {found}")]
    TypeMismatch {
        /// Property name
        property: String,
        /// Expected kind
        expected: PropertyKind,
        /// Value actually present
        found: PropertyValue,
    },

    /// A graph variable was read before being set
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

/// Behavior supplied at runtime for nodes outside the built-in catalog
pub trait CustomNode: Send + Sync {
    /// Run the node once
    fn execute(
        &self,
        node: &mut NodeInstance,
        ctx: &mut NodeContext<'_>,
    ) -> Result<ExecutionResult, NodeError>;
}

impl<F> CustomNode for F
where
    F: Fn(&mut NodeInstance, &mut NodeContext<'_>) -> Result<ExecutionResult, NodeError>
        + Send
        + Sync,
{
    fn execute(
        &self,
        node: &mut NodeInstance,
        ctx: &mut NodeContext<'_>,
    ) -> Result<ExecutionResult, NodeError> {
        self(node, ctx)
    }
}

/// What runs when a node of a given type executes
#[derive(Clone)]
pub enum NodeBehavior {
    /// One of the built-in kinds
    Builtin(BuiltinNode),
    /// A runtime-registered behavior
    Custom(Arc<dyn CustomNode>),
}

impl NodeBehavior {
    /// Wrap a closure as a custom behavior
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut NodeInstance, &mut NodeContext<'_>) -> Result<ExecutionResult, NodeError>
            + Send
            + Sync
            + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Run the behavior against one instance
    pub fn execute(
        &self,
        node: &mut NodeInstance,
        ctx: &mut NodeContext<'_>,
    ) -> Result<ExecutionResult, NodeError> {
        match self {
            Self::Builtin(builtin) => builtin.execute(node, ctx),
            Self::Custom(custom) => custom.execute(node, ctx),
        }
    }
}

impl fmt::Debug for NodeBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Node type definition
#[derive(Debug, Clone)]
pub struct NodeType {
    /// Unique type name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Input ports in declaration order
    pub inputs: Vec<Port>,
    /// Output ports in declaration order
    pub outputs: Vec<Port>,
    /// Declared properties
    pub properties: IndexMap<String, PropertyDecl>,
    /// Whether an event node of this type is driven by collisions
    pub collision_event: bool,
    /// Execution function
    pub behavior: NodeBehavior,
}

impl NodeType {
    /// Create a node type with no ports or properties
    pub fn new(name: impl Into<String>, category: NodeCategory, behavior: NodeBehavior) -> Self {
        Self {
            name: name.into(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: IndexMap::new(),
            collision_event: false,
            behavior,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a flow input
    pub fn with_exec_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(Port::input(name, PortType::Exec));
        self
    }

    /// Add a flow output
    pub fn with_exec_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(Port::output(name, PortType::Exec));
        self
    }

    /// Add a data input backed by an input-bound property
    pub fn with_data_input(
        mut self,
        name: impl Into<String>,
        kind: PropertyKind,
        default: impl Into<PropertyValue>,
    ) -> Self {
        let name = name.into();
        self.inputs.push(Port::input(name.clone(), PortType::Data(kind)));
        self.with_property(name, kind, default, PropertyBinding::Input)
    }

    /// Add a data output backed by an output-bound property
    pub fn with_data_output(mut self, name: impl Into<String>, kind: PropertyKind) -> Self {
        let name = name.into();
        self.outputs.push(Port::output(name.clone(), PortType::Data(kind)));
        self.with_property(name, kind, kind.zero(), PropertyBinding::Output)
    }

    /// Declare a property
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        kind: PropertyKind,
        default: impl Into<PropertyValue>,
        binding: PropertyBinding,
    ) -> Self {
        self.properties.insert(
            name.into(),
            PropertyDecl {
                kind,
                default: default.into(),
                binding,
            },
        );
        self
    }

    /// Mark this event type as fired once per collision
    pub fn triggered_by_collision(mut self) -> Self {
        self.collision_event = true;
        self
    }

    /// Get an input port by name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Input port names in order
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|p| p.name.as_str()).collect()
    }

    /// Output port names in order
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|p| p.name.as_str()).collect()
    }

    /// Whether this type is a traversal root
    pub fn is_event(&self) -> bool {
        self.category == NodeCategory::Event
    }

    /// Whether flow can reach this type; pure data nodes run on value arrival
    pub fn has_exec_input(&self) -> bool {
        self.inputs.iter().any(|p| p.port_type.is_exec())
    }

    /// Build a property table from the declared defaults, keeping any
    /// `existing` value whose key is still declared.
    pub fn seed_properties(
        &self,
        existing: Option<&IndexMap<String, PropertyValue>>,
    ) -> IndexMap<String, PropertyValue> {
        self.properties
            .iter()
            .map(|(name, decl)| {
                let value = existing
                    .and_then(|props| props.get(name))
                    .cloned()
                    .unwrap_or_else(|| decl.default.clone());
                (name.clone(), value)
            })
            .collect()
    }
}

/// A node instance in a graph
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInstance {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type name
    pub type_name: String,
    /// Position in the editor canvas
    pub position: [f32; 2],
    /// Current property values
    pub properties: IndexMap<String, PropertyValue>,
}

impl NodeInstance {
    /// Create a new node instance
    pub fn new(
        id: NodeId,
        type_name: impl Into<String>,
        position: [f32; 2],
        properties: IndexMap<String, PropertyValue>,
    ) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            position,
            properties,
        }
    }

    /// Current value of a property
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Overwrite a property that the table already holds.
    ///
    /// Returns false when the property is not part of this instance.
    pub fn set_property(&mut self, name: &str, value: PropertyValue) -> bool {
        match self.properties.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Read a property as a float
    pub fn float(&self, name: &str) -> Result<f32, NodeError> {
        self.typed(name, PropertyKind::Float, PropertyValue::as_float)
    }

    /// Read a property as a boolean
    pub fn bool(&self, name: &str) -> Result<bool, NodeError> {
        self.typed(name, PropertyKind::Bool, PropertyValue::as_bool)
    }

    /// Read a property as a vector
    pub fn vector3(&self, name: &str) -> Result<[f32; 3], NodeError> {
        self.typed(name, PropertyKind::Vector3, PropertyValue::as_vector3)
    }

    /// Read a property as an entity reference
    pub fn object(&self, name: &str) -> Result<Option<EntityId>, NodeError> {
        self.typed(name, PropertyKind::Object, PropertyValue::as_object)
    }

    /// Read a property as a string
    pub fn string(&self, name: &str) -> Result<String, NodeError> {
        self.typed(name, PropertyKind::String, |v| v.as_str().map(str::to_string))
    }

    fn typed<T>(
        &self,
        name: &str,
        expected: PropertyKind,
        read: impl FnOnce(&PropertyValue) -> Option<T>,
    ) -> Result<T, NodeError> {
        let value = self
            .properties
            .get(name)
            .ok_or_else(|| NodeError::Custom(format!("Property '{name}' is not declared")))?;
        read(value).ok_or_else(|| NodeError::TypeMismatch {
            property: name.to_string(),
            expected,
            found: value.clone(),
        })
    }
}

/// Registry of available node types
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    /// Registered node types by name
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in catalog
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::catalog::register_builtins(&mut registry);
        registry
    }

    /// Register a node type, replacing and returning any previous definition
    pub fn register(&mut self, node_type: NodeType) -> Option<NodeType> {
        let previous = self.types.insert(node_type.name.clone(), node_type);
        if let Some(previous) = &previous {
            tracing::debug!("Replaced node type '{}'", previous.name);
        }
        previous
    }

    /// Remove a node type
    pub fn unregister(&mut self, name: &str) -> Option<NodeType> {
        self.types.shift_remove(name)
    }

    /// Get a node type by name
    pub fn lookup(&self, name: &str) -> Option<&NodeType> {
        self.types.get(name)
    }

    /// Check if a type is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough() -> NodeBehavior {
        NodeBehavior::from_fn(|_, _| Ok(ExecutionResult::flow("Out")))
    }

    #[test]
    fn test_lookup_returns_registered_ports() {
        let mut registry = NodeRegistry::new();
        registry.register(
            NodeType::new("Relay", NodeCategory::Custom, passthrough())
                .with_exec_input("In")
                .with_data_input("Gain", PropertyKind::Float, 2.0f32)
                .with_exec_output("Out")
                .with_data_output("Level", PropertyKind::Float),
        );

        let relay = registry.lookup("Relay").unwrap();
        assert_eq!(relay.input_names(), vec!["In", "Gain"]);
        assert_eq!(relay.output_names(), vec!["Out", "Level"]);
        assert!(registry.lookup("Missing").is_none());
    }

    #[test]
    fn test_builtin_ports_match_lookup() {
        let registry = NodeRegistry::with_builtins();
        for node_type in registry.types() {
            let found = registry.lookup(&node_type.name).unwrap();
            assert_eq!(found.inputs, node_type.inputs);
            assert_eq!(found.outputs, node_type.outputs);
        }
        assert_eq!(registry.types_in_category(NodeCategory::Event).count(), 3);
    }

    #[test]
    fn test_register_is_last_write_wins() {
        let mut registry = NodeRegistry::new();
        registry.register(NodeType::new("Relay", NodeCategory::Custom, passthrough()));
        let previous = registry.register(
            NodeType::new("Relay", NodeCategory::Utility, passthrough()).with_exec_input("In"),
        );

        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
        let relay = registry.lookup("Relay").unwrap();
        assert_eq!(relay.category, NodeCategory::Utility);
        assert_eq!(relay.input_names(), vec!["In"]);
    }

    #[test]
    fn test_seed_properties() {
        let node_type = NodeType::new("Mix", NodeCategory::Math, passthrough())
            .with_data_input("A", PropertyKind::Float, 1.0f32)
            .with_data_input("B", PropertyKind::Float, 2.0f32);

        let mut saved = IndexMap::new();
        saved.insert("B".to_string(), PropertyValue::Float(7.0));
        saved.insert("Stale".to_string(), PropertyValue::Bool(true));

        let seeded = node_type.seed_properties(Some(&saved));
        assert_eq!(seeded.get("A"), Some(&PropertyValue::Float(1.0)));
        assert_eq!(seeded.get("B"), Some(&PropertyValue::Float(7.0)));
        assert!(!seeded.contains_key("Stale"));
    }

    #[test]
    fn test_typed_property_reads() {
        let mut props = IndexMap::new();
        props.insert("Flag".to_string(), PropertyValue::Bool(true));
        let node = NodeInstance::new(NodeId::from_parts(0, 0), "T", [0.0, 0.0], props);

        assert!(node.bool("Flag").unwrap());
        assert!(matches!(node.float("Flag"), Err(NodeError::TypeMismatch { .. })));
        assert!(matches!(node.float("Nope"), Err(NodeError::Custom(_))));
    }
}
