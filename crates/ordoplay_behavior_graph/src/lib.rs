// SPDX-License-Identifier: MIT OR Apache-2.0
//! Behavior graph interpreter for `OrdoPlay` entities.
//!
//! Each scene entity may own one behavior graph: node instances wired through
//! typed ports. Flow connections carry execution, data connections carry
//! values. On every tick the interpreter starts at the graph's event nodes
//! and follows whatever each node returns.
//!
//! ## Architecture
//!
//! - [`node`] and [`catalog`]: node types, the registry and the built-in nodes
//! - [`graph`] and [`store`]: per-entity graphs and their editing operations
//! - [`executor`]: traversal and flow semantics
//! - [`serializer`]: portable form with RON, bincode and JSON encoders
//! - [`interpreter`]: play mode facade the host ticks
//! - [`scene`]: an in-memory host scene

mod arena;
pub mod catalog;
pub mod connection;
pub mod context;
pub mod executor;
pub mod graph;
pub mod interpreter;
pub mod node;
pub mod port;
pub mod scene;
pub mod serializer;
pub mod settings;
pub mod store;
pub mod value;

pub use catalog::BuiltinNode;
pub use connection::{Connection, ConnectionId};
pub use context::{CapabilityError, CollisionEvent, EntityId, ExecutionContext, NodeContext, SceneAccess};
pub use executor::{Executor, TickStats};
pub use graph::{BehaviorGraph, GraphError, GraphId, VariableTable};
pub use interpreter::{BehaviorInterpreter, PlayState, SharedInterpreter};
pub use node::{
    CustomNode, ExecutionResult, NodeBehavior, NodeCategory, NodeError, NodeId, NodeInstance,
    NodeRegistry, NodeType, PropertyBinding, PropertyDecl,
};
pub use port::{Port, PortDirection, PortType};
pub use scene::SceneWorld;
pub use serializer::{LoadedGraph, PortableGraph, SerializationError};
pub use settings::{InterpreterSettings, SettingsError};
pub use store::GraphStore;
pub use value::{PropertyKind, PropertyValue};
