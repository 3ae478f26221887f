// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph traversal.
//!
//! A tick starts at every event node and follows whatever each node returns:
//! - `Flow` executes the targets of one output port, in connection order
//! - `MultiFlow` does the same for several ports, or only the first connected
//!   one when sequential
//! - `Values` writes into connected inputs; targets without a flow input run
//!   once all writes have landed, others see the value when flow reaches them
//!
//! Before any node runs, the pure data nodes feeding its data inputs (no flow
//! input, not an event) are evaluated so accessors such as `GetVariable`
//! deliver current values.
//!
//! A node that is still on the dispatch stack is never re-entered, so cyclic
//! graphs terminate. Node failures are logged and treated as `NoOp`.

use crate::context::{ExecutionContext, NodeContext};
use crate::graph::BehaviorGraph;
use crate::node::{ExecutionResult, NodeId, NodeRegistry, NodeType};
use crate::value::PropertyValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Default bound on nested dispatches from one root
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 256;

/// Counters for one or more ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    /// Event nodes invoked as roots
    pub roots: usize,
    /// Node functions invoked, roots included
    pub executed: usize,
    /// Node functions invoked because a connection led there
    pub downstream: usize,
    /// Invocations that failed or hit an unregistered type
    pub degraded: usize,
    /// Dispatches refused to break a cycle or bound recursion
    pub refused: usize,
}

impl AddAssign for TickStats {
    fn add_assign(&mut self, rhs: Self) {
        self.roots += rhs.roots;
        self.executed += rhs.executed;
        self.downstream += rhs.downstream;
        self.degraded += rhs.degraded;
        self.refused += rhs.refused;
    }
}

#[derive(Default)]
struct Dispatch {
    stack: Vec<NodeId>,
    stats: TickStats,
}

/// Walks behavior graphs against a registry
pub struct Executor<'r> {
    registry: &'r NodeRegistry,
    max_depth: usize,
}

impl<'r> Executor<'r> {
    /// Create an executor
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }

    /// Bound how deep one root dispatch may nest
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Invoke every event node in the graph
    pub fn run_tick(&self, graph: &mut BehaviorGraph, ctx: &mut ExecutionContext<'_>) -> TickStats {
        self.run_roots(graph, ctx, |_| true)
    }

    /// Invoke only the collision-driven event nodes.
    ///
    /// Used for the second and later collisions of a tick, so per-tick events
    /// do not fire twice.
    pub fn run_collision_roots(
        &self,
        graph: &mut BehaviorGraph,
        ctx: &mut ExecutionContext<'_>,
    ) -> TickStats {
        self.run_roots(graph, ctx, |node_type| node_type.collision_event)
    }

    fn run_roots(
        &self,
        graph: &mut BehaviorGraph,
        ctx: &mut ExecutionContext<'_>,
        filter: impl Fn(&NodeType) -> bool,
    ) -> TickStats {
        let roots: Vec<NodeId> = graph
            .nodes()
            .filter(|node| {
                self.registry
                    .lookup(&node.type_name)
                    .is_some_and(|t| t.is_event() && filter(t))
            })
            .map(|node| node.id)
            .collect();

        let mut dispatch = Dispatch::default();
        for root in roots {
            dispatch.stats.roots += 1;
            self.dispatch(graph, ctx, &mut dispatch, root);
            debug_assert!(dispatch.stack.is_empty());
        }
        dispatch.stats
    }

    fn dispatch(
        &self,
        graph: &mut BehaviorGraph,
        ctx: &mut ExecutionContext<'_>,
        dispatch: &mut Dispatch,
        node_id: NodeId,
    ) {
        if dispatch.stack.contains(&node_id) {
            tracing::warn!(graph = %graph.id(), node = %node_id, "Refusing to re-enter node in a cycle");
            dispatch.stats.refused += 1;
            return;
        }
        if dispatch.stack.len() >= self.max_depth {
            tracing::warn!(graph = %graph.id(), node = %node_id, depth = self.max_depth, "Dispatch depth limit reached");
            dispatch.stats.refused += 1;
            return;
        }

        if !dispatch.stack.is_empty() {
            dispatch.stats.downstream += 1;
        }
        dispatch.stats.executed += 1;

        dispatch.stack.push(node_id);
        self.pull_sources(graph, ctx, dispatch, node_id);
        let result = self.invoke(graph, ctx, &mut dispatch.stats, node_id);
        self.follow(graph, ctx, dispatch, node_id, result);
        dispatch.stack.pop();
    }

    /// Evaluate the pure data nodes feeding `node_id`'s data inputs, sources
    /// first, so the node reads current values.
    ///
    /// Sources already on the stack keep whatever they last published.
    fn pull_sources(
        &self,
        graph: &mut BehaviorGraph,
        ctx: &mut ExecutionContext<'_>,
        dispatch: &mut Dispatch,
        node_id: NodeId,
    ) {
        let Some(node_type) = graph
            .node(node_id)
            .and_then(|node| self.registry.lookup(&node.type_name))
        else {
            return;
        };

        let mut sources: Vec<NodeId> = Vec::new();
        for connection in graph.connections().filter(|c| c.to_node == node_id) {
            let data_input = node_type
                .input(&connection.to_port)
                .is_some_and(|port| !port.port_type.is_exec());
            if data_input
                && !sources.contains(&connection.from_node)
                && self.is_pure(graph, connection.from_node)
            {
                sources.push(connection.from_node);
            }
        }

        for source in sources {
            if dispatch.stack.contains(&source) {
                tracing::trace!(graph = %graph.id(), node = %source, "Source already on the stack");
                continue;
            }
            if dispatch.stack.len() >= self.max_depth {
                tracing::warn!(graph = %graph.id(), node = %source, depth = self.max_depth, "Dispatch depth limit reached");
                dispatch.stats.refused += 1;
                continue;
            }

            dispatch.stats.executed += 1;
            dispatch.stats.downstream += 1;

            dispatch.stack.push(source);
            self.pull_sources(graph, ctx, dispatch, source);
            match self.invoke(graph, ctx, &mut dispatch.stats, source) {
                ExecutionResult::Values(values) | ExecutionResult::FlowWithValues { values, .. } => {
                    write_values(graph, source, values);
                }
                _ => {}
            }
            dispatch.stack.pop();
        }
    }

    /// Registered, not an event and unreachable by flow
    fn is_pure(&self, graph: &BehaviorGraph, node_id: NodeId) -> bool {
        graph
            .node(node_id)
            .and_then(|node| self.registry.lookup(&node.type_name))
            .is_some_and(|node_type| !node_type.is_event() && !node_type.has_exec_input())
    }

    /// Run one node function in isolation
    fn invoke(
        &self,
        graph: &mut BehaviorGraph,
        ctx: &mut ExecutionContext<'_>,
        stats: &mut TickStats,
        node_id: NodeId,
    ) -> ExecutionResult {
        let graph_id = graph.id();
        let Some(node) = graph.nodes.get_mut(node_id) else {
            return ExecutionResult::NoOp;
        };

        let Some(node_type) = self.registry.lookup(&node.type_name) else {
            tracing::warn!(graph = %graph_id, node = %node_id, "Skipping node of unregistered type '{}'", node.type_name);
            stats.degraded += 1;
            return ExecutionResult::NoOp;
        };

        let mut node_ctx = NodeContext {
            delta_time: ctx.delta_time,
            frame: ctx.frame,
            entity: ctx.entity,
            collision: ctx.collision,
            scene: &mut *ctx.scene,
            variables: &mut graph.variables,
        };

        match node_type.behavior.execute(node, &mut node_ctx) {
            Ok(result) => {
                tracing::trace!(graph = %graph_id, node = %node_id, "{} -> {result:?}", node_type.name);
                result
            }
            Err(err) => {
                tracing::warn!(graph = %graph_id, node = %node_id, "{} failed: {err}", node_type.name);
                stats.degraded += 1;
                ExecutionResult::NoOp
            }
        }
    }

    fn follow(
        &self,
        graph: &mut BehaviorGraph,
        ctx: &mut ExecutionContext<'_>,
        dispatch: &mut Dispatch,
        node_id: NodeId,
        result: ExecutionResult,
    ) {
        match result {
            ExecutionResult::NoOp => {}
            ExecutionResult::Flow(port) => self.flow(graph, ctx, dispatch, node_id, &port),
            ExecutionResult::MultiFlow { ports, sequential } => {
                for port in &ports {
                    let targets = flow_targets(graph, node_id, port);
                    if targets.is_empty() {
                        continue;
                    }
                    for target in targets {
                        self.dispatch(graph, ctx, dispatch, target);
                    }
                    if sequential {
                        break;
                    }
                }
            }
            ExecutionResult::Values(values) => self.propagate(graph, ctx, dispatch, node_id, values),
            ExecutionResult::FlowWithValues { port, values } => {
                self.propagate(graph, ctx, dispatch, node_id, values);
                self.flow(graph, ctx, dispatch, node_id, &port);
            }
        }
    }

    fn flow(
        &self,
        graph: &mut BehaviorGraph,
        ctx: &mut ExecutionContext<'_>,
        dispatch: &mut Dispatch,
        node_id: NodeId,
        port: &str,
    ) {
        for target in flow_targets(graph, node_id, port) {
            self.dispatch(graph, ctx, dispatch, target);
        }
    }

    /// Write published values into connected inputs, then run the pure data
    /// nodes that received them.
    fn propagate(
        &self,
        graph: &mut BehaviorGraph,
        ctx: &mut ExecutionContext<'_>,
        dispatch: &mut Dispatch,
        node_id: NodeId,
        values: IndexMap<String, PropertyValue>,
    ) {
        for target in write_values(graph, node_id, values) {
            if self.is_pure(graph, target) {
                self.dispatch(graph, ctx, dispatch, target);
            }
        }
    }
}

/// Mirror values into the publisher's own properties and write them into
/// every connected input. Returns the written targets in first-write order.
fn write_values(
    graph: &mut BehaviorGraph,
    node_id: NodeId,
    values: IndexMap<String, PropertyValue>,
) -> Vec<NodeId> {
    let mut written: Vec<NodeId> = Vec::new();

    for (port, value) in values {
        if let Some(node) = graph.nodes.get_mut(node_id) {
            // Output-bound properties mirror the last published value
            node.set_property(&port, value.clone());
        }

        let edges: Vec<(NodeId, String)> = graph
            .connections_from(node_id, &port)
            .map(|c| (c.to_node, c.to_port.clone()))
            .collect();

        for (target, input) in edges {
            let Some(target_node) = graph.nodes.get_mut(target) else {
                continue;
            };
            if !target_node.set_property(&input, value.clone()) {
                tracing::debug!(node = %target, "Input '{input}' has no backing property");
            }
            if !written.contains(&target) {
                written.push(target);
            }
        }
    }
    written
}

fn flow_targets(graph: &BehaviorGraph, node_id: NodeId, port: &str) -> Vec<NodeId> {
    graph
        .connections_from(node_id, port)
        .map(|c| c.to_node)
        .collect()
}
