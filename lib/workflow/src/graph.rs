//! Workflow graph model.
//!
//! The graph is stored as an ordered node list and a connection list so it
//! can cross the persistence boundary as a plain value. Analysis that needs
//! real graph algorithms (reachability, cycles, ordering) builds a petgraph
//! view on demand.
//!
//! Mutating methods here are crate-private: all structural changes go
//! through [`MutationEngine`](crate::mutation::MutationEngine), which
//! enforces the workflow invariants.

use crate::edge::Connection;
use crate::error::GraphError;
use crate::node::{NodeKind, WorkflowNode};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tailor_core::{ConnectionId, NodeId};

/// A workflow graph: ordered nodes plus port-to-port connections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    nodes: Vec<WorkflowNode>,
    #[serde(default)]
    edges: Vec<Connection>,
}

/// A petgraph view of a workflow graph.
///
/// Node weights are node IDs; edge weights are connection IDs.
#[derive(Debug)]
pub struct GraphView {
    pub graph: DiGraph<NodeId, ConnectionId>,
    pub index: HashMap<NodeId, NodeIndex>,
}

/// Non-fatal issues worth showing to the user while editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphWarning {
    /// A non-trigger node has no inbound connection.
    Disconnected { node_id: NodeId },
    /// A node cannot be reached from the trigger.
    Unreachable { node_id: NodeId },
    /// The connections form a cycle.
    CycleDetected,
}

impl fmt::Display for GraphWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { node_id } => {
                write!(f, "node {node_id} has no inbound connection")
            }
            Self::Unreachable { node_id } => {
                write!(f, "node {node_id} is not reachable from the trigger")
            }
            Self::CycleDetected => write!(f, "connections form a cycle"),
        }
    }
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    /// Returns the connections.
    #[must_use]
    pub fn edges(&self) -> &[Connection] {
        &self.edges
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of connections in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns a reference to a node by its ID.
    #[must_use]
    pub fn node(&self, node_id: NodeId) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Returns whether a node with the given ID exists.
    #[must_use]
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.node(node_id).is_some()
    }

    /// Returns the trigger node, if any.
    #[must_use]
    pub fn trigger(&self) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.is_trigger())
    }

    /// Returns the number of nodes of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Returns a connection by its ID.
    #[must_use]
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.edges.iter().find(|e| e.id == connection_id)
    }

    /// Returns every connection touching the given node.
    pub fn connections_of(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    /// Returns the downstream nodes of a given node with the connecting edge.
    #[must_use]
    pub fn successors(&self, node_id: NodeId) -> Vec<(&WorkflowNode, &Connection)> {
        self.edges
            .iter()
            .filter(|e| e.source_node == node_id)
            .filter_map(|e| Some((self.node(e.target_node)?, e)))
            .collect()
    }

    /// Returns the upstream nodes of a given node with the connecting edge.
    #[must_use]
    pub fn predecessors(&self, node_id: NodeId) -> Vec<(&WorkflowNode, &Connection)> {
        self.edges
            .iter()
            .filter(|e| e.target_node == node_id)
            .filter_map(|e| Some((self.node(e.source_node)?, e)))
            .collect()
    }

    /// Builds a petgraph view over the current nodes and connections.
    ///
    /// Connections whose endpoints are missing are skipped.
    #[must_use]
    pub fn view(&self) -> GraphView {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.insert(node.id, graph.add_node(node.id));
        }
        for edge in &self.edges {
            if let (Some(&source), Some(&target)) =
                (index.get(&edge.source_node), index.get(&edge.target_node))
            {
                graph.add_edge(source, target, edge.id);
            }
        }
        GraphView { graph, index }
    }

    /// Returns the IDs of the nodes reachable from the trigger, trigger included.
    #[must_use]
    pub fn reachable_from_trigger(&self) -> HashSet<NodeId> {
        let Some(trigger) = self.trigger() else {
            return HashSet::new();
        };
        let view = self.view();
        let Some(&start) = view.index.get(&trigger.id) else {
            return HashSet::new();
        };

        let mut reachable = HashSet::new();
        let mut bfs = Bfs::new(&view.graph, start);
        while let Some(idx) = bfs.next(&view.graph) {
            reachable.insert(view.graph[idx]);
        }
        reachable
    }

    /// Validates every structural invariant.
    ///
    /// Checks:
    /// - Node IDs are unique and ports match each node's kind
    /// - At most one trigger, and one exists whenever there are nodes
    /// - Connections reference existing nodes and ports
    /// - No connection targets a trigger or loops onto its source
    /// - No two connections link the same ports
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(GraphError::DuplicateNodeId { node_id: node.id });
            }
            if let Some(reason) = node.port_shape_problem() {
                return Err(GraphError::InvalidPorts {
                    node_id: node.id,
                    reason,
                });
            }
        }

        let triggers = self.count_kind(NodeKind::Trigger);
        if triggers > 1 {
            return Err(GraphError::MultipleTriggers { count: triggers });
        }
        if triggers == 0 && !self.nodes.is_empty() {
            return Err(GraphError::MissingTrigger);
        }

        for (i, edge) in self.edges.iter().enumerate() {
            self.check_connection(
                edge.source_node,
                &edge.source_port,
                edge.target_node,
                &edge.target_port,
            )?;
            if self.edges[..i].iter().any(|e| e.same_endpoints(edge)) {
                return Err(GraphError::DuplicateConnection {
                    source_node: edge.source_node,
                    target_node: edge.target_node,
                });
            }
        }

        Ok(())
    }

    /// Returns non-fatal issues: disconnected or unreachable nodes and cycles.
    #[must_use]
    pub fn warnings(&self) -> Vec<GraphWarning> {
        let mut warnings = Vec::new();
        let view = self.view();

        for node in self.nodes.iter().filter(|n| !n.is_trigger()) {
            let inbound = view
                .index
                .get(&node.id)
                .map(|&idx| {
                    view.graph
                        .edges_directed(idx, Direction::Incoming)
                        .filter(|e| e.source() != idx)
                        .count()
                })
                .unwrap_or_default();
            if inbound == 0 {
                warnings.push(GraphWarning::Disconnected { node_id: node.id });
            }
        }

        if self.trigger().is_some() {
            let reachable = self.reachable_from_trigger();
            warnings.extend(
                self.nodes
                    .iter()
                    .filter(|n| !reachable.contains(&n.id))
                    .map(|n| GraphWarning::Unreachable { node_id: n.id }),
            );
        }

        if petgraph::algo::is_cyclic_directed(&view.graph) {
            warnings.push(GraphWarning::CycleDetected);
        }

        warnings
    }

    /// Checks that a connection between the given ports would be legal.
    ///
    /// # Errors
    ///
    /// Returns the structural violation the connection would introduce.
    pub(crate) fn check_connection(
        &self,
        source_id: NodeId,
        source_port: &str,
        target_id: NodeId,
        target_port: &str,
    ) -> Result<(), GraphError> {
        let source = self
            .node(source_id)
            .ok_or(GraphError::NodeNotFound { node_id: source_id })?;
        let target = self
            .node(target_id)
            .ok_or(GraphError::NodeNotFound { node_id: target_id })?;

        if target.is_trigger() {
            return Err(GraphError::ConnectionIntoTrigger { node_id: target_id });
        }
        if source_id == target_id {
            return Err(GraphError::SelfConnection { node_id: source_id });
        }
        if source.output_port(source_port).is_none() {
            return Err(GraphError::SourcePortNotFound {
                node_id: source_id,
                port_name: source_port.to_string(),
            });
        }
        if target.input_port(target_port).is_none() {
            return Err(GraphError::TargetPortNotFound {
                node_id: target_id,
                port_name: target_port.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Option<&mut WorkflowNode> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    pub(crate) fn push_node(&mut self, node: WorkflowNode) {
        self.nodes.push(node);
    }

    pub(crate) fn insert_node_at(&mut self, index: usize, node: WorkflowNode) {
        let index = index.min(self.nodes.len());
        self.nodes.insert(index, node);
    }

    pub(crate) fn push_edge(&mut self, edge: Connection) {
        self.edges.push(edge);
    }

    /// Removes a node and every connection touching it.
    ///
    /// Returns the removed node and the number of connections dropped.
    pub(crate) fn remove_node(&mut self, node_id: NodeId) -> Option<(WorkflowNode, usize)> {
        let position = self.nodes.iter().position(|n| n.id == node_id)?;
        let node = self.nodes.remove(position);
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(node_id));
        Some((node, before - self.edges.len()))
    }

    pub(crate) fn remove_edge(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let position = self.edges.iter().position(|e| e.id == connection_id)?;
        Some(self.edges.remove(position))
    }
}
