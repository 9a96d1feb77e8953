//! Connection types for workflow graphs.
//!
//! A connection links a source node's output port to a target node's input
//! port. Connections never target a trigger and are removed together with
//! either endpoint.

use crate::port::{DEFAULT_INPUT, DEFAULT_OUTPUT};
use serde::{Deserialize, Serialize};
use tailor_core::{ConnectionId, NodeId};

/// A connection between two ports in a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier for this connection.
    pub id: ConnectionId,
    /// The source node ID.
    pub source_node: NodeId,
    /// The name of the output port on the source node.
    pub source_port: String,
    /// The target node ID.
    pub target_node: NodeId,
    /// The name of the input port on the target node.
    pub target_port: String,
}

impl Connection {
    /// Creates a new connection between ports.
    #[must_use]
    pub fn new(
        source_node: NodeId,
        source_port: impl Into<String>,
        target_node: NodeId,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            source_node,
            source_port: source_port.into(),
            target_node,
            target_port: target_port.into(),
        }
    }

    /// Creates a connection using default port names ("output" -> "input").
    #[must_use]
    pub fn with_default_ports(source_node: NodeId, target_node: NodeId) -> Self {
        Self::new(source_node, DEFAULT_OUTPUT, target_node, DEFAULT_INPUT)
    }

    /// Returns whether either endpoint is the given node.
    #[must_use]
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.source_node == node_id || self.target_node == node_id
    }

    /// Returns whether this connection links exactly the given ports.
    #[must_use]
    pub fn links(
        &self,
        source_node: NodeId,
        source_port: &str,
        target_node: NodeId,
        target_port: &str,
    ) -> bool {
        self.source_node == source_node
            && self.source_port == source_port
            && self.target_node == target_node
            && self.target_port == target_port
    }

    /// Returns whether two connections link the same ports.
    #[must_use]
    pub fn same_endpoints(&self, other: &Self) -> bool {
        self.links(
            other.source_node,
            &other.source_port,
            other.target_node,
            &other.target_port,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports() {
        let connection = Connection::with_default_ports(NodeId::new(), NodeId::new());
        assert_eq!(connection.source_port, "output");
        assert_eq!(connection.target_port, "input");
    }

    #[test]
    fn touches_either_endpoint() {
        let source = NodeId::new();
        let target = NodeId::new();
        let connection = Connection::with_default_ports(source, target);

        assert!(connection.touches(source));
        assert!(connection.touches(target));
        assert!(!connection.touches(NodeId::new()));
    }

    #[test]
    fn same_endpoints_ignores_id() {
        let source = NodeId::new();
        let target = NodeId::new();
        let a = Connection::with_default_ports(source, target);
        let b = Connection::with_default_ports(source, target);

        assert_ne!(a.id, b.id);
        assert!(a.same_endpoints(&b));
        assert!(!a.same_endpoints(&Connection::with_default_ports(target, source)));
    }
}
