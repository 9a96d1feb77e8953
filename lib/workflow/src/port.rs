//! Port system for workflow nodes.
//!
//! Ports are named connection points on nodes. In this design every node
//! has a single output port, and every non-trigger node has a single input
//! port. The output port may feed any number of connections.

use crate::node::NodeKind;
use serde::{Deserialize, Serialize};

/// Name of the single input port carried by non-trigger nodes.
pub const DEFAULT_INPUT: &str = "input";

/// Name of the single output port carried by every node.
pub const DEFAULT_OUTPUT: &str = "output";

/// An input port on a workflow node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPort {
    /// The name of this port.
    pub name: String,
    /// Whether this input must have an incoming connection.
    pub required: bool,
}

impl InputPort {
    /// Creates a new required input port.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }
}

/// An output port on a workflow node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPort {
    /// The name of this port.
    pub name: String,
}

impl OutputPort {
    /// Creates a new output port.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Returns the port layout for a node of the given kind.
///
/// Triggers have no inputs; everything else has exactly one.
#[must_use]
pub fn default_ports(kind: NodeKind) -> (Vec<InputPort>, Vec<OutputPort>) {
    let outputs = vec![OutputPort::new(DEFAULT_OUTPUT)];
    match kind {
        NodeKind::Trigger => (Vec::new(), outputs),
        NodeKind::Action | NodeKind::Condition => {
            (vec![InputPort::required(DEFAULT_INPUT)], outputs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_ports() {
        let (inputs, outputs) = default_ports(NodeKind::Trigger);
        assert!(inputs.is_empty());
        assert_eq!(outputs, vec![OutputPort::new("output")]);
    }

    #[test]
    fn action_and_condition_ports() {
        for kind in [NodeKind::Action, NodeKind::Condition] {
            let (inputs, outputs) = default_ports(kind);
            assert_eq!(inputs.len(), 1);
            assert_eq!(inputs[0].name, "input");
            assert!(inputs[0].required);
            assert_eq!(outputs.len(), 1);
        }
    }
}
