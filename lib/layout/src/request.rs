//! Layout request and response types, and the service boundary.

use crate::error::LayoutError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tailor_core::NodeId;
use tailor_workflow::{NodeKind, Position, WorkflowGraph};

/// Size hints used for every node in a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeHints {
    pub width: f64,
    pub height: f64,
}

impl Default for SizeHints {
    fn default() -> Self {
        Self {
            width: 160.0,
            height: 60.0,
        }
    }
}

/// A node as seen by the layout service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub width: f64,
    pub height: f64,
}

/// A directed adjacency between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub source: NodeId,
    pub target: NodeId,
}

/// Snapshot of a graph's shape, detached from the graph itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl LayoutRequest {
    /// Captures the nodes (in graph order) and connections of a graph.
    #[must_use]
    pub fn from_graph(graph: &WorkflowGraph, hints: SizeHints) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|n| LayoutNode {
                id: n.id,
                kind: n.kind,
                width: hints.width,
                height: hints.height,
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|e| LayoutEdge {
                source: e.source_node,
                target: e.target_node,
            })
            .collect();
        Self { nodes, edges }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Computed positions keyed by node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResponse {
    pub positions: HashMap<NodeId, Position>,
}

impl LayoutResponse {
    /// Returns the first node whose coordinates are not finite.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<(NodeId, Position)> {
        self.positions
            .iter()
            .find(|(_, p)| !p.is_finite())
            .map(|(id, p)| (*id, *p))
    }
}

/// An external auto-layout engine.
#[async_trait]
pub trait LayoutService: Send + Sync {
    /// Computes positions for the nodes in the request.
    async fn compute(&self, request: &LayoutRequest) -> tailor_core::Result<LayoutResponse, LayoutError>;
}
