//! In-process grid layout.
//!
//! Places nodes row by row in topological order, trigger first. Nodes caught
//! in a cycle follow in request order.

use crate::error::LayoutError;
use crate::request::{LayoutRequest, LayoutResponse, LayoutService};
use async_trait::async_trait;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use tailor_core::NodeId;
use tailor_workflow::{NodeKind, Position};
use tracing::debug;

/// Grid geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayoutConfig {
    /// Nodes per row. Zero is treated as one.
    pub columns: usize,
    pub origin_x: f64,
    pub origin_y: f64,
    pub column_spacing: f64,
    pub row_spacing: f64,
}

impl Default for GridLayoutConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            origin_x: 80.0,
            origin_y: 80.0,
            column_spacing: 200.0,
            row_spacing: 120.0,
        }
    }
}

/// Lays nodes out on a fixed grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridLayout {
    config: GridLayoutConfig,
}

impl GridLayout {
    #[must_use]
    pub fn new(config: GridLayoutConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &GridLayoutConfig {
        &self.config
    }

    /// Returns the request's node IDs in placement order.
    #[must_use]
    pub fn order(request: &LayoutRequest) -> Vec<NodeId> {
        let mut graph: DiGraph<NodeId, ()> = DiGraph::with_capacity(request.nodes.len(), request.edges.len());
        let mut index: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(request.nodes.len());
        for node in &request.nodes {
            index.entry(node.id).or_insert_with(|| graph.add_node(node.id));
        }
        for edge in &request.edges {
            if let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) {
                graph.add_edge(s, t, ());
            }
        }

        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut placed = vec![false; graph.node_count()];
        let mut order = Vec::with_capacity(graph.node_count());

        // Ready nodes are taken lowest index first so ties keep request order.
        let mut ready: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
        let trigger = request
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Trigger)
            .and_then(|n| index.get(&n.id));
        if let Some(&t) = trigger {
            in_degree[t.index()] = 0;
            ready.push(Reverse(t.index()));
        }
        loop {
            while let Some(Reverse(i)) = ready.pop() {
                if placed[i] {
                    continue;
                }
                placed[i] = true;
                let idx = NodeIndex::new(i);
                order.push(graph[idx]);
                for next in graph.neighbors_directed(idx, Direction::Outgoing) {
                    let d = &mut in_degree[next.index()];
                    *d = d.saturating_sub(1);
                    if *d == 0 && !placed[next.index()] {
                        ready.push(Reverse(next.index()));
                    }
                }
            }
            // Seed the next round with the first unplaced root, or failing
            // that the first unplaced node (a cycle).
            let next = (0..placed.len())
                .find(|&i| !placed[i] && in_degree[i] == 0)
                .or_else(|| (0..placed.len()).find(|&i| !placed[i]));
            match next {
                Some(i) => ready.push(Reverse(i)),
                None => break,
            }
        }
        order
    }

    fn position(&self, slot: usize) -> Position {
        let columns = self.config.columns.max(1);
        let (row, column) = (slot / columns, slot % columns);
        Position::new(
            self.config.origin_x + column as f64 * self.config.column_spacing,
            self.config.origin_y + row as f64 * self.config.row_spacing,
        )
    }
}

#[async_trait]
impl LayoutService for GridLayout {
    async fn compute(&self, request: &LayoutRequest) -> tailor_core::Result<LayoutResponse, LayoutError> {
        let positions: HashMap<NodeId, Position> = Self::order(request)
            .into_iter()
            .enumerate()
            .map(|(slot, id)| (id, self.position(slot)))
            .collect();
        debug!(nodes = positions.len(), "Computed grid layout");
        Ok(LayoutResponse { positions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{LayoutEdge, LayoutNode};

    fn node(kind: NodeKind) -> LayoutNode {
        LayoutNode {
            id: NodeId::new(),
            kind,
            width: 160.0,
            height: 60.0,
        }
    }

    fn edge(source: &LayoutNode, target: &LayoutNode) -> LayoutEdge {
        LayoutEdge {
            source: source.id,
            target: target.id,
        }
    }

    #[test]
    fn order_is_topological_with_trigger_first() {
        let t = node(NodeKind::Trigger);
        let a = node(NodeKind::Action);
        let c = node(NodeKind::Condition);
        // Request order puts the action before the condition that feeds it.
        let request = LayoutRequest {
            nodes: vec![a.clone(), t.clone(), c.clone()],
            edges: vec![edge(&t, &c), edge(&c, &a)],
        };

        assert_eq!(GridLayout::order(&request), vec![t.id, c.id, a.id]);
    }

    #[test]
    fn order_includes_disconnected_and_cyclic_nodes() {
        let t = node(NodeKind::Trigger);
        let a = node(NodeKind::Action);
        let b = node(NodeKind::Action);
        let orphan = node(NodeKind::Action);
        let request = LayoutRequest {
            nodes: vec![t.clone(), a.clone(), b.clone(), orphan.clone()],
            edges: vec![edge(&a, &b), edge(&b, &a)],
        };

        let order = GridLayout::order(&request);
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], t.id);
        assert_eq!(order[1], orphan.id);
        assert!(order.contains(&a.id));
        assert!(order.contains(&b.id));
    }

    #[tokio::test]
    async fn grid_positions_follow_rows() {
        let layout = GridLayout::new(GridLayoutConfig {
            columns: 2,
            ..GridLayoutConfig::default()
        });
        let t = node(NodeKind::Trigger);
        let a = node(NodeKind::Action);
        let b = node(NodeKind::Action);
        let request = LayoutRequest {
            nodes: vec![t.clone(), a.clone(), b.clone()],
            edges: vec![edge(&t, &a), edge(&t, &b)],
        };

        let response = layout.compute(&request).await.expect("layout");
        assert_eq!(response.positions[&t.id], Position::new(80.0, 80.0));
        assert_eq!(response.positions[&a.id], Position::new(280.0, 80.0));
        assert_eq!(response.positions[&b.id], Position::new(80.0, 200.0));
    }

    #[tokio::test]
    async fn zero_columns_is_a_single_column() {
        let layout = GridLayout::new(GridLayoutConfig {
            columns: 0,
            ..GridLayoutConfig::default()
        });
        let t = node(NodeKind::Trigger);
        let a = node(NodeKind::Action);
        let request = LayoutRequest {
            nodes: vec![t.clone(), a.clone()],
            edges: vec![edge(&t, &a)],
        };

        let response = layout.compute(&request).await.expect("layout");
        assert_eq!(response.positions[&a.id], Position::new(80.0, 200.0));
    }

    #[tokio::test]
    async fn empty_request_yields_no_positions() {
        let response = GridLayout::default()
            .compute(&LayoutRequest::default())
            .await
            .expect("layout");
        assert!(response.positions.is_empty());
    }
}
