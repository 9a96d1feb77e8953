//! Graph mutation engine.
//!
//! Every structural change to a workflow graph goes through here. Each
//! operation checks all of its preconditions before touching the graph, so
//! a rejected operation leaves the graph exactly as it was.
//!
//! Invariants maintained:
//! - The first node of a non-empty graph is a trigger
//! - At most one trigger exists
//! - No connection targets a trigger or references a missing node
//! - Deleting a node removes every connection touching it

use crate::confirm::{ConfirmReplacement, KeepExisting, ReplacementDecision};
use crate::edge::Connection;
use crate::error::GraphError;
use crate::graph::WorkflowGraph;
use crate::node::{NodeKind, Position, WorkflowNode};
use crate::port::{DEFAULT_INPUT, DEFAULT_OUTPUT};
use crate::template::NodeTemplate;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tailor_core::{ConnectionId, NodeId};
use tracing::{debug, info};

/// Result of a successful connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new connection was created.
    Created(ConnectionId),
    /// An identical connection already existed; nothing changed.
    AlreadyConnected(ConnectionId),
}

impl ConnectOutcome {
    /// Returns the ID of the connection linking the ports.
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            Self::Created(id) | Self::AlreadyConnected(id) => *id,
        }
    }
}

/// Summary of a graph merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    /// Nodes appended to the target graph.
    pub nodes_added: usize,
    /// Connections created in the target graph.
    pub connections_added: usize,
    /// Whether the target was empty and the incoming graph was adopted whole.
    pub adopted: bool,
}

/// Applies validated mutations to workflow graphs.
#[derive(Clone)]
pub struct MutationEngine {
    confirmation: Arc<dyn ConfirmReplacement>,
}

impl Default for MutationEngine {
    fn default() -> Self {
        Self::new(KeepExisting)
    }
}

impl std::fmt::Debug for MutationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationEngine").finish_non_exhaustive()
    }
}

impl MutationEngine {
    /// Creates an engine with the given trigger replacement decision port.
    #[must_use]
    pub fn new(confirmation: impl ConfirmReplacement + 'static) -> Self {
        Self {
            confirmation: Arc::new(confirmation),
        }
    }

    /// Creates an engine sharing an existing decision port.
    #[must_use]
    pub fn with_confirmation(confirmation: Arc<dyn ConfirmReplacement>) -> Self {
        Self { confirmation }
    }

    /// Instantiates a template and appends it to the graph.
    ///
    /// Adding a trigger while one exists asks the decision port; on
    /// `Replace` the old trigger and its connections are removed first.
    ///
    /// # Errors
    ///
    /// - `FirstNodeMustBeTrigger` if the graph has no trigger (empty, or its
    ///   trigger was deleted) and the template is not a trigger
    /// - `TriggerReplacementDeclined` if the decision port keeps the
    ///   existing trigger
    pub fn add_node(
        &self,
        graph: &mut WorkflowGraph,
        template: &NodeTemplate,
        position: Option<Position>,
    ) -> Result<WorkflowNode, GraphError> {
        if graph.trigger().is_none() && template.kind != NodeKind::Trigger {
            debug!(template = %template.id, kind = %template.kind, "Rejected non-trigger node without trigger");
            return Err(GraphError::FirstNodeMustBeTrigger {
                template: template.id.clone(),
                kind: template.kind,
            });
        }

        let replaced = match graph.trigger() {
            Some(existing) if template.kind == NodeKind::Trigger => {
                match self.confirmation.confirm_replacement(existing, template) {
                    ReplacementDecision::Replace => Some(existing.id),
                    ReplacementDecision::Keep => {
                        debug!(existing = %existing.id, template = %template.id, "Trigger replacement declined");
                        return Err(GraphError::TriggerReplacementDeclined {
                            existing: existing.id,
                        });
                    }
                }
            }
            _ => None,
        };

        // The trigger always goes first: into the old trigger's slot, or to
        // the front when the graph has none.
        let mut slot = (template.kind == NodeKind::Trigger).then_some(0);
        if let Some(old_trigger) = replaced {
            slot = graph.nodes().iter().position(|n| n.id == old_trigger);
            if let Some((_, dropped)) = graph.remove_node(old_trigger) {
                info!(node_id = %old_trigger, connections_removed = dropped, "Replaced trigger");
            }
        }

        let node = WorkflowNode::from_template(template, position.unwrap_or_default());
        info!(node_id = %node.id, template = %template.id, kind = %node.kind, "Added node");
        match slot {
            Some(index) => graph.insert_node_at(index, node.clone()),
            None => graph.push_node(node.clone()),
        }
        Ok(node)
    }

    /// Appends a node that was not instantiated from a template.
    ///
    /// Applies the same trigger rules as [`add_node`](Self::add_node) but
    /// never asks for confirmation: a second trigger is rejected outright.
    ///
    /// # Errors
    ///
    /// Returns the violation the node would introduce.
    pub fn insert_node(
        &self,
        graph: &mut WorkflowGraph,
        node: WorkflowNode,
    ) -> Result<NodeId, GraphError> {
        if let Some(reason) = node.port_shape_problem() {
            return Err(GraphError::InvalidPorts {
                node_id: node.id,
                reason,
            });
        }
        if graph.contains_node(node.id) {
            return Err(GraphError::DuplicateNodeId { node_id: node.id });
        }
        match (node.is_trigger(), graph.trigger().is_some()) {
            (false, false) => return Err(GraphError::MissingTrigger),
            (true, true) => return Err(GraphError::MultipleTriggers { count: 2 }),
            _ => {}
        }

        let node_id = node.id;
        debug!(node_id = %node_id, kind = %node.kind, "Inserted node");
        if node.is_trigger() {
            graph.insert_node_at(0, node);
        } else {
            graph.push_node(node);
        }
        Ok(node_id)
    }

    /// Deletes a node and every connection touching it.
    ///
    /// Deleting an absent node is a no-op and returns `None`.
    pub fn delete_node(&self, graph: &mut WorkflowGraph, node_id: NodeId) -> Option<WorkflowNode> {
        let (node, dropped) = graph.remove_node(node_id)?;
        info!(node_id = %node_id, connections_removed = dropped, "Deleted node");
        Some(node)
    }

    /// Sets one configuration key on a node, leaving other keys untouched.
    ///
    /// Keys outside the template schema are accepted. Returns the previous
    /// value for the key, if any.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node does not exist.
    pub fn update_node_config(
        &self,
        graph: &mut WorkflowGraph,
        node_id: NodeId,
        key: impl Into<String>,
        value: JsonValue,
    ) -> Result<Option<JsonValue>, GraphError> {
        let node = graph
            .node_mut(node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        let key = key.into();
        debug!(node_id = %node_id, key = %key, "Updated node config");
        Ok(node.config.insert(key, value))
    }

    /// Moves a node on the canvas.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node does not exist.
    pub fn move_node(
        &self,
        graph: &mut WorkflowGraph,
        node_id: NodeId,
        position: Position,
    ) -> Result<(), GraphError> {
        let node = graph
            .node_mut(node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?;
        node.position = position;
        Ok(())
    }

    /// Connects a source output port to a target input port.
    ///
    /// Connecting the same ports twice returns the existing connection.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is missing, the target is a trigger,
    /// the nodes are the same, or a port does not exist.
    pub fn connect(
        &self,
        graph: &mut WorkflowGraph,
        source_id: NodeId,
        source_port: &str,
        target_id: NodeId,
        target_port: &str,
    ) -> Result<ConnectOutcome, GraphError> {
        graph.check_connection(source_id, source_port, target_id, target_port)?;

        if let Some(existing) = graph
            .edges()
            .iter()
            .find(|e| e.links(source_id, source_port, target_id, target_port))
        {
            return Ok(ConnectOutcome::AlreadyConnected(existing.id));
        }

        let connection = Connection::new(source_id, source_port, target_id, target_port);
        let connection_id = connection.id;
        info!(
            connection_id = %connection_id,
            source = %source_id,
            target = %target_id,
            "Connected nodes"
        );
        graph.push_edge(connection);
        Ok(ConnectOutcome::Created(connection_id))
    }

    /// Connects two nodes through their default ports.
    ///
    /// # Errors
    ///
    /// See [`connect`](Self::connect).
    pub fn connect_default(
        &self,
        graph: &mut WorkflowGraph,
        source_id: NodeId,
        target_id: NodeId,
    ) -> Result<ConnectOutcome, GraphError> {
        self.connect(graph, source_id, DEFAULT_OUTPUT, target_id, DEFAULT_INPUT)
    }

    /// Removes a connection. Removing an absent connection is a no-op.
    pub fn disconnect(
        &self,
        graph: &mut WorkflowGraph,
        connection_id: ConnectionId,
    ) -> Option<Connection> {
        let removed = graph.remove_edge(connection_id)?;
        debug!(connection_id = %connection_id, "Disconnected nodes");
        Some(removed)
    }

    /// Merges another graph into `target`.
    ///
    /// An empty target adopts `incoming` as-is. Otherwise the incoming
    /// trigger is dropped, its outgoing connections are re-pointed at the
    /// existing trigger, and every other node and connection is appended.
    /// The merge is computed on a copy and only swapped in on success.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in `incoming` or in the merged
    /// result; `target` is unchanged in that case.
    pub fn merge_graph(
        &self,
        target: &mut WorkflowGraph,
        incoming: WorkflowGraph,
    ) -> Result<MergeReport, GraphError> {
        incoming.validate()?;

        if target.is_empty() {
            let report = MergeReport {
                nodes_added: incoming.node_count(),
                connections_added: incoming.edge_count(),
                adopted: true,
            };
            *target = incoming;
            info!(nodes = report.nodes_added, "Adopted incoming graph");
            return Ok(report);
        }

        let existing_trigger = target.trigger().ok_or(GraphError::MissingTrigger)?.id;
        let incoming_trigger = incoming.trigger().map(|n| n.id);
        let redirect = |id: NodeId| {
            if Some(id) == incoming_trigger {
                existing_trigger
            } else {
                id
            }
        };

        let mut merged = target.clone();
        let mut report = MergeReport::default();
        for node in incoming.nodes().iter().filter(|n| !n.is_trigger()) {
            self.insert_node(&mut merged, node.clone())?;
            report.nodes_added += 1;
        }
        for edge in incoming.edges() {
            let outcome = self.connect(
                &mut merged,
                redirect(edge.source_node),
                &edge.source_port,
                redirect(edge.target_node),
                &edge.target_port,
            )?;
            if matches!(outcome, ConnectOutcome::Created(_)) {
                report.connections_added += 1;
            }
        }

        *target = merged;
        info!(
            nodes_added = report.nodes_added,
            connections_added = report.connections_added,
            "Merged graph"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AlwaysReplace;
    use crate::template::{FieldSchema, FieldType};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page_visit() -> NodeTemplate {
        NodeTemplate::new("page-visit", NodeKind::Trigger, "Page Visit")
            .with_field(FieldSchema::new("url_pattern", "URL", FieldType::Text).with_default(json!("/*")))
    }

    fn exit_intent() -> NodeTemplate {
        NodeTemplate::new("exit-intent", NodeKind::Trigger, "Exit Intent")
    }

    fn show_popup() -> NodeTemplate {
        NodeTemplate::new("show-popup", NodeKind::Action, "Show Popup")
            .with_default("title", json!("Hello"))
            .with_default("delay_ms", json!(0))
    }

    fn device_type() -> NodeTemplate {
        NodeTemplate::new("device-type", NodeKind::Condition, "Device Type")
    }

    /// Trigger -> condition -> action.
    fn seeded(engine: &MutationEngine) -> (WorkflowGraph, NodeId, NodeId, NodeId) {
        let mut graph = WorkflowGraph::new();
        let t = engine.add_node(&mut graph, &page_visit(), None).expect("trigger");
        let c = engine.add_node(&mut graph, &device_type(), None).expect("condition");
        let a = engine.add_node(&mut graph, &show_popup(), None).expect("action");
        engine.connect_default(&mut graph, t.id, c.id).expect("t->c");
        engine.connect_default(&mut graph, c.id, a.id).expect("c->a");
        (graph, t.id, c.id, a.id)
    }

    // Scenario A
    #[test]
    fn first_node_must_be_trigger() {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();

        for template in [show_popup(), device_type()] {
            let result = engine.add_node(&mut graph, &template, None);
            assert!(matches!(
                result,
                Err(GraphError::FirstNodeMustBeTrigger { .. })
            ));
            assert!(graph.is_empty());
        }
    }

    // Scenario B
    #[test]
    fn trigger_on_empty_graph_succeeds() {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();

        let node = engine
            .add_node(&mut graph, &page_visit(), Some(Position::new(5.0, 6.0)))
            .expect("trigger accepted");

        assert_eq!(graph.node_count(), 1);
        assert!(node.inputs.is_empty());
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.position, Position::new(5.0, 6.0));
        assert_eq!(node.config.get("url_pattern"), Some(&json!("/*")));
        assert_eq!(graph.node(node.id), Some(&node));
    }

    #[test]
    fn position_defaults_to_origin() {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();
        let node = engine.add_node(&mut graph, &page_visit(), None).expect("trigger");
        assert_eq!(node.position, Position::default());
    }

    // Scenario C
    #[test]
    fn deleting_action_removes_its_connection() {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();
        let t = engine.add_node(&mut graph, &page_visit(), None).expect("trigger");
        let a = engine.add_node(&mut graph, &show_popup(), None).expect("action");
        engine.connect_default(&mut graph, t.id, a.id).expect("connect");

        let removed = engine.delete_node(&mut graph, a.id).expect("deleted");
        assert_eq!(removed.id, a.id);
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.nodes()[0].id, t.id);
        assert!(graph.edges().is_empty());
    }

    // Scenario D, declined
    #[test]
    fn second_trigger_without_confirmation_is_rejected() {
        let engine = MutationEngine::new(KeepExisting);
        let (mut graph, t_id, _, _) = seeded(&engine);
        let before = graph.clone();

        let result = engine.add_node(&mut graph, &exit_intent(), None);
        assert_eq!(
            result,
            Err(GraphError::TriggerReplacementDeclined { existing: t_id })
        );
        assert_eq!(graph, before);
    }

    // Scenario D, confirmed
    #[test]
    fn confirmed_trigger_replacement_removes_old_trigger_and_connections() {
        let engine = MutationEngine::new(AlwaysReplace);
        let mut graph = WorkflowGraph::new();
        let t = engine.add_node(&mut graph, &page_visit(), None).expect("trigger");

        let replacement = engine
            .add_node(&mut graph, &exit_intent(), None)
            .expect("replaced");
        assert_eq!(graph.nodes(), &[replacement.clone()]);
        assert!(!graph.contains_node(t.id));

        let (mut graph, t_id, c_id, _) = seeded(&engine);
        let replacement = engine
            .add_node(&mut graph, &exit_intent(), None)
            .expect("replaced");
        assert!(!graph.contains_node(t_id));
        assert!(graph.edges().iter().all(|e| !e.touches(t_id)));
        assert_eq!(graph.count_kind(NodeKind::Trigger), 1);
        assert!(graph.contains_node(c_id));
        assert_eq!(graph.trigger().map(|n| n.id), Some(replacement.id));
        assert_eq!(graph.nodes()[0].id, replacement.id);
    }

    #[test]
    fn decision_port_is_only_asked_for_trigger_conflicts() {
        let asked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&asked);
        let engine = MutationEngine::new(move |_: &WorkflowNode, _: &NodeTemplate| {
            counter.fetch_add(1, Ordering::SeqCst);
            ReplacementDecision::Keep
        });
        let mut graph = WorkflowGraph::new();

        engine.add_node(&mut graph, &page_visit(), None).expect("trigger");
        engine.add_node(&mut graph, &show_popup(), None).expect("action");
        assert_eq!(asked.load(Ordering::SeqCst), 0);

        let _ = engine.add_node(&mut graph, &exit_intent(), None);
        assert_eq!(asked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn config_is_isolated_from_template() {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();
        let template = show_popup();
        engine.add_node(&mut graph, &page_visit(), None).expect("trigger");

        let first = engine.add_node(&mut graph, &template, None).expect("first");
        engine
            .update_node_config(&mut graph, first.id, "title", json!("Changed"))
            .expect("update");

        assert_eq!(template.default_config.get("title"), Some(&json!("Hello")));
        let second = engine.add_node(&mut graph, &template, None).expect("second");
        assert_eq!(second.config.get("title"), Some(&json!("Hello")));
        assert_eq!(
            graph.node(first.id).and_then(|n| n.config.get("title")),
            Some(&json!("Changed"))
        );
    }

    #[test]
    fn node_ids_are_unique() {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();
        engine.add_node(&mut graph, &page_visit(), None).expect("trigger");
        for _ in 0..50 {
            engine.add_node(&mut graph, &show_popup(), None).expect("action");
        }
        let ids: std::collections::HashSet<_> = graph.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), graph.node_count());
    }

    #[test]
    fn update_config_merges_single_key() {
        let engine = MutationEngine::default();
        let (mut graph, _, _, a_id) = seeded(&engine);

        let previous = engine
            .update_node_config(&mut graph, a_id, "title", json!("Sale"))
            .expect("update");
        assert_eq!(previous, Some(json!("Hello")));

        engine
            .update_node_config(&mut graph, a_id, "unknown_key", json!(true))
            .expect("open map");

        let config = &graph.node(a_id).expect("node").config;
        assert_eq!(config.get("title"), Some(&json!("Sale")));
        assert_eq!(config.get("delay_ms"), Some(&json!(0)));
        assert_eq!(config.get("unknown_key"), Some(&json!(true)));
    }

    #[test]
    fn update_config_on_missing_node_fails_without_change() {
        let engine = MutationEngine::default();
        let (mut graph, _, _, _) = seeded(&engine);
        let before = graph.clone();
        let ghost = NodeId::new();

        let result = engine.update_node_config(&mut graph, ghost, "title", json!("x"));
        assert_eq!(result, Err(GraphError::NodeNotFound { node_id: ghost }));
        assert_eq!(graph, before);
    }

    #[test]
    fn connect_is_idempotent() {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();
        let t = engine.add_node(&mut graph, &page_visit(), None).expect("trigger");
        let a = engine.add_node(&mut graph, &show_popup(), None).expect("action");

        let first = engine.connect_default(&mut graph, t.id, a.id).expect("first");
        let second = engine.connect_default(&mut graph, t.id, a.id).expect("second");

        assert!(matches!(first, ConnectOutcome::Created(_)));
        assert_eq!(second, ConnectOutcome::AlreadyConnected(first.connection_id()));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn connect_rejects_illegal_edges_without_change() {
        let engine = MutationEngine::default();
        let (mut graph, t_id, c_id, a_id) = seeded(&engine);
        let before = graph.clone();
        let ghost = NodeId::new();

        let cases = [
            (a_id, "output", t_id, "input"),
            (ghost, "output", a_id, "input"),
            (t_id, "output", ghost, "input"),
            (c_id, "output", c_id, "input"),
            (t_id, "missing", a_id, "input"),
            (t_id, "output", a_id, "missing"),
        ];
        for (source, source_port, target, target_port) in cases {
            let result = engine.connect(&mut graph, source, source_port, target, target_port);
            assert!(result.is_err(), "{source_port} -> {target_port} accepted");
            assert_eq!(graph, before);
        }

        assert_eq!(
            engine.connect_default(&mut graph, a_id, t_id),
            Err(GraphError::ConnectionIntoTrigger { node_id: t_id })
        );
    }

    #[test]
    fn output_port_fans_out() {
        let engine = MutationEngine::default();
        let (mut graph, t_id, _, a_id) = seeded(&engine);
        engine.connect_default(&mut graph, t_id, a_id).expect("fan out");
        assert_eq!(graph.successors(t_id).len(), 2);
    }

    #[test]
    fn delete_leaves_no_dangling_references() {
        let engine = MutationEngine::default();
        let (graph, t_id, c_id, a_id) = seeded(&engine);

        for node_id in [t_id, c_id, a_id] {
            let mut graph = graph.clone();
            assert!(engine.delete_node(&mut graph, node_id).is_some());

            assert!(!graph.contains_node(node_id));
            assert!(graph.edges().iter().all(|e| !e.touches(node_id)));

            let after_first = graph.clone();
            assert!(engine.delete_node(&mut graph, node_id).is_none());
            assert_eq!(graph, after_first);
        }
    }

    #[test]
    fn disconnect_is_idempotent() {
        let engine = MutationEngine::default();
        let (mut graph, t_id, c_id, _) = seeded(&engine);
        let id = engine
            .connect_default(&mut graph, t_id, c_id)
            .expect("existing")
            .connection_id();

        assert!(engine.disconnect(&mut graph, id).is_some());
        assert!(engine.disconnect(&mut graph, id).is_none());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn move_node_updates_position() {
        let engine = MutationEngine::default();
        let (mut graph, t_id, _, _) = seeded(&engine);
        engine
            .move_node(&mut graph, t_id, Position::new(300.0, 40.0))
            .expect("move");
        assert_eq!(
            graph.node(t_id).map(|n| n.position),
            Some(Position::new(300.0, 40.0))
        );
        assert!(engine
            .move_node(&mut graph, NodeId::new(), Position::default())
            .is_err());
    }

    #[test]
    fn trigger_uniqueness_holds_across_add_sequences() {
        let templates = [page_visit(), show_popup(), exit_intent(), device_type()];
        for engine in [MutationEngine::new(KeepExisting), MutationEngine::new(AlwaysReplace)] {
            let mut graph = WorkflowGraph::new();
            for round in 0..4 {
                for template in templates.iter().cycle().skip(round).take(templates.len()) {
                    let _ = engine.add_node(&mut graph, template, None);
                    assert!(graph.count_kind(NodeKind::Trigger) <= 1);
                    if !graph.is_empty() {
                        assert!(graph.trigger().is_some());
                    }
                }
            }
            assert!(graph.validate().is_ok());
        }
    }

    #[test]
    fn insert_node_enforces_trigger_rules() {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();

        let action = WorkflowNode::new(NodeKind::Action, "Imported");
        assert_eq!(
            engine.insert_node(&mut graph, action.clone()),
            Err(GraphError::MissingTrigger)
        );

        let trigger = WorkflowNode::new(NodeKind::Trigger, "Imported trigger");
        engine.insert_node(&mut graph, trigger.clone()).expect("trigger");
        assert!(matches!(
            engine.insert_node(&mut graph, trigger),
            Err(GraphError::DuplicateNodeId { .. })
        ));
        assert!(matches!(
            engine.insert_node(&mut graph, WorkflowNode::new(NodeKind::Trigger, "Second")),
            Err(GraphError::MultipleTriggers { .. })
        ));
        engine.insert_node(&mut graph, action).expect("action after trigger");
    }

    #[test]
    fn deleted_trigger_blocks_other_nodes_until_re_added() {
        let engine = MutationEngine::new(AlwaysReplace);
        let (mut graph, t, _, a) = seeded(&engine);
        engine.delete_node(&mut graph, t).expect("deleted");
        let before = graph.clone();

        assert!(matches!(
            engine.add_node(&mut graph, &show_popup(), None),
            Err(GraphError::FirstNodeMustBeTrigger { .. })
        ));
        assert_eq!(
            engine.insert_node(&mut graph, WorkflowNode::new(NodeKind::Action, "Imported")),
            Err(GraphError::MissingTrigger)
        );
        assert_eq!(graph, before);

        let trigger = engine
            .add_node(&mut graph, &exit_intent(), None)
            .expect("trigger");
        assert_eq!(graph.nodes()[0].id, trigger.id);
        assert!(graph.nodes()[0].is_trigger());
        assert!(graph.validate().is_ok());
        engine.add_node(&mut graph, &show_popup(), None).expect("action");
        assert!(graph.contains_node(a));

        engine.delete_node(&mut graph, trigger.id).expect("deleted");
        let imported = WorkflowNode::new(NodeKind::Trigger, "Imported trigger");
        let imported_id = engine.insert_node(&mut graph, imported).expect("trigger");
        assert_eq!(graph.nodes()[0].id, imported_id);
    }

    #[test]
    fn merge_into_empty_graph_adopts() {
        let engine = MutationEngine::default();
        let (incoming, _, _, _) = seeded(&engine);
        let mut target = WorkflowGraph::new();

        let report = engine.merge_graph(&mut target, incoming.clone()).expect("adopt");
        assert!(report.adopted);
        assert_eq!(target, incoming);
    }

    #[test]
    fn merge_reuses_existing_trigger() {
        let engine = MutationEngine::default();
        let mut target = WorkflowGraph::new();
        let existing = engine.add_node(&mut target, &page_visit(), None).expect("trigger");
        let (incoming, incoming_trigger, c_id, a_id) = seeded(&engine);

        let report = engine.merge_graph(&mut target, incoming).expect("merge");

        assert_eq!(report.nodes_added, 2);
        assert_eq!(report.connections_added, 2);
        assert!(!target.contains_node(incoming_trigger));
        assert_eq!(target.count_kind(NodeKind::Trigger), 1);
        assert_eq!(target.predecessors(c_id)[0].0.id, existing.id);
        assert!(target.contains_node(a_id));
        assert!(target.validate().is_ok());
    }

    #[test]
    fn failed_merge_leaves_target_unchanged() {
        let engine = MutationEngine::default();
        let (mut target, _, _, _) = seeded(&engine);
        let before = target.clone();

        // Merging a graph into itself collides on node ids.
        let result = engine.merge_graph(&mut target, before.clone());
        assert!(matches!(result, Err(GraphError::DuplicateNodeId { .. })));
        assert_eq!(target, before);
    }
}
