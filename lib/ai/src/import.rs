//! Draft import.
//!
//! Converts an untrusted draft into a workflow, all or nothing. The graph
//! is rebuilt through the mutation engine so a draft can never produce a
//! graph that incremental edits could not.

use crate::draft::{DraftNode, DraftWorkflow};
use crate::error::ImportError;
use std::collections::{HashMap, HashSet};
use tailor_core::NodeId;
use tailor_workflow::{
    ConnectOutcome, MutationEngine, NodeKind, Workflow, WorkflowGraph, WorkflowNode,
};
use tracing::{debug, info, warn};

const UNTITLED: &str = "Untitled workflow";

/// Acceptance thresholds for drafts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportPolicy {
    /// Drafts below this confidence are rejected.
    pub min_confidence: f64,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
        }
    }
}

/// Imports drafts under a policy.
#[derive(Debug, Clone, Default)]
pub struct DraftImporter {
    policy: ImportPolicy,
    engine: MutationEngine,
}

fn to_node(draft: &DraftNode) -> WorkflowNode {
    let mut node = WorkflowNode::new(draft.kind, draft.name.clone());
    node.category = draft.category.clone();
    node.description = draft.description.clone();
    node.icon = draft.icon.clone();
    node.config = draft.config.clone();
    node.position = draft.position.filter(|p| p.is_finite()).unwrap_or_default();
    node
}

impl DraftImporter {
    #[must_use]
    pub fn new(policy: ImportPolicy) -> Self {
        Self {
            policy,
            engine: MutationEngine::default(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &ImportPolicy {
        &self.policy
    }

    /// Builds a draft workflow from a generated draft.
    ///
    /// Imported nodes get fresh IDs and no template ID; the template
    /// resolver finds their templates by name and kind.
    ///
    /// # Errors
    ///
    /// Returns the first rule the draft breaks. Nothing is produced in that
    /// case.
    pub fn import(&self, draft: &DraftWorkflow) -> Result<Workflow, ImportError> {
        let graph = self.import_graph(draft)?;

        let partial = &draft.workflow;
        let mut workflow = Workflow::new(partial.name.clone().unwrap_or_else(|| UNTITLED.to_string()));
        workflow.metadata.description = partial.description.clone();
        workflow.graph = graph;
        info!(
            workflow_id = %workflow.id,
            nodes = workflow.graph.node_count(),
            connections = workflow.graph.edge_count(),
            confidence = draft.confidence,
            "Imported draft"
        );
        Ok(workflow)
    }

    /// Builds only the graph of a draft.
    ///
    /// # Errors
    ///
    /// See [`import`](Self::import).
    pub fn import_graph(&self, draft: &DraftWorkflow) -> Result<WorkflowGraph, ImportError> {
        self.check_confidence(draft.confidence)?;

        let nodes = &draft.workflow.nodes;
        let mut seen = HashSet::with_capacity(nodes.len());
        for node in nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(ImportError::DuplicateNodeId {
                    id: node.id.clone(),
                });
            }
        }

        let triggers = nodes.iter().filter(|n| n.kind == NodeKind::Trigger).count();
        if triggers == 0 {
            warn!("Rejected draft without a trigger");
            return Err(ImportError::MissingTrigger);
        }
        if triggers > 1 {
            return Err(ImportError::MultipleTriggers { count: triggers });
        }

        let mut graph = WorkflowGraph::new();
        let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(nodes.len());
        let ordered = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Trigger)
            .chain(nodes.iter().filter(|n| n.kind != NodeKind::Trigger));
        for draft_node in ordered {
            let node_id = self
                .engine
                .insert_node(&mut graph, to_node(draft_node))
                .map_err(|error| ImportError::InvalidNode {
                    id: draft_node.id.clone(),
                    error,
                })?;
            ids.insert(draft_node.id.as_str(), node_id);
        }

        let lookup = |id: &str| {
            ids.get(id).copied().ok_or_else(|| ImportError::UnknownNode {
                id: id.to_string(),
            })
        };
        for edge in &draft.workflow.edges {
            let source = lookup(&edge.source)?;
            let target = lookup(&edge.target)?;
            let outcome = self
                .engine
                .connect(&mut graph, source, &edge.source_port, target, &edge.target_port)
                .map_err(|error| ImportError::InvalidConnection {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    error,
                })?;
            if let ConnectOutcome::AlreadyConnected(_) = outcome {
                debug!(source = %edge.source, target = %edge.target, "Collapsed duplicate draft connection");
            }
        }

        Ok(graph)
    }

    fn check_confidence(&self, confidence: f64) -> Result<(), ImportError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ImportError::InvalidConfidence { confidence });
        }
        if confidence < self.policy.min_confidence {
            return Err(ImportError::LowConfidence {
                confidence,
                minimum: self.policy.min_confidence,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{DraftConnection, PartialWorkflow};
    use serde_json::json;
    use tailor_workflow::{GraphError, Position, WorkflowStatus};

    fn draft(nodes: Vec<DraftNode>, edges: Vec<DraftConnection>) -> DraftWorkflow {
        DraftWorkflow {
            workflow: PartialWorkflow {
                name: Some("Mobile welcome".to_string()),
                description: Some("Greets mobile visitors".to_string()),
                nodes,
                edges,
            },
            confidence: 0.9,
        }
    }

    fn valid() -> DraftWorkflow {
        let mut popup = DraftNode::new("a", NodeKind::Action, "Show Popup");
        popup.config.insert("title".to_string(), json!("Welcome"));
        draft(
            vec![
                DraftNode::new("c", NodeKind::Condition, "Device Type"),
                popup,
                DraftNode::new("t", NodeKind::Trigger, "Page Visit")
                    .with_position(Position::new(40.0, 40.0)),
            ],
            vec![DraftConnection::new("t", "c"), DraftConnection::new("c", "a")],
        )
    }

    #[test]
    fn valid_draft_imports_with_trigger_first() {
        let workflow = DraftImporter::default().import(&valid()).expect("import");

        assert_eq!(workflow.name(), "Mobile welcome");
        assert_eq!(workflow.status(), WorkflowStatus::Draft);
        let nodes = workflow.graph.nodes();
        assert_eq!(nodes.len(), 3);
        assert!(nodes[0].is_trigger());
        assert_eq!(nodes[0].position, Position::new(40.0, 40.0));
        assert_eq!(nodes[1].name, "Device Type");
        assert_eq!(nodes[1].position, Position::default());
        assert!(nodes.iter().all(|n| n.template_id.is_none()));
        assert_eq!(nodes[2].config.get("title"), Some(&json!("Welcome")));
        assert_eq!(workflow.graph.edge_count(), 2);
        assert!(workflow.validate().is_ok());
    }

    // Scenario E
    #[test]
    fn draft_without_trigger_is_rejected() {
        let draft = draft(
            vec![
                DraftNode::new("a", NodeKind::Action, "Show Popup"),
                DraftNode::new("b", NodeKind::Action, "Hide Element"),
            ],
            vec![DraftConnection::new("a", "b")],
        );
        assert_eq!(
            DraftImporter::default().import(&draft),
            Err(ImportError::MissingTrigger)
        );
    }

    #[test]
    fn draft_with_two_triggers_is_rejected() {
        let draft = draft(
            vec![
                DraftNode::new("t1", NodeKind::Trigger, "Page Visit"),
                DraftNode::new("t2", NodeKind::Trigger, "Exit Intent"),
            ],
            vec![],
        );
        assert_eq!(
            DraftImporter::default().import(&draft),
            Err(ImportError::MultipleTriggers { count: 2 })
        );
    }

    #[test]
    fn edge_into_trigger_is_rejected() {
        let mut draft = valid();
        draft.workflow.edges.push(DraftConnection::new("a", "t"));

        let err = DraftImporter::default().import(&draft).expect_err("rejected");
        assert!(matches!(
            err,
            ImportError::InvalidConnection {
                error: GraphError::ConnectionIntoTrigger { .. },
                ..
            }
        ));
    }

    #[test]
    fn unknown_endpoint_and_port_are_rejected() {
        let mut draft = valid();
        draft.workflow.edges.push(DraftConnection::new("t", "ghost"));
        assert_eq!(
            DraftImporter::default().import(&draft),
            Err(ImportError::UnknownNode {
                id: "ghost".to_string()
            })
        );

        let mut draft = valid();
        let mut edge = DraftConnection::new("t", "a");
        edge.source_port = "success".to_string();
        draft.workflow.edges.push(edge);
        assert!(matches!(
            DraftImporter::default().import(&draft),
            Err(ImportError::InvalidConnection {
                error: GraphError::SourcePortNotFound { .. },
                ..
            })
        ));
    }

    #[test]
    fn self_connection_is_rejected() {
        let mut draft = valid();
        draft.workflow.edges.push(DraftConnection::new("a", "a"));
        assert!(matches!(
            DraftImporter::default().import(&draft),
            Err(ImportError::InvalidConnection {
                error: GraphError::SelfConnection { .. },
                ..
            })
        ));
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut draft = valid();
        draft.workflow.edges.push(DraftConnection::new("t", "c"));

        let workflow = DraftImporter::default().import(&draft).expect("import");
        assert_eq!(workflow.graph.edge_count(), 2);
    }

    #[test]
    fn duplicate_draft_ids_are_rejected() {
        let mut draft = valid();
        draft
            .workflow
            .nodes
            .push(DraftNode::new("a", NodeKind::Action, "Redirect"));
        assert_eq!(
            DraftImporter::default().import(&draft),
            Err(ImportError::DuplicateNodeId {
                id: "a".to_string()
            })
        );
    }

    #[test]
    fn confidence_is_checked() {
        for confidence in [f64::NAN, -0.1, 1.5] {
            let mut draft = valid();
            draft.confidence = confidence;
            assert!(matches!(
                DraftImporter::default().import(&draft),
                Err(ImportError::InvalidConfidence { .. })
            ));
        }

        let importer = DraftImporter::new(ImportPolicy {
            min_confidence: 0.95,
        });
        assert!(matches!(
            importer.import(&valid()),
            Err(ImportError::LowConfidence { .. })
        ));
    }

    #[test]
    fn untitled_draft_gets_default_name() {
        let mut draft = valid();
        draft.workflow.name = None;
        let workflow = DraftImporter::default().import(&draft).expect("import");
        assert_eq!(workflow.name(), UNTITLED);
    }
}
