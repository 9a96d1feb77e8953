//! Draft workflow types produced by a generator.
//!
//! Drafts are untrusted: node IDs are arbitrary strings local to the draft
//! and nothing here is validated until import.

use serde::{Deserialize, Serialize};
use tailor_workflow::{ConfigMap, DEFAULT_INPUT, DEFAULT_OUTPUT, NodeKind, Position};

/// A node proposed by a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftNode {
    /// Draft-local identifier referenced by connections.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl DraftNode {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            category: String::new(),
            description: String::new(),
            icon: String::new(),
            config: ConfigMap::new(),
            position: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_input() -> String {
    DEFAULT_INPUT.to_string()
}

/// A connection proposed by a generator. Ports default to the standard ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftConnection {
    #[serde(alias = "source_node")]
    pub source: String,
    #[serde(default = "default_output")]
    pub source_port: String,
    #[serde(alias = "target_node")]
    pub target: String,
    #[serde(default = "default_input")]
    pub target_port: String,
}

impl DraftConnection {
    /// Connects two draft nodes through their default ports.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_port: default_output(),
            target: target.into(),
            target_port: default_input(),
        }
    }
}

/// The workflow part of a draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialWorkflow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<DraftNode>,
    #[serde(default, alias = "connections")]
    pub edges: Vec<DraftConnection>,
}

/// A generated draft and the generator's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftWorkflow {
    pub workflow: PartialWorkflow,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ports_default_when_omitted() {
        let edge: DraftConnection =
            serde_json::from_value(json!({ "source": "t", "target": "a" })).expect("parse");
        assert_eq!(edge, DraftConnection::new("t", "a"));
    }

    #[test]
    fn draft_parses_minimal_json() {
        let draft: DraftWorkflow = serde_json::from_value(json!({
            "workflow": {
                "name": "Exit offer",
                "nodes": [
                    { "id": "t", "type": "trigger", "name": "Exit Intent" },
                    {
                        "id": "a",
                        "type": "action",
                        "name": "Show Popup",
                        "config": { "title": "Wait!" },
                        "position": { "x": 10.0, "y": 20.0 }
                    }
                ],
                "connections": [{ "source_node": "t", "target_node": "a" }]
            },
            "confidence": 0.8
        }))
        .expect("parse");

        assert_eq!(draft.workflow.name.as_deref(), Some("Exit offer"));
        assert_eq!(draft.workflow.nodes[1].kind, NodeKind::Action);
        assert_eq!(
            draft.workflow.nodes[1].position,
            Some(Position::new(10.0, 20.0))
        );
        assert_eq!(draft.workflow.edges, vec![DraftConnection::new("t", "a")]);
    }
}
