//! Workflow node types.
//!
//! Nodes are the building blocks of workflows. Each node has:
//! - A unique ID within the workflow
//! - A kind (trigger, action or condition)
//! - Display metadata copied from its template
//! - An open configuration map
//! - Input and output ports

use crate::port::{InputPort, OutputPort, default_ports};
use crate::template::{NodeTemplate, TemplateId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use tailor_core::NodeId;

/// Live configuration of a node: field key to current value.
pub type ConfigMap = BTreeMap<String, JsonValue>;

/// The kind of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point of a workflow. At most one per workflow, never a target.
    Trigger,
    /// Performs a change on the visitor's page.
    Action,
    /// Gates the rest of the flow on a visitor or page property.
    Condition,
}

impl NodeKind {
    /// Returns the lowercase name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Action => "action",
            Self::Condition => "condition",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns whether both coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A workflow node instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique identifier for this node within the workflow.
    pub id: NodeId,
    /// Template this node was instantiated from.
    ///
    /// Absent for nodes imported from a generated draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
    /// Node kind.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Free-form grouping label.
    pub category: String,
    /// Display name.
    pub name: String,
    /// What this node does.
    #[serde(default)]
    pub description: String,
    /// Icon reference, resolved by the presentation layer.
    #[serde(default)]
    pub icon: String,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
    /// Current configuration values.
    #[serde(default)]
    pub config: ConfigMap,
    /// Input ports for this node.
    pub inputs: Vec<InputPort>,
    /// Output ports for this node.
    pub outputs: Vec<OutputPort>,
}

impl WorkflowNode {
    /// Creates a bare node of the given kind with the standard ports.
    #[must_use]
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        let (inputs, outputs) = default_ports(kind);
        Self {
            id: NodeId::new(),
            template_id: None,
            kind,
            category: String::new(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            position: Position::default(),
            config: ConfigMap::new(),
            inputs,
            outputs,
        }
    }

    /// Instantiates a template.
    ///
    /// The configuration is a deep copy of the template defaults, so later
    /// edits to the node never reach the template.
    #[must_use]
    pub fn from_template(template: &NodeTemplate, position: Position) -> Self {
        let (inputs, outputs) = default_ports(template.kind);
        Self {
            id: NodeId::new(),
            template_id: Some(template.id.clone()),
            kind: template.kind,
            category: template.category.clone(),
            name: template.name.clone(),
            description: template.description.clone(),
            icon: template.icon.clone(),
            position,
            config: template.default_config.clone(),
            inputs,
            outputs,
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Sets one configuration value.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Returns whether this node is a trigger.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.kind == NodeKind::Trigger
    }

    /// Returns the input port with the given name, if any.
    #[must_use]
    pub fn input_port(&self, name: &str) -> Option<&InputPort> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Returns the output port with the given name, if any.
    #[must_use]
    pub fn output_port(&self, name: &str) -> Option<&OutputPort> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Checks the port shape required for this node's kind.
    ///
    /// Returns a description of the problem when the shape is wrong.
    #[must_use]
    pub fn port_shape_problem(&self) -> Option<String> {
        let expected_inputs = usize::from(!self.is_trigger());
        if self.inputs.len() != expected_inputs {
            return Some(format!(
                "{} node must have {expected_inputs} input port(s), found {}",
                self.kind,
                self.inputs.len()
            ));
        }
        if self.outputs.len() != 1 {
            return Some(format!(
                "node must have exactly 1 output port, found {}",
                self.outputs.len()
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::NodeTemplate;
    use serde_json::json;

    #[test]
    fn trigger_node_has_no_inputs() {
        let node = WorkflowNode::new(NodeKind::Trigger, "Page Visit");
        assert!(node.inputs.is_empty());
        assert_eq!(node.outputs.len(), 1);
        assert_eq!(node.outputs[0].name, "output");
        assert!(node.port_shape_problem().is_none());
    }

    #[test]
    fn action_node_has_one_input() {
        let node = WorkflowNode::new(NodeKind::Action, "Show Popup");
        assert_eq!(node.inputs.len(), 1);
        assert!(node.input_port("input").is_some());
        assert!(node.port_shape_problem().is_none());
    }

    #[test]
    fn port_shape_problem_detects_trigger_input() {
        let mut node = WorkflowNode::new(NodeKind::Trigger, "Broken");
        node.inputs.push(crate::port::InputPort::required("input"));
        assert!(node.port_shape_problem().is_some());
    }

    #[test]
    fn from_template_copies_defaults() {
        let template = NodeTemplate::new("show-popup", NodeKind::Action, "Show Popup")
            .with_category("Engagement")
            .with_default("delay_ms", json!(500));
        let node = WorkflowNode::from_template(&template, Position::new(10.0, 20.0));

        assert_eq!(node.template_id.as_ref(), Some(&template.id));
        assert_eq!(node.kind, NodeKind::Action);
        assert_eq!(node.category, "Engagement");
        assert_eq!(node.config.get("delay_ms"), Some(&json!(500)));
        assert_eq!(node.position, Position::new(10.0, 20.0));
    }

    #[test]
    fn node_serializes_kind_as_type() {
        let node = WorkflowNode::new(NodeKind::Condition, "Device Type");
        let json = serde_json::to_value(&node).expect("serialize");
        assert_eq!(json["type"], "condition");
        assert!(json.get("template_id").is_none());
    }

    #[test]
    fn position_finiteness() {
        assert!(Position::new(1.0, 2.0).is_finite());
        assert!(!Position::new(f64::NAN, 2.0).is_finite());
        assert!(!Position::new(1.0, f64::INFINITY).is_finite());
    }
}
