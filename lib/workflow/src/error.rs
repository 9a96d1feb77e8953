//! Error types for the workflow crate.
//!
//! Errors are layered:
//! - `GraphError`: structural violations from graph mutations and validation
//! - `FieldValueError` / `ConfigEditError`: configuration value commits
//! - `CatalogError`: template catalog loading
//! - `WorkflowError`: workflow-level operations (lifecycle, activation)
//!
//! Structural errors are returned directly so callers can match on them.
//! Catalog loading crosses the filesystem boundary and is reported through
//! rootcause.

use crate::node::NodeKind;
use crate::template::TemplateId;
use std::fmt;
use tailor_core::{NodeId, WorkflowId};

/// Structural violations.
///
/// Every operation that returns one of these leaves the graph exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The first node of a workflow must be a trigger.
    FirstNodeMustBeTrigger { template: TemplateId, kind: NodeKind },
    /// A trigger already exists and the caller declined to replace it.
    TriggerReplacementDeclined { existing: NodeId },
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// Source port not found on node.
    SourcePortNotFound { node_id: NodeId, port_name: String },
    /// Target port not found on node.
    TargetPortNotFound { node_id: NodeId, port_name: String },
    /// Triggers accept no inbound connections.
    ConnectionIntoTrigger { node_id: NodeId },
    /// A node cannot be connected to itself.
    SelfConnection { node_id: NodeId },
    /// Two connections link the same ports.
    DuplicateConnection { source_node: NodeId, target_node: NodeId },
    /// More than one trigger is present.
    MultipleTriggers { count: usize },
    /// The graph has nodes but no trigger.
    MissingTrigger,
    /// Two nodes share an ID.
    DuplicateNodeId { node_id: NodeId },
    /// A node's ports do not match its kind.
    InvalidPorts { node_id: NodeId, reason: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstNodeMustBeTrigger { template, kind } => {
                write!(
                    f,
                    "first node must be a trigger, got {kind} template '{template}'"
                )
            }
            Self::TriggerReplacementDeclined { existing } => {
                write!(f, "replacement of trigger {existing} was declined")
            }
            Self::NodeNotFound { node_id } => {
                write!(f, "node not found: {node_id}")
            }
            Self::SourcePortNotFound { node_id, port_name } => {
                write!(f, "source port '{port_name}' not found on node {node_id}")
            }
            Self::TargetPortNotFound { node_id, port_name } => {
                write!(f, "target port '{port_name}' not found on node {node_id}")
            }
            Self::ConnectionIntoTrigger { node_id } => {
                write!(f, "trigger {node_id} cannot accept inbound connections")
            }
            Self::SelfConnection { node_id } => {
                write!(f, "node {node_id} cannot be connected to itself")
            }
            Self::DuplicateConnection {
                source_node,
                target_node,
            } => {
                write!(
                    f,
                    "duplicate connection {source_node} -> {target_node}"
                )
            }
            Self::MultipleTriggers { count } => {
                write!(f, "workflow has {count} triggers, at most one is allowed")
            }
            Self::MissingTrigger => write!(f, "workflow has nodes but no trigger"),
            Self::DuplicateNodeId { node_id } => {
                write!(f, "duplicate node id: {node_id}")
            }
            Self::InvalidPorts { node_id, reason } => {
                write!(f, "invalid ports on node {node_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// A committed text value could not be converted to its field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValueError {
    /// Text is not a finite number.
    NotANumber { input: String },
    /// Text is not a recognised boolean.
    NotABoolean { input: String },
    /// Text is not one of the select options.
    UnknownOption { input: String, options: Vec<String> },
}

impl fmt::Display for FieldValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber { input } => write!(f, "'{input}' is not a number"),
            Self::NotABoolean { input } => write!(f, "'{input}' is not true or false"),
            Self::UnknownOption { input, options } => {
                write!(f, "'{input}' is not one of: {}", options.join(", "))
            }
        }
    }
}

impl std::error::Error for FieldValueError {}

/// Errors from the two-phase configuration editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEditError {
    /// Commit or input without an active edit.
    NoActiveEdit,
    /// The edited node no longer exists.
    NodeNotFound { node_id: NodeId },
    /// The draft text could not be converted; the draft is kept.
    InvalidValue { key: String, error: FieldValueError },
}

impl fmt::Display for ConfigEditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveEdit => write!(f, "no field is being edited"),
            Self::NodeNotFound { node_id } => {
                write!(f, "edited node not found: {node_id}")
            }
            Self::InvalidValue { key, error } => {
                write!(f, "invalid value for '{key}': {error}")
            }
        }
    }
}

impl std::error::Error for ConfigEditError {}

/// Errors loading a template catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog file could not be read.
    ReadFailed { path: String, reason: String },
    /// The catalog JSON could not be parsed.
    ParseFailed { reason: String },
    /// Two templates share an ID.
    DuplicateTemplate { id: TemplateId },
    /// A template declares the same field key twice.
    DuplicateField { template: TemplateId, key: String },
    /// A template definition is inconsistent.
    InvalidTemplate { template: TemplateId, reason: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { path, reason } => {
                write!(f, "failed to read catalog '{path}': {reason}")
            }
            Self::ParseFailed { reason } => {
                write!(f, "failed to parse catalog: {reason}")
            }
            Self::DuplicateTemplate { id } => {
                write!(f, "duplicate template id: {id}")
            }
            Self::DuplicateField { template, key } => {
                write!(f, "template '{template}' declares field '{key}' twice")
            }
            Self::InvalidTemplate { template, reason } => {
                write!(f, "invalid template '{template}': {reason}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// High-level workflow errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Invalid lifecycle transition.
    InvalidStateTransition { from: String, to: String },
    /// The workflow cannot be activated.
    NotActivatable { workflow_id: WorkflowId, reason: String },
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStateTransition { from, to } => {
                write!(f, "invalid state transition from {from} to {to}")
            }
            Self::NotActivatable {
                workflow_id,
                reason,
            } => {
                write!(f, "workflow {workflow_id} cannot be activated: {reason}")
            }
        }
    }
}

impl std::error::Error for WorkflowError {}
