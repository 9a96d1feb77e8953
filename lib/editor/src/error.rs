//! Error types for editing sessions.

use std::fmt;
use tailor_ai::ImportError;
use tailor_core::NodeId;
use tailor_workflow::{ConfigEditError, GraphError, TemplateId, WorkflowError};

/// Errors from session operations.
///
/// A rejected operation leaves the workflow unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    /// The session was closed.
    Closed,
    /// No catalog template has the given ID.
    UnknownTemplate { id: TemplateId },
    /// The node's template has no field with the given key.
    FieldNotFound { node_id: NodeId, key: String },
    /// A structural rule was violated.
    Graph(GraphError),
    /// A config edit could not be committed.
    ConfigEdit(ConfigEditError),
    /// A lifecycle change was refused.
    Workflow(WorkflowError),
    /// A generated draft was rejected.
    Import(ImportError),
    /// The generation service failed.
    Generation { reason: String },
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "editing session is closed"),
            Self::UnknownTemplate { id } => write!(f, "unknown template: {id}"),
            Self::FieldNotFound { node_id, key } => {
                write!(f, "node {node_id} has no field '{key}'")
            }
            Self::Graph(e) => write!(f, "{e}"),
            Self::ConfigEdit(e) => write!(f, "{e}"),
            Self::Workflow(e) => write!(f, "{e}"),
            Self::Import(e) => write!(f, "draft rejected: {e}"),
            Self::Generation { reason } => write!(f, "generation failed: {reason}"),
        }
    }
}

impl std::error::Error for EditorError {}

impl From<GraphError> for EditorError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

impl From<ConfigEditError> for EditorError {
    fn from(e: ConfigEditError) -> Self {
        Self::ConfigEdit(e)
    }
}

impl From<WorkflowError> for EditorError {
    fn from(e: WorkflowError) -> Self {
        Self::Workflow(e)
    }
}

impl From<ImportError> for EditorError {
    fn from(e: ImportError) -> Self {
        Self::Import(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err: EditorError = GraphError::MissingTrigger.into();
        assert_eq!(err.to_string(), "workflow has nodes but no trigger");

        let err: EditorError = ImportError::MissingTrigger.into();
        assert_eq!(err.to_string(), "draft rejected: draft has no trigger");
    }
}
