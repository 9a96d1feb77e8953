//! Error types for the AI crate.
//!
//! - `ImportError`: a draft violates the workflow rules; nothing is imported
//! - `GenerationError`: the generation service failed or answered garbage

use std::fmt;
use tailor_workflow::GraphError;

/// Reasons a draft is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// Confidence is not a finite number in `[0, 1]`.
    InvalidConfidence { confidence: f64 },
    /// Confidence is below the import policy minimum.
    LowConfidence { confidence: f64, minimum: f64 },
    /// Two draft nodes share an ID.
    DuplicateNodeId { id: String },
    /// The draft has no trigger.
    MissingTrigger,
    /// The draft has more than one trigger.
    MultipleTriggers { count: usize },
    /// A connection references a node not in the draft.
    UnknownNode { id: String },
    /// A node could not be inserted.
    InvalidNode { id: String, error: GraphError },
    /// A connection breaks the connection rules.
    InvalidConnection {
        source: String,
        target: String,
        error: GraphError,
    },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfidence { confidence } => {
                write!(f, "draft confidence {confidence} is not within [0, 1]")
            }
            Self::LowConfidence {
                confidence,
                minimum,
            } => write!(
                f,
                "draft confidence {confidence} is below the minimum {minimum}"
            ),
            Self::DuplicateNodeId { id } => write!(f, "draft node id '{id}' is used twice"),
            Self::MissingTrigger => write!(f, "draft has no trigger"),
            Self::MultipleTriggers { count } => {
                write!(f, "draft has {count} triggers, exactly one is required")
            }
            Self::UnknownNode { id } => {
                write!(f, "draft connection references unknown node '{id}'")
            }
            Self::InvalidNode { id, error } => write!(f, "draft node '{id}': {error}"),
            Self::InvalidConnection {
                source,
                target,
                error,
            } => write!(f, "draft connection '{source}' -> '{target}': {error}"),
        }
    }
}

impl std::error::Error for ImportError {}

/// Failures of the generation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The prompt is empty; no request was sent.
    EmptyPrompt,
    /// The generator is misconfigured.
    InvalidConfig { reason: String },
    /// The service could not be reached.
    ServiceUnavailable { reason: String },
    /// The service did not answer in time.
    Timeout,
    /// The service answered with an error status.
    RequestFailed { status: u16, reason: String },
    /// The response body is not a draft workflow.
    MalformedResponse { reason: String },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPrompt => write!(f, "prompt is empty"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid generator configuration: {reason}")
            }
            Self::ServiceUnavailable { reason } => {
                write!(f, "generation service unavailable: {reason}")
            }
            Self::Timeout => write!(f, "generation request timed out"),
            Self::RequestFailed { status, reason } => {
                write!(f, "generation request failed with status {status}: {reason}")
            }
            Self::MalformedResponse { reason } => {
                write!(f, "malformed generation response: {reason}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}
