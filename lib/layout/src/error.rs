//! Error types for the layout crate.

use std::fmt;

/// Failures of the external layout boundary.
///
/// None of these are fatal: the graph keeps the positions it had before the
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout service could not be reached.
    ServiceUnavailable { reason: String },
    /// The layout service rejected or failed the request.
    RequestFailed { reason: String },
    /// The response could not be applied.
    MalformedResponse { reason: String },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceUnavailable { reason } => {
                write!(f, "layout service unavailable: {reason}")
            }
            Self::RequestFailed { reason } => write!(f, "layout request failed: {reason}"),
            Self::MalformedResponse { reason } => {
                write!(f, "malformed layout response: {reason}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}
