//! Command errors.
//!
//! Failures from the libraries keep their own report and gain a `CliError`
//! context on top, so the printed error shows the whole chain.

use std::fmt;

/// Errors reported by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config,
    /// The template catalog could not be loaded.
    Catalog,
    /// The HTTP client for the generator could not be built.
    Generator,
    /// An input file could not be read.
    ReadFailed { path: String, reason: String },
    /// An input file is not the expected JSON document.
    ParseFailed { path: String, reason: String },
    /// Output could not be written.
    WriteFailed { reason: String },
    /// No generation endpoint is configured.
    GeneratorNotConfigured,
    /// The editing session refused the operation.
    Editor { reason: String },
    /// Layout could not be applied.
    Layout,
    /// The workflow failed validation.
    Invalid { reason: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "invalid configuration"),
            Self::Catalog => write!(f, "failed to load template catalog"),
            Self::Generator => write!(f, "failed to set up generator"),
            Self::ReadFailed { path, reason } => write!(f, "failed to read {path}: {reason}"),
            Self::ParseFailed { path, reason } => write!(f, "failed to parse {path}: {reason}"),
            Self::WriteFailed { reason } => write!(f, "failed to write output: {reason}"),
            Self::GeneratorNotConfigured => {
                write!(f, "no generator endpoint configured (set TAILOR_GENERATOR__ENDPOINT)")
            }
            Self::Editor { reason } => write!(f, "{reason}"),
            Self::Layout => write!(f, "layout failed"),
            Self::Invalid { reason } => write!(f, "workflow is invalid: {reason}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<tailor_editor::EditorError> for CliError {
    fn from(e: tailor_editor::EditorError) -> Self {
        Self::Editor {
            reason: e.to_string(),
        }
    }
}
