//! AI-assisted workflow drafting for tailor.
//!
//! A [`DraftGenerator`] turns a natural-language prompt into an untrusted
//! [`DraftWorkflow`]. The [`DraftImporter`] is the only way such a draft
//! becomes a [`Workflow`](tailor_workflow::Workflow): it rebuilds the graph
//! through the mutation engine's rules and rejects the whole draft on the
//! first violation.

pub mod draft;
pub mod error;
pub mod generator;
pub mod import;

pub use draft::{DraftConnection, DraftNode, DraftWorkflow, PartialWorkflow};
pub use error::{GenerationError, ImportError};
pub use generator::{DraftGenerator, HttpDraftGenerator, HttpGeneratorConfig, parse_draft_response};
pub use import::{DraftImporter, ImportPolicy};
