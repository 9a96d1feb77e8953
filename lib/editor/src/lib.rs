//! Editing sessions for tailor workflows.
//!
//! An [`EditorSession`] is the single writer for one workflow. It routes
//! every edit through the mutation engine and applies asynchronous layout
//! and generation results only while they are still current.

pub mod error;
pub mod session;

pub use error::EditorError;
pub use session::{EditorSession, GenerationMode, GenerationOutcome};
