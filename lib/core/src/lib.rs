//! Core domain types and utilities for tailor.
//!
//! This crate provides the identifiers, error handling alias and the
//! request sequencing used by every other tailor crate.

pub mod error;
pub mod id;
pub mod sequence;

pub use error::Result;
pub use id::{ConnectionId, NodeId, ParseIdError, WorkflowId};
pub use sequence::{RequestSequencer, RequestToken, Staleness};
