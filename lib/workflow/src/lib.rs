//! Workflow model and editing engine for tailor.
//!
//! This crate provides:
//!
//! - **Template Catalog**: immutable node blueprints with typed config fields
//! - **Graph Model**: ordered nodes and port-to-port connections, with
//!   validation and petgraph-backed analysis
//! - **Mutation Engine**: the only way to change a graph; enforces the
//!   trigger and connection rules atomically
//! - **Template Resolver**: maps nodes back to their templates
//! - **Config editing**: two-phase field edits committed through the engine
//! - **Definitions**: workflow metadata and lifecycle

pub mod catalog;
pub mod confirm;
pub mod definition;
pub mod edge;
pub mod edit_buffer;
pub mod error;
pub mod graph;
pub mod mutation;
pub mod node;
pub mod port;
pub mod resolver;
pub mod template;

pub use catalog::TemplateCatalog;
pub use confirm::{AlwaysReplace, ConfirmReplacement, KeepExisting, ReplacementDecision};
pub use definition::{Workflow, WorkflowMetadata, WorkflowStatus, WorkflowSummary};
pub use edge::Connection;
pub use edit_buffer::{ConfigEditBuffer, FieldEdit};
pub use error::{CatalogError, ConfigEditError, FieldValueError, GraphError, WorkflowError};
pub use graph::{GraphView, GraphWarning, WorkflowGraph};
pub use mutation::{ConnectOutcome, MergeReport, MutationEngine};
pub use node::{ConfigMap, NodeKind, Position, WorkflowNode};
pub use port::{DEFAULT_INPUT, DEFAULT_OUTPUT, InputPort, OutputPort};
pub use resolver::{ConfigIssue, TemplateResolver};
pub use template::{FieldSchema, FieldType, NodeTemplate, SelectOption, TemplateId};
