//! Workflow definition types.
//!
//! A workflow pairs metadata and lifecycle state with the graph being edited.

use crate::error::{GraphError, WorkflowError};
use crate::graph::WorkflowGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tailor_core::WorkflowId;
use tracing::info;

/// Lifecycle status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Archived,
}

impl WorkflowStatus {
    /// Returns the status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }

    /// Returns whether moving from this status to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Active)
                | (Self::Draft, Self::Archived)
                | (Self::Active, Self::Paused)
                | (Self::Active, Self::Archived)
                | (Self::Paused, Self::Active)
                | (Self::Paused, Self::Archived)
                | (Self::Archived, Self::Draft)
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Human-readable name.
    pub name: String,
    /// What the workflow does.
    #[serde(default)]
    pub description: Option<String>,
    /// Mirrors `status == Active`.
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of recorded runs.
    #[serde(default)]
    pub execution_count: u64,
}

impl WorkflowMetadata {
    /// Creates draft metadata with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            active: false,
            status: WorkflowStatus::Draft,
            created_at: now,
            updated_at: now,
            execution_count: 0,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A complete workflow: metadata plus graph.
///
/// This is the plain value that crosses the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub metadata: WorkflowMetadata,
    #[serde(default)]
    pub graph: WorkflowGraph,
}

impl Workflow {
    /// Creates an empty draft workflow with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(WorkflowId::new(), name)
    }

    /// Creates an empty draft workflow with a specific ID.
    #[must_use]
    pub fn with_id(id: WorkflowId, name: impl Into<String>) -> Self {
        Self {
            id,
            metadata: WorkflowMetadata::new(name),
            graph: WorkflowGraph::new(),
        }
    }

    /// Returns the workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    #[must_use]
    pub fn status(&self) -> WorkflowStatus {
        self.metadata.status
    }

    /// Returns whether the workflow is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.metadata.active
    }

    /// Validates the graph.
    ///
    /// # Errors
    ///
    /// Returns the first structural violation.
    pub fn validate(&self) -> Result<(), GraphError> {
        self.graph.validate()
    }

    /// Activates the workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed, the graph is
    /// invalid, or the graph has no trigger.
    pub fn activate(&mut self) -> Result<(), WorkflowError> {
        self.check_transition(WorkflowStatus::Active)?;
        self.graph
            .validate()
            .map_err(|e| WorkflowError::NotActivatable {
                workflow_id: self.id,
                reason: e.to_string(),
            })?;
        if self.graph.trigger().is_none() {
            return Err(WorkflowError::NotActivatable {
                workflow_id: self.id,
                reason: "workflow has no trigger".to_string(),
            });
        }
        self.set_status(WorkflowStatus::Active);
        Ok(())
    }

    /// Pauses an active workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow is not active.
    pub fn pause(&mut self) -> Result<(), WorkflowError> {
        self.transition(WorkflowStatus::Paused)
    }

    /// Archives the workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow is already archived.
    pub fn archive(&mut self) -> Result<(), WorkflowError> {
        self.transition(WorkflowStatus::Archived)
    }

    /// Restores an archived workflow to draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow is not archived.
    pub fn restore(&mut self) -> Result<(), WorkflowError> {
        self.transition(WorkflowStatus::Draft)
    }

    /// Records one run of the workflow.
    pub fn record_execution(&mut self) {
        self.metadata.execution_count += 1;
    }

    /// Bumps `updated_at`.
    pub fn touch(&mut self) {
        self.metadata.updated_at = Utc::now();
    }

    fn transition(&mut self, next: WorkflowStatus) -> Result<(), WorkflowError> {
        self.check_transition(next)?;
        self.set_status(next);
        Ok(())
    }

    fn check_transition(&self, next: WorkflowStatus) -> Result<(), WorkflowError> {
        if self.metadata.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidStateTransition {
                from: self.metadata.status.to_string(),
                to: next.to_string(),
            })
        }
    }

    fn set_status(&mut self, next: WorkflowStatus) {
        info!(workflow_id = %self.id, from = %self.metadata.status, to = %next, "Workflow status changed");
        self.metadata.status = next;
        self.metadata.active = next == WorkflowStatus::Active;
        self.touch();
    }
}

/// A row in a workflow listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub name: String,
    pub description: Option<String>,
    pub status: WorkflowStatus,
    pub node_count: usize,
    pub edge_count: usize,
    pub execution_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowSummary {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id,
            name: workflow.metadata.name.clone(),
            description: workflow.metadata.description.clone(),
            status: workflow.metadata.status,
            node_count: workflow.graph.node_count(),
            edge_count: workflow.graph.edge_count(),
            execution_count: workflow.metadata.execution_count,
            updated_at: workflow.metadata.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationEngine;
    use crate::node::NodeKind;
    use crate::template::NodeTemplate;

    fn with_trigger() -> Workflow {
        let mut workflow = Workflow::new("Welcome popup");
        let engine = MutationEngine::default();
        let template = NodeTemplate::new("page-visit", NodeKind::Trigger, "Page Visit");
        engine
            .add_node(&mut workflow.graph, &template, None)
            .expect("trigger");
        workflow
    }

    #[test]
    fn new_workflow_is_an_empty_draft() {
        let workflow = Workflow::new("Spring sale");
        assert_eq!(workflow.name(), "Spring sale");
        assert_eq!(workflow.status(), WorkflowStatus::Draft);
        assert!(!workflow.is_active());
        assert_eq!(workflow.graph.node_count(), 0);
    }

    #[test]
    fn transition_table() {
        use WorkflowStatus::*;
        let all = [Draft, Active, Paused, Archived];
        let allowed = [
            (Draft, Active),
            (Draft, Archived),
            (Active, Paused),
            (Active, Archived),
            (Paused, Active),
            (Paused, Archived),
            (Archived, Draft),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn activation_requires_trigger() {
        let mut empty = Workflow::new("Empty");
        assert!(matches!(
            empty.activate(),
            Err(WorkflowError::NotActivatable { .. })
        ));
        assert_eq!(empty.status(), WorkflowStatus::Draft);

        let mut workflow = with_trigger();
        workflow.activate().expect("activate");
        assert!(workflow.is_active());
        assert_eq!(workflow.status(), WorkflowStatus::Active);
    }

    #[test]
    fn lifecycle_round_trip() {
        let mut workflow = with_trigger();
        workflow.activate().expect("activate");
        workflow.pause().expect("pause");
        assert!(!workflow.is_active());
        workflow.activate().expect("resume");
        workflow.archive().expect("archive");
        assert!(workflow.pause().is_err());
        workflow.restore().expect("restore");
        assert_eq!(workflow.status(), WorkflowStatus::Draft);
    }

    #[test]
    fn invalid_transition_is_reported() {
        let mut workflow = Workflow::new("Draft");
        let err = workflow.pause().expect_err("draft cannot pause");
        assert_eq!(
            err,
            WorkflowError::InvalidStateTransition {
                from: "draft".to_string(),
                to: "paused".to_string(),
            }
        );
    }

    #[test]
    fn summary_counts() {
        let mut workflow = with_trigger();
        workflow.record_execution();
        workflow.record_execution();
        let summary = WorkflowSummary::from(&workflow);

        assert_eq!(summary.id, workflow.id);
        assert_eq!(summary.node_count, 1);
        assert_eq!(summary.edge_count, 0);
        assert_eq!(summary.execution_count, 2);
        assert_eq!(summary.status, WorkflowStatus::Draft);
    }

    #[test]
    fn saved_workflow_loads_back_unchanged() {
        let workflow = with_trigger();
        let json = serde_json::to_string(&workflow).expect("serialize");
        let parsed: Workflow = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, workflow);
    }
}
