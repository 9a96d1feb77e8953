//! Applies layout responses to a graph, newest request only.
//!
//! The adapter never holds the graph. Callers `prepare` a request, hand the
//! request to a [`LayoutService`] however they like, and `apply` the result
//! when it arrives. Local edits may happen in between; the response only
//! touches node positions, and only for nodes still present.

use crate::error::LayoutError;
use crate::request::{LayoutRequest, LayoutResponse, LayoutService, SizeHints};
use rootcause::prelude::Report;
use tailor_core::{RequestSequencer, RequestToken, Staleness};
use tailor_workflow::{MutationEngine, WorkflowGraph};
use tracing::{debug, info, instrument, warn};

/// A prepared layout request and the token its response must carry.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTicket {
    pub token: RequestToken,
    pub request: LayoutRequest,
}

/// What happened to a layout response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    /// Positions were written.
    Applied {
        /// Nodes that received a position.
        updated: usize,
        /// Nodes in the graph with no position in the response.
        unchanged: usize,
        /// Positions for nodes no longer in the graph.
        ignored: usize,
    },
    /// The response was stale and dropped without touching the graph.
    Discarded(Staleness),
}

/// Tracks outstanding layout requests.
#[derive(Debug, Clone, Default)]
pub struct LayoutAdapter {
    sequencer: RequestSequencer,
    hints: SizeHints,
}

impl LayoutAdapter {
    #[must_use]
    pub fn new(hints: SizeHints) -> Self {
        Self {
            sequencer: RequestSequencer::new(),
            hints,
        }
    }

    /// Snapshots the graph and issues a token superseding earlier requests.
    pub fn prepare(&mut self, graph: &WorkflowGraph) -> LayoutTicket {
        let token = self.sequencer.issue();
        debug!(token = %token, nodes = graph.node_count(), "Prepared layout request");
        LayoutTicket {
            token,
            request: LayoutRequest::from_graph(graph, self.hints),
        }
    }

    /// Applies the result of a layout request.
    ///
    /// Stale results are discarded without inspecting them. A current
    /// result is all-or-nothing: any non-finite coordinate rejects the
    /// whole response before a single position is written.
    ///
    /// # Errors
    ///
    /// Returns the service error, or `MalformedResponse` for non-finite
    /// coordinates. The graph is untouched in both cases.
    pub fn apply(
        &mut self,
        engine: &MutationEngine,
        graph: &mut WorkflowGraph,
        token: RequestToken,
        result: Result<LayoutResponse, Report<LayoutError>>,
    ) -> Result<LayoutOutcome, Report<LayoutError>> {
        if let Err(staleness) = self.sequencer.accept(token) {
            debug!(token = %token, %staleness, "Discarded layout response");
            return Ok(LayoutOutcome::Discarded(staleness));
        }

        let response = result.inspect_err(|_| {
            warn!(token = %token, "Layout service failed; positions kept");
        })?;

        if let Some((node_id, position)) = response.first_non_finite() {
            warn!(token = %token, node_id = %node_id, "Layout response has non-finite coordinates");
            return Err(LayoutError::MalformedResponse {
                reason: format!(
                    "node {node_id} has non-finite position ({}, {})",
                    position.x, position.y
                ),
            }
            .into());
        }

        let mut updated = 0;
        for node in graph.nodes().iter().map(|n| n.id).collect::<Vec<_>>() {
            if let Some(&position) = response.positions.get(&node) {
                if engine.move_node(graph, node, position).is_ok() {
                    updated += 1;
                }
            }
        }
        let outcome = LayoutOutcome::Applied {
            updated,
            unchanged: graph.node_count() - updated,
            ignored: response.positions.len() - updated,
        };
        info!(token = %token, updated, "Applied layout");
        Ok(outcome)
    }

    /// Invalidates every outstanding request.
    pub fn abandon(&mut self) {
        if self.sequencer.has_pending() {
            debug!("Abandoned outstanding layout requests");
        }
        self.sequencer.abandon();
    }

    /// Returns whether a request is awaiting its response.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.sequencer.has_pending()
    }

    /// Prepares, computes and applies a layout in one step.
    ///
    /// # Errors
    ///
    /// See [`apply`](Self::apply).
    #[instrument(skip_all)]
    pub async fn run(
        &mut self,
        service: &dyn LayoutService,
        engine: &MutationEngine,
        graph: &mut WorkflowGraph,
    ) -> Result<LayoutOutcome, Report<LayoutError>> {
        let ticket = self.prepare(graph);
        let result = service.compute(&ticket.request).await;
        self.apply(engine, graph, ticket.token, result)
    }
}
