//! The editing session.
//!
//! The session exclusively owns its workflow. Synchronous edits run to
//! completion one at a time. Layout and generation are split into a
//! request half and a completion half so the caller can run the external
//! call however it likes; completions carry a token and are dropped unless
//! they answer the newest request of their kind.

use crate::error::EditorError;
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tailor_ai::{DraftGenerator, DraftImporter, DraftWorkflow, GenerationError, ImportPolicy};
use tailor_core::{ConnectionId, NodeId, RequestSequencer, RequestToken, Staleness};
use tailor_layout::{LayoutAdapter, LayoutError, LayoutOutcome, LayoutService, LayoutTicket, SizeHints};
use tailor_workflow::{
    ConfigEditBuffer, ConfigIssue, ConnectOutcome, Connection, FieldEdit, FieldSchema,
    MergeReport, MutationEngine, NodeTemplate, Position, TemplateCatalog, TemplateId,
    TemplateResolver, Workflow, WorkflowNode,
};
use tracing::{debug, info, instrument, warn};

/// How a generated draft is applied to the session's workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// Replace the graph with the draft.
    Adopt,
    /// Merge the draft into the graph, keeping the existing trigger.
    Merge,
}

/// What happened to a generation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The graph was replaced by the draft.
    Adopted { nodes: usize, connections: usize },
    /// The draft was merged into the graph.
    Merged(MergeReport),
    /// The result was stale and dropped.
    Discarded(Staleness),
}

/// An editing session over one workflow.
#[derive(Debug)]
pub struct EditorSession {
    workflow: Workflow,
    catalog: Arc<TemplateCatalog>,
    engine: MutationEngine,
    importer: DraftImporter,
    layout: LayoutAdapter,
    generation: RequestSequencer,
    edits: ConfigEditBuffer,
    selection: Option<NodeId>,
    closed: bool,
}

impl EditorSession {
    /// Opens a session over a workflow.
    #[must_use]
    pub fn new(workflow: Workflow, catalog: Arc<TemplateCatalog>, engine: MutationEngine) -> Self {
        info!(workflow_id = %workflow.id, nodes = workflow.graph.node_count(), "Opened editing session");
        Self {
            workflow,
            catalog,
            engine,
            importer: DraftImporter::default(),
            layout: LayoutAdapter::default(),
            generation: RequestSequencer::new(),
            edits: ConfigEditBuffer::new(),
            selection: None,
            closed: false,
        }
    }

    /// Sets the node size hints sent with layout requests.
    #[must_use]
    pub fn with_size_hints(mut self, hints: SizeHints) -> Self {
        self.layout = LayoutAdapter::new(hints);
        self
    }

    /// Sets the policy used to import generated drafts.
    #[must_use]
    pub fn with_import_policy(mut self, policy: ImportPolicy) -> Self {
        self.importer = DraftImporter::new(policy);
        self
    }

    #[must_use]
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns a copy of the workflow for persistence.
    #[must_use]
    pub fn snapshot(&self) -> Workflow {
        self.workflow.clone()
    }

    /// Ends the session and returns the workflow.
    #[must_use]
    pub fn into_workflow(mut self) -> Workflow {
        self.close();
        self.workflow
    }

    /// Closes the session.
    ///
    /// Outstanding layout and generation requests are abandoned and the open
    /// field edit is dropped. Later completions are discarded and further
    /// edits are refused.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.layout.abandon();
        self.generation.abandon();
        self.edits.cancel();
        self.selection = None;
        info!(workflow_id = %self.workflow.id, "Closed editing session");
    }

    fn ensure_open(&self) -> Result<(), EditorError> {
        if self.closed {
            Err(EditorError::Closed)
        } else {
            Ok(())
        }
    }

    // Selection

    #[must_use]
    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    /// Selects a node.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node does not exist.
    pub fn select(&mut self, node_id: NodeId) -> Result<(), EditorError> {
        if !self.workflow.graph.contains_node(node_id) {
            return Err(tailor_workflow::GraphError::NodeNotFound { node_id }.into());
        }
        self.selection = Some(node_id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // Graph edits

    /// Adds a node from a catalog template.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTemplate` or the engine's rejection.
    pub fn add_node(
        &mut self,
        template_id: &TemplateId,
        position: Option<Position>,
    ) -> Result<WorkflowNode, EditorError> {
        self.ensure_open()?;
        let catalog = Arc::clone(&self.catalog);
        let template = catalog
            .get(template_id)
            .ok_or_else(|| EditorError::UnknownTemplate {
                id: template_id.clone(),
            })?;
        let previous_trigger = self.workflow.graph.trigger().map(|n| n.id);

        let node = self
            .engine
            .add_node(&mut self.workflow.graph, template, position)?;

        // A confirmed replacement removed the old trigger.
        if let Some(old) = previous_trigger {
            if !self.workflow.graph.contains_node(old) {
                self.forget_node(old);
            }
        }
        self.workflow.touch();
        Ok(node)
    }

    /// Deletes a node and its connections.
    ///
    /// Clears the selection and any open field edit on the node.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session is closed.
    pub fn delete_node(&mut self, node_id: NodeId) -> Result<Option<WorkflowNode>, EditorError> {
        self.ensure_open()?;
        let removed = self.engine.delete_node(&mut self.workflow.graph, node_id);
        if removed.is_some() {
            self.forget_node(node_id);
            self.workflow.touch();
        }
        Ok(removed)
    }

    fn forget_node(&mut self, node_id: NodeId) {
        if self.selection == Some(node_id) {
            self.selection = None;
        }
        if self.edits.discard_for_node(node_id) {
            debug!(node_id = %node_id, "Dropped field edit on deleted node");
        }
    }

    /// Sets one config value directly, bypassing the edit buffer.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node does not exist.
    pub fn update_node_config(
        &mut self,
        node_id: NodeId,
        key: impl Into<String>,
        value: JsonValue,
    ) -> Result<Option<JsonValue>, EditorError> {
        self.ensure_open()?;
        let previous = self
            .engine
            .update_node_config(&mut self.workflow.graph, node_id, key, value)?;
        self.workflow.touch();
        Ok(previous)
    }

    /// Connects two ports.
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection.
    pub fn connect(
        &mut self,
        source_id: NodeId,
        source_port: &str,
        target_id: NodeId,
        target_port: &str,
    ) -> Result<ConnectOutcome, EditorError> {
        self.ensure_open()?;
        let outcome = self.engine.connect(
            &mut self.workflow.graph,
            source_id,
            source_port,
            target_id,
            target_port,
        )?;
        if let ConnectOutcome::Created(_) = outcome {
            self.workflow.touch();
        }
        Ok(outcome)
    }

    /// Connects two nodes through their default ports.
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection.
    pub fn connect_default(
        &mut self,
        source_id: NodeId,
        target_id: NodeId,
    ) -> Result<ConnectOutcome, EditorError> {
        self.connect(
            source_id,
            tailor_workflow::DEFAULT_OUTPUT,
            target_id,
            tailor_workflow::DEFAULT_INPUT,
        )
    }

    /// Removes a connection.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session is closed.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Result<Option<Connection>, EditorError> {
        self.ensure_open()?;
        let removed = self.engine.disconnect(&mut self.workflow.graph, connection_id);
        if removed.is_some() {
            self.workflow.touch();
        }
        Ok(removed)
    }

    /// Moves a node on the canvas.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node does not exist.
    pub fn move_node(&mut self, node_id: NodeId, position: Position) -> Result<(), EditorError> {
        self.ensure_open()?;
        self.engine
            .move_node(&mut self.workflow.graph, node_id, position)?;
        self.workflow.touch();
        Ok(())
    }

    // Template queries

    #[must_use]
    pub fn resolver(&self) -> TemplateResolver<'_> {
        TemplateResolver::new(&self.catalog)
    }

    /// Returns the template describing a node.
    #[must_use]
    pub fn template_for(&self, node_id: NodeId) -> Option<&NodeTemplate> {
        let node = self.workflow.graph.node(node_id)?;
        self.resolver().resolve(node)
    }

    /// Returns the config fields of a node, or none on a miss.
    #[must_use]
    pub fn fields(&self, node_id: NodeId) -> &[FieldSchema] {
        match self.workflow.graph.node(node_id) {
            Some(node) => self.resolver().fields(node),
            None => &[],
        }
    }

    /// Returns config problems for a node.
    #[must_use]
    pub fn config_issues(&self, node_id: NodeId) -> Vec<ConfigIssue> {
        self.workflow
            .graph
            .node(node_id)
            .map(|node| self.resolver().config_issues(node))
            .unwrap_or_default()
    }

    // Field editing

    /// Starts editing one field of a node.
    ///
    /// Returns the previous uncommitted edit, which is discarded.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `FieldNotFound`.
    pub fn begin_edit(&mut self, node_id: NodeId, key: &str) -> Result<Option<FieldEdit>, EditorError> {
        self.ensure_open()?;
        let node = self
            .workflow
            .graph
            .node(node_id)
            .ok_or(tailor_workflow::GraphError::NodeNotFound { node_id })?;
        let field = TemplateResolver::new(&self.catalog)
            .field(node, key)
            .ok_or_else(|| EditorError::FieldNotFound {
                node_id,
                key: key.to_string(),
            })?;
        Ok(self.edits.begin(node_id, field, node.config.get(key)))
    }

    /// Updates the draft text of the open edit.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveEdit` if no field is being edited.
    pub fn edit_input(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_open()?;
        Ok(self.edits.input(text)?)
    }

    /// Commits the open edit.
    ///
    /// # Errors
    ///
    /// Returns the edit buffer's rejection; an invalid draft stays open.
    pub fn commit_edit(&mut self) -> Result<JsonValue, EditorError> {
        self.ensure_open()?;
        let value = self.edits.commit(&self.engine, &mut self.workflow.graph)?;
        self.workflow.touch();
        Ok(value)
    }

    pub fn cancel_edit(&mut self) -> Option<FieldEdit> {
        self.edits.cancel()
    }

    #[must_use]
    pub fn active_edit(&self) -> Option<&FieldEdit> {
        self.edits.active()
    }

    // Lifecycle

    /// Activates the workflow.
    ///
    /// # Errors
    ///
    /// Returns the lifecycle rejection.
    pub fn activate(&mut self) -> Result<(), EditorError> {
        self.ensure_open()?;
        Ok(self.workflow.activate()?)
    }

    /// Pauses the workflow.
    ///
    /// # Errors
    ///
    /// Returns the lifecycle rejection.
    pub fn pause(&mut self) -> Result<(), EditorError> {
        self.ensure_open()?;
        Ok(self.workflow.pause()?)
    }

    /// Archives the workflow.
    ///
    /// # Errors
    ///
    /// Returns the lifecycle rejection.
    pub fn archive(&mut self) -> Result<(), EditorError> {
        self.ensure_open()?;
        Ok(self.workflow.archive()?)
    }

    /// Restores an archived workflow to draft.
    ///
    /// # Errors
    ///
    /// Returns the lifecycle rejection.
    pub fn restore(&mut self) -> Result<(), EditorError> {
        self.ensure_open()?;
        Ok(self.workflow.restore()?)
    }

    // Layout

    /// Snapshots the graph for a layout request.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session is closed.
    pub fn request_layout(&mut self) -> Result<LayoutTicket, EditorError> {
        self.ensure_open()?;
        Ok(self.layout.prepare(&self.workflow.graph))
    }

    /// Applies a layout result if it answers the newest request.
    ///
    /// # Errors
    ///
    /// Returns the service error or a malformed-response error; positions
    /// are unchanged in both cases.
    pub fn complete_layout(
        &mut self,
        token: RequestToken,
        result: Result<tailor_layout::LayoutResponse, Report<LayoutError>>,
    ) -> Result<LayoutOutcome, Report<LayoutError>> {
        let outcome = self
            .layout
            .apply(&self.engine, &mut self.workflow.graph, token, result)?;
        if let LayoutOutcome::Applied { updated, .. } = outcome {
            if updated > 0 {
                self.workflow.touch();
            }
        }
        Ok(outcome)
    }

    /// Requests and applies a layout in one step.
    ///
    /// # Errors
    ///
    /// See [`complete_layout`](Self::complete_layout).
    #[instrument(skip_all, fields(workflow_id = %self.workflow.id))]
    pub async fn auto_layout(
        &mut self,
        service: &dyn LayoutService,
    ) -> Result<LayoutOutcome, Report<LayoutError>> {
        let ticket = match self.request_layout() {
            Ok(ticket) => ticket,
            Err(_) => return Ok(LayoutOutcome::Discarded(Staleness::Abandoned)),
        };
        let result = service.compute(&ticket.request).await;
        self.complete_layout(ticket.token, result)
    }

    // Generation

    /// Issues a token for a generation request, superseding earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session is closed.
    pub fn begin_generation(&mut self) -> Result<RequestToken, EditorError> {
        self.ensure_open()?;
        let token = self.generation.issue();
        debug!(token = %token, "Began generation request");
        Ok(token)
    }

    /// Applies a generation result if it answers the newest request.
    ///
    /// The draft is imported in full before the graph is touched; adopting
    /// replaces the graph, merging keeps the existing trigger.
    ///
    /// # Errors
    ///
    /// Returns `Generation` for a service failure, `Import` for a rejected
    /// draft, or `Graph` for a failed merge. The workflow is unchanged.
    pub fn complete_generation(
        &mut self,
        token: RequestToken,
        result: Result<DraftWorkflow, Report<GenerationError>>,
        mode: GenerationMode,
    ) -> Result<GenerationOutcome, EditorError> {
        if let Err(staleness) = self.generation.accept(token) {
            debug!(token = %token, %staleness, "Discarded generation result");
            return Ok(GenerationOutcome::Discarded(staleness));
        }

        let draft = result.map_err(|report| {
            warn!(token = %token, "Generation failed; workflow kept");
            EditorError::Generation {
                reason: report.to_string(),
            }
        })?;
        let incoming = self.importer.import_graph(&draft)?;

        let outcome = match mode {
            GenerationMode::Adopt => {
                let outcome = GenerationOutcome::Adopted {
                    nodes: incoming.node_count(),
                    connections: incoming.edge_count(),
                };
                self.workflow.graph = incoming;
                self.edits.cancel();
                self.selection = None;
                outcome
            }
            GenerationMode::Merge => GenerationOutcome::Merged(
                self.engine
                    .merge_graph(&mut self.workflow.graph, incoming)?,
            ),
        };
        if self.workflow.metadata.description.is_none() {
            self.workflow.metadata.description = draft.workflow.description;
        }
        self.workflow.touch();
        info!(token = %token, ?mode, "Applied generated draft");
        Ok(outcome)
    }

    /// Generates a draft and applies it in one step.
    ///
    /// # Errors
    ///
    /// See [`complete_generation`](Self::complete_generation).
    #[instrument(skip_all, fields(workflow_id = %self.workflow.id))]
    pub async fn generate(
        &mut self,
        generator: &dyn DraftGenerator,
        prompt: &str,
        mode: GenerationMode,
    ) -> Result<GenerationOutcome, EditorError> {
        let token = self.begin_generation()?;
        let result = generator.generate(prompt).await;
        self.complete_generation(token, result, mode)
    }
}
