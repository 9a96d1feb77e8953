//! Command implementations.
//!
//! Every command works on an [`EditorSession`] or the draft importer, so the
//! command line enforces the same rules as interactive editing.

use crate::config::CliConfig;
use crate::error::CliError;
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use std::fmt::{self, Write as _};
use std::path::Path;
use std::sync::Arc;
use tailor_ai::{DraftImporter, DraftWorkflow, HttpDraftGenerator};
use tailor_core::NodeId;
use tailor_editor::{EditorSession, GenerationMode, GenerationOutcome};
use tailor_layout::{GridLayout, LayoutOutcome};
use tailor_workflow::{
    ConfigIssue, GraphError, GraphWarning, MutationEngine, NodeKind, TemplateCatalog,
    TemplateResolver, Workflow,
};
use tracing::{debug, info};

const KINDS: [NodeKind; 3] = [NodeKind::Trigger, NodeKind::Action, NodeKind::Condition];

/// Parses a node kind given on the command line.
///
/// # Errors
///
/// Returns a message naming the accepted kinds.
pub fn parse_kind(s: &str) -> Result<NodeKind, String> {
    KINDS
        .into_iter()
        .find(|k| k.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("expected one of: trigger, action, condition (got '{s}')"))
}

/// Loaded configuration and catalog shared by commands.
#[derive(Debug, Clone)]
pub struct Context {
    config: CliConfig,
    catalog: Arc<TemplateCatalog>,
}

impl Context {
    /// Loads the configured catalog, falling back to the built-in one.
    ///
    /// # Errors
    ///
    /// Returns `Catalog` if a configured catalog file cannot be loaded.
    pub fn new(config: CliConfig) -> tailor_core::Result<Self, CliError> {
        let catalog = match &config.catalog_path {
            Some(path) => TemplateCatalog::from_path(path)
                .map_err(|report| report.context(CliError::Catalog))?,
            None => TemplateCatalog::builtin(),
        };
        Ok(Self {
            config,
            catalog: Arc::new(catalog),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    fn session(&self, workflow: Workflow) -> EditorSession {
        EditorSession::new(workflow, Arc::clone(&self.catalog), MutationEngine::default())
            .with_size_hints(self.config.layout.size_hints())
            .with_import_policy(self.config.import.policy())
    }

    async fn lay_out(&self, session: &mut EditorSession) -> tailor_core::Result<(), CliError> {
        let grid = GridLayout::new(self.config.layout.grid());
        let outcome = session
            .auto_layout(&grid)
            .await
            .map_err(|report| report.context(CliError::Layout))?;
        if let LayoutOutcome::Applied { updated, .. } = outcome {
            debug!(updated, "Laid out workflow");
        }
        Ok(())
    }
}

/// Renders the catalog as one tab-separated line per template.
#[must_use]
pub fn catalog_listing(catalog: &TemplateCatalog, kind: Option<NodeKind>) -> String {
    let mut out = String::new();
    for template in catalog
        .templates()
        .iter()
        .filter(|t| kind.is_none_or(|k| t.kind == k))
    {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            template.id, template.kind, template.category, template.name
        );
    }
    out
}

/// Reads and parses a JSON input file.
///
/// # Errors
///
/// Returns `ReadFailed` or `ParseFailed`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> tailor_core::Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(serde_json::from_str(&text).map_err(|e| CliError::ParseFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?)
}

/// Renders a workflow as pretty JSON.
///
/// # Errors
///
/// Returns `WriteFailed` if serialization fails.
pub fn render(workflow: &Workflow) -> tailor_core::Result<String, CliError> {
    Ok(
        serde_json::to_string_pretty(workflow).map_err(|e| CliError::WriteFailed {
            reason: e.to_string(),
        })?,
    )
}

/// Imports a draft file into a new workflow.
///
/// # Errors
///
/// Returns `Editor` if the draft is rejected, or a read or layout failure.
pub async fn import_draft(
    ctx: &Context,
    path: &Path,
    layout: bool,
) -> tailor_core::Result<Workflow, CliError> {
    let draft: DraftWorkflow = read_json(path)?;
    let workflow = DraftImporter::new(ctx.config.import.policy())
        .import(&draft)
        .map_err(|e| CliError::Editor {
            reason: format!("draft rejected: {e}"),
        })?;
    if !layout {
        return Ok(workflow);
    }
    let mut session = ctx.session(workflow);
    ctx.lay_out(&mut session).await?;
    Ok(session.into_workflow())
}

/// Lays out an existing workflow with the configured grid.
///
/// # Errors
///
/// Returns `Layout` if the layout cannot be applied.
pub async fn layout_workflow(ctx: &Context, workflow: Workflow) -> tailor_core::Result<Workflow, CliError> {
    let mut session = ctx.session(workflow);
    ctx.lay_out(&mut session).await?;
    Ok(session.into_workflow())
}

/// Generates a workflow from a prompt through the configured service.
///
/// # Errors
///
/// Returns `GeneratorNotConfigured` without an endpoint, otherwise the
/// generation, import or layout failure.
pub async fn generate(
    ctx: &Context,
    name: &str,
    prompt: &str,
    layout: bool,
) -> tailor_core::Result<Workflow, CliError> {
    let http = ctx
        .config
        .generator
        .http()
        .ok_or(CliError::GeneratorNotConfigured)?;
    let generator = HttpDraftGenerator::new(http)
        .map_err(|e| Report::new(e).context(CliError::Generator))?;

    let mut session = ctx.session(Workflow::new(name));
    let outcome = session
        .generate(&generator, prompt, GenerationMode::Adopt)
        .await
        .map_err(CliError::from)?;
    if let GenerationOutcome::Adopted { nodes, connections } = outcome {
        info!(nodes, connections, "Generated workflow");
    }
    if layout {
        ctx.lay_out(&mut session).await?;
    }
    Ok(session.into_workflow())
}

/// A config problem on one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeIssue {
    pub node_id: NodeId,
    pub node_name: String,
    pub issue: ConfigIssue,
}

/// Everything `validate` found in a workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub error: Option<GraphError>,
    pub warnings: Vec<GraphWarning>,
    pub issues: Vec<NodeIssue>,
}

impl ValidationReport {
    /// Checks a workflow's structure and each node's config.
    #[must_use]
    pub fn check(workflow: &Workflow, catalog: &TemplateCatalog) -> Self {
        let resolver = TemplateResolver::new(catalog);
        let issues = workflow
            .graph
            .nodes()
            .iter()
            .flat_map(|node| {
                resolver
                    .config_issues(node)
                    .into_iter()
                    .map(|issue| NodeIssue {
                        node_id: node.id,
                        node_name: node.name.clone(),
                        issue,
                    })
            })
            .collect();
        Self {
            error: workflow.validate().err(),
            warnings: workflow.graph.warnings(),
            issues,
        }
    }

    /// Returns whether the workflow's structure is valid.
    ///
    /// Warnings and config issues do not make a workflow invalid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => writeln!(f, "error: {error}")?,
            None => writeln!(f, "ok")?,
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        for issue in &self.issues {
            writeln!(
                f,
                "config: {} ({}): {}",
                issue.node_name, issue.node_id, issue.issue
            )?;
        }
        Ok(())
    }
}
