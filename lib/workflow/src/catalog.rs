//! Template catalog.
//!
//! A static, read-only registry of node templates consumed at start-up. The
//! engine instantiates nodes from it and the resolver maps nodes back to it;
//! nothing ever writes to it after construction.

use crate::error::CatalogError;
use crate::node::NodeKind;
use crate::template::{FieldSchema, FieldType, NodeTemplate, TemplateId};
use rootcause::Report;
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// An immutable collection of node templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<NodeTemplate>,
}

impl TemplateCatalog {
    /// Builds a catalog, checking that every template is consistent.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn new(templates: Vec<NodeTemplate>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        for template in &templates {
            if !ids.insert(template.id.clone()) {
                return Err(CatalogError::DuplicateTemplate {
                    id: template.id.clone(),
                });
            }
            check_template(template)?;
        }
        Ok(Self { templates })
    }

    /// Parses a catalog from a JSON array of templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a template is invalid.
    pub fn from_json(json: &str) -> Result<Self, Report<CatalogError>> {
        let templates: Vec<NodeTemplate> =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseFailed {
                reason: e.to_string(),
            })?;
        Ok(Self::new(templates)?)
    }

    /// Loads a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Report<CatalogError>> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CatalogError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            templates = catalog.len(),
            "Loaded template catalog"
        );
        Ok(catalog)
    }

    /// Returns the built-in website-personalization catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    /// Returns all templates in catalog order.
    #[must_use]
    pub fn templates(&self) -> &[NodeTemplate] {
        &self.templates
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Returns the template with the given ID.
    #[must_use]
    pub fn get(&self, id: &TemplateId) -> Option<&NodeTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    /// Returns every template with the given name and kind.
    pub fn find<'a, 'b>(
        &'a self,
        name: &'b str,
        kind: NodeKind,
    ) -> impl Iterator<Item = &'a NodeTemplate> + use<'a, 'b> {
        self.templates
            .iter()
            .filter(move |t| t.kind == kind && t.name == name)
    }

    /// Returns every template of the given kind.
    pub fn by_kind(&self, kind: NodeKind) -> impl Iterator<Item = &NodeTemplate> {
        self.templates.iter().filter(move |t| t.kind == kind)
    }

    /// Returns the distinct categories in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.templates
            .iter()
            .map(|t| t.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }
}

fn check_template(template: &NodeTemplate) -> Result<(), CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidTemplate {
        template: template.id.clone(),
        reason,
    };

    let mut keys = HashSet::new();
    for field in &template.fields {
        if !keys.insert(field.key.as_str()) {
            return Err(CatalogError::DuplicateField {
                template: template.id.clone(),
                key: field.key.clone(),
            });
        }

        if field.field_type == FieldType::Select && field.options.is_empty() {
            return Err(invalid(format!("select field '{}' has no options", field.key)));
        }

        let values = field.default.iter().chain(template.default_config.get(&field.key));
        for value in values {
            if !field.field_type.accepts(value) {
                return Err(invalid(format!(
                    "default for '{}' is not a {} value",
                    field.key, field.field_type
                )));
            }
            if let (FieldType::Select, Some(text)) = (field.field_type, value.as_str()) {
                if !field.has_option(text) {
                    return Err(invalid(format!(
                        "default '{text}' for '{}' is not an option",
                        field.key
                    )));
                }
            }
        }
    }

    debug!(template = %template.id, fields = template.fields.len(), "Template checked");
    Ok(())
}

fn builtin_templates() -> Vec<NodeTemplate> {
    vec![
        // Triggers
        NodeTemplate::new("page-visit", NodeKind::Trigger, "Page Visit")
            .with_category("Navigation")
            .with_description("Starts when a visitor opens a matching page")
            .with_icon("globe")
            .with_field(
                FieldSchema::new("url_pattern", "URL pattern", FieldType::Text)
                    .required()
                    .with_default(json!("/*"))
                    .with_placeholder("/pricing/*"),
            ),
        NodeTemplate::new("time-on-page", NodeKind::Trigger, "Time on Page")
            .with_category("Engagement")
            .with_description("Starts after the visitor stays on a page for a while")
            .with_icon("clock")
            .with_field(
                FieldSchema::new("seconds", "Seconds", FieldType::Number)
                    .required()
                    .with_default(json!(30)),
            ),
        NodeTemplate::new("scroll-depth", NodeKind::Trigger, "Scroll Depth")
            .with_category("Engagement")
            .with_description("Starts when the visitor scrolls past a percentage of the page")
            .with_icon("arrow-down")
            .with_field(
                FieldSchema::new("percent", "Scroll percentage", FieldType::Number)
                    .required()
                    .with_default(json!(50))
                    .with_help("0 to 100"),
            ),
        NodeTemplate::new("exit-intent", NodeKind::Trigger, "Exit Intent")
            .with_category("Engagement")
            .with_description("Starts when the pointer leaves the viewport towards the tab bar")
            .with_icon("log-out")
            .with_field(
                FieldSchema::new("sensitivity", "Sensitivity (px)", FieldType::Number)
                    .with_default(json!(20)),
            ),
        // Actions
        NodeTemplate::new("show-popup", NodeKind::Action, "Show Popup")
            .with_category("Content")
            .with_description("Displays a modal popup")
            .with_icon("message-square")
            .with_field(FieldSchema::new("title", "Title", FieldType::Text).required())
            .with_field(FieldSchema::new("body", "Body", FieldType::Textarea))
            .with_field(
                FieldSchema::new("delay_ms", "Delay (ms)", FieldType::Number)
                    .with_default(json!(0)),
            )
            .with_field(
                FieldSchema::new("dismissible", "Dismissible", FieldType::Boolean)
                    .with_default(json!(true)),
            ),
        NodeTemplate::new("replace-text", NodeKind::Action, "Replace Text")
            .with_category("Content")
            .with_description("Replaces the text of the matching element")
            .with_icon("type")
            .with_field(
                FieldSchema::new("selector", "Element", FieldType::CssSelector)
                    .required()
                    .with_placeholder("#hero h1"),
            )
            .with_field(FieldSchema::new("text", "New text", FieldType::Textarea).required()),
        NodeTemplate::new("hide-element", NodeKind::Action, "Hide Element")
            .with_category("Layout")
            .with_description("Hides the matching element")
            .with_icon("eye-off")
            .with_field(
                FieldSchema::new("selector", "Element", FieldType::CssSelector).required(),
            ),
        NodeTemplate::new("inject-css", NodeKind::Action, "Inject CSS")
            .with_category("Layout")
            .with_description("Adds a stylesheet to the page")
            .with_icon("code")
            .with_field(FieldSchema::new("css", "CSS", FieldType::Textarea).required()),
        NodeTemplate::new("redirect", NodeKind::Action, "Redirect")
            .with_category("Navigation")
            .with_description("Sends the visitor to another URL")
            .with_icon("corner-up-right")
            .with_field(FieldSchema::new("url", "Target URL", FieldType::Text).required())
            .with_field(
                FieldSchema::new("keep_query", "Keep query string", FieldType::Boolean)
                    .with_default(json!(true)),
            ),
        // Conditions
        NodeTemplate::new("device-type", NodeKind::Condition, "Device Type")
            .with_category("Visitor")
            .with_description("Continues only for the selected device type")
            .with_icon("smartphone")
            .with_field(
                FieldSchema::new("device", "Device", FieldType::Select)
                    .required()
                    .with_option("mobile", "Mobile")
                    .with_option("tablet", "Tablet")
                    .with_option("desktop", "Desktop")
                    .with_default(json!("mobile")),
            ),
        NodeTemplate::new("returning-visitor", NodeKind::Condition, "Returning Visitor")
            .with_category("Visitor")
            .with_description("Continues only for visitors seen before")
            .with_icon("user-check")
            .with_field(
                FieldSchema::new("min_visits", "Minimum visits", FieldType::Number)
                    .with_default(json!(2)),
            ),
        NodeTemplate::new("utm-source", NodeKind::Condition, "UTM Source")
            .with_category("Traffic")
            .with_description("Continues when utm_source matches")
            .with_icon("link")
            .with_field(FieldSchema::new("source", "utm_source", FieldType::Text).required()),
        NodeTemplate::new("geolocation", NodeKind::Condition, "Geolocation")
            .with_category("Visitor")
            .with_description("Continues for visitors from the listed countries")
            .with_icon("map-pin")
            .with_field(
                FieldSchema::new("countries", "Country codes", FieldType::Text)
                    .required()
                    .with_placeholder("US, CA")
                    .with_help("Comma-separated ISO 3166 codes"),
            ),
    ]
}
