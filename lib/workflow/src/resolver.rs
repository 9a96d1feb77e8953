//! Template resolution for nodes.
//!
//! Maps a node back to the catalog template that describes its
//! configuration form. Nodes created from the catalog carry a stable
//! template ID; imported nodes fall back to a name and kind lookup.

use crate::catalog::TemplateCatalog;
use crate::node::WorkflowNode;
use crate::template::{FieldSchema, FieldType, NodeTemplate};
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::debug;

/// A problem with a node's configuration relative to its template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    /// A required field has no value.
    MissingRequired { key: String },
    /// A value's JSON type does not fit the field type.
    TypeMismatch {
        key: String,
        expected: FieldType,
        found: &'static str,
    },
    /// A select value is not one of the options.
    UnknownOption { key: String, value: String },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired { key } => write!(f, "'{key}' is required"),
            Self::TypeMismatch {
                key,
                expected,
                found,
            } => write!(f, "'{key}' should be {expected}, found {found}"),
            Self::UnknownOption { key, value } => {
                write!(f, "'{key}' has unknown option '{value}'")
            }
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Looks up templates for nodes in a catalog.
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver<'a> {
    catalog: &'a TemplateCatalog,
}

impl<'a> TemplateResolver<'a> {
    #[must_use]
    pub fn new(catalog: &'a TemplateCatalog) -> Self {
        Self { catalog }
    }

    /// Returns the template describing the node, if any.
    ///
    /// A stored template ID wins when it names a template of the node's
    /// kind. Otherwise the first template with the node's name and kind is
    /// used. A miss is not an error.
    #[must_use]
    pub fn resolve(&self, node: &WorkflowNode) -> Option<&'a NodeTemplate> {
        let by_id = node
            .template_id
            .as_ref()
            .and_then(|id| self.catalog.get(id))
            .filter(|t| t.kind == node.kind);
        let found = by_id.or_else(|| self.catalog.find(&node.name, node.kind).next());
        if found.is_none() {
            debug!(
                node_id = %node.id,
                name = %node.name,
                kind = %node.kind,
                "No template for node"
            );
        }
        found
    }

    /// Returns the node's configuration fields, or an empty list on a miss.
    #[must_use]
    pub fn fields(&self, node: &WorkflowNode) -> &'a [FieldSchema] {
        self.resolve(node).map_or(&[], |t| t.fields.as_slice())
    }

    /// Returns one field of the node's template.
    #[must_use]
    pub fn field(&self, node: &WorkflowNode, key: &str) -> Option<&'a FieldSchema> {
        self.resolve(node)?.field(key)
    }

    /// Checks the node's configuration against its template fields.
    ///
    /// Nodes without a template have no issues.
    #[must_use]
    pub fn config_issues(&self, node: &WorkflowNode) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for field in self.fields(node) {
            let value = node.config.get(&field.key).unwrap_or(&JsonValue::Null);
            let blank = match value {
                JsonValue::Null => true,
                JsonValue::String(s) => s.trim().is_empty(),
                _ => false,
            };

            if blank {
                if field.required {
                    issues.push(ConfigIssue::MissingRequired {
                        key: field.key.clone(),
                    });
                }
                continue;
            }

            if !field.field_type.accepts(value) {
                issues.push(ConfigIssue::TypeMismatch {
                    key: field.key.clone(),
                    expected: field.field_type,
                    found: json_type_name(value),
                });
                continue;
            }

            if field.field_type == FieldType::Select {
                if let JsonValue::String(choice) = value {
                    if !field.has_option(choice) {
                        issues.push(ConfigIssue::UnknownOption {
                            key: field.key.clone(),
                            value: choice.clone(),
                        });
                    }
                }
            }
        }
        issues
    }
}
