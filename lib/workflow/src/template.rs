//! Node templates.
//!
//! A template is the immutable blueprint of a node: display metadata, the
//! default configuration copied into every instance, and the ordered schema
//! of configurable fields rendered by the configuration panel.

use crate::error::FieldValueError;
use crate::node::{ConfigMap, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Stable identifier of a template within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    /// Creates a template ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input widget and value type of a configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Select,
    Textarea,
    CssSelector,
}

impl FieldType {
    /// Returns the kebab-case name of this field type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Select => "select",
            Self::Textarea => "textarea",
            Self::CssSelector => "css-selector",
        }
    }

    /// Returns whether the field stores free text.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Textarea | Self::CssSelector)
    }

    /// Returns whether a stored JSON value has the right shape for this type.
    ///
    /// `null` is accepted everywhere; required-ness is checked separately.
    #[must_use]
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match (self, value) {
            (_, JsonValue::Null) => true,
            (Self::Number, JsonValue::Number(_)) => true,
            (Self::Boolean, JsonValue::Bool(_)) => true,
            (Self::Select, JsonValue::String(_)) => true,
            (t, JsonValue::String(_)) if t.is_textual() => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A choice offered by a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    /// Creates an option.
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Schema of one configurable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Configuration key this field edits.
    pub key: String,
    /// Label shown next to the input.
    pub label: String,
    /// Input and value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether a value must be present.
    #[serde(default)]
    pub required: bool,
    /// Choices for select fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Default value shown for an empty field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// Placeholder text for the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Help text shown under the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FieldSchema {
    /// Creates an optional field.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            required: false,
            options: Vec::new(),
            default: None,
            placeholder: None,
            help: None,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds a select option.
    #[must_use]
    pub fn with_option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(SelectOption::new(value, label));
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Returns whether `value` is one of the select options.
    #[must_use]
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    /// Converts committed text into the stored value for this field.
    ///
    /// Empty text clears non-textual fields to `null`. Numbers that are
    /// integral are stored as JSON integers.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot represent a value of this type.
    pub fn coerce(&self, text: &str) -> Result<JsonValue, FieldValueError> {
        if self.field_type.is_textual() {
            return Ok(JsonValue::String(text.to_string()));
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(JsonValue::Null);
        }

        match self.field_type {
            FieldType::Number => coerce_number(trimmed),
            FieldType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(JsonValue::Bool(true)),
                "false" | "off" | "no" | "0" => Ok(JsonValue::Bool(false)),
                _ => Err(FieldValueError::NotABoolean {
                    input: text.to_string(),
                }),
            },
            FieldType::Select => {
                if self.has_option(trimmed) {
                    Ok(JsonValue::String(trimmed.to_string()))
                } else {
                    Err(FieldValueError::UnknownOption {
                        input: text.to_string(),
                        options: self.options.iter().map(|o| o.value.clone()).collect(),
                    })
                }
            }
            FieldType::Text | FieldType::Textarea | FieldType::CssSelector => {
                Ok(JsonValue::String(text.to_string()))
            }
        }
    }
}

fn coerce_number(text: &str) -> Result<JsonValue, FieldValueError> {
    if let Ok(integer) = text.parse::<i64>() {
        return Ok(JsonValue::from(integer));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(JsonValue::Number)
        .ok_or_else(|| FieldValueError::NotANumber {
            input: text.to_string(),
        })
}

/// An immutable node blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Stable template identifier.
    pub id: TemplateId,
    /// Kind of node this template creates.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Free-form grouping label.
    #[serde(default)]
    pub category: String,
    /// Display name.
    pub name: String,
    /// What nodes created from this template do.
    #[serde(default)]
    pub description: String,
    /// Icon reference.
    #[serde(default)]
    pub icon: String,
    /// Configuration copied into each new instance.
    #[serde(default)]
    pub default_config: ConfigMap,
    /// Configurable fields, in display order.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl NodeTemplate {
    /// Creates a template with no fields.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: TemplateId::new(id),
            kind,
            category: String::new(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            default_config: ConfigMap::new(),
            fields: Vec::new(),
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the icon reference.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Sets a default configuration value.
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.default_config.insert(key.into(), value);
        self
    }

    /// Adds a field.
    ///
    /// A field default also seeds `default_config` unless a value for the
    /// key is already present.
    #[must_use]
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        if let Some(default) = &field.default {
            self.default_config
                .entry(field.key.clone())
                .or_insert_with(|| default.clone());
        }
        self.fields.push(field);
        self
    }

    /// Returns the field with the given key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }
}
