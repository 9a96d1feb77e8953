//! Two-phase configuration editing.
//!
//! Keystrokes update a provisional draft held here; the node's config is only
//! written when the edit is committed. A draft that fails type coercion is
//! kept so the user can correct it.

use crate::error::ConfigEditError;
use crate::graph::WorkflowGraph;
use crate::mutation::MutationEngine;
use crate::template::FieldSchema;
use serde_json::Value as JsonValue;
use tailor_core::NodeId;
use tracing::debug;

/// One field being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit {
    pub node_id: NodeId,
    pub field: FieldSchema,
    pub draft: String,
}

impl FieldEdit {
    /// Returns the config key being edited.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.field.key
    }
}

/// Holds at most one active field edit.
#[derive(Debug, Clone, Default)]
pub struct ConfigEditBuffer {
    active: Option<FieldEdit>,
}

/// Renders a stored config value as editable text.
fn draft_text(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl ConfigEditBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts editing a field, seeding the draft from its current value.
    ///
    /// Any previous draft is discarded without being committed and returned.
    pub fn begin(
        &mut self,
        node_id: NodeId,
        field: &FieldSchema,
        current: Option<&JsonValue>,
    ) -> Option<FieldEdit> {
        let previous = self.active.replace(FieldEdit {
            node_id,
            field: field.clone(),
            draft: draft_text(current),
        });
        if let Some(prev) = &previous {
            debug!(node_id = %prev.node_id, key = %prev.key(), "Discarded uncommitted edit");
        }
        previous
    }

    /// Replaces the draft text. Does not touch the model.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveEdit` if no field is being edited.
    pub fn input(&mut self, text: impl Into<String>) -> Result<(), ConfigEditError> {
        let edit = self.active.as_mut().ok_or(ConfigEditError::NoActiveEdit)?;
        edit.draft = text.into();
        Ok(())
    }

    /// Returns the active edit.
    #[must_use]
    pub fn active(&self) -> Option<&FieldEdit> {
        self.active.as_ref()
    }

    /// Returns the draft text of the active edit.
    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        self.active.as_ref().map(|e| e.draft.as_str())
    }

    /// Coerces the draft and writes it to the node's config.
    ///
    /// On success the edit is closed and the stored value returned.
    ///
    /// # Errors
    ///
    /// - `NoActiveEdit` if nothing is being edited
    /// - `InvalidValue` if the draft does not fit the field type; the draft
    ///   is kept and the model is untouched
    /// - `NodeNotFound` if the node was deleted; the edit is dropped
    pub fn commit(
        &mut self,
        engine: &MutationEngine,
        graph: &mut WorkflowGraph,
    ) -> Result<JsonValue, ConfigEditError> {
        let edit = self.active.as_ref().ok_or(ConfigEditError::NoActiveEdit)?;
        let value = edit
            .field
            .coerce(&edit.draft)
            .map_err(|error| ConfigEditError::InvalidValue {
                key: edit.field.key.clone(),
                error,
            })?;

        let node_id = edit.node_id;
        let key = edit.field.key.clone();
        self.active = None;
        engine
            .update_node_config(graph, node_id, key, value.clone())
            .map_err(|_| ConfigEditError::NodeNotFound { node_id })?;
        Ok(value)
    }

    /// Drops the active edit without writing it.
    pub fn cancel(&mut self) -> Option<FieldEdit> {
        self.active.take()
    }

    /// Drops the active edit if it belongs to the given node.
    ///
    /// Returns whether an edit was dropped.
    pub fn discard_for_node(&mut self, node_id: NodeId) -> bool {
        if self.active.as_ref().is_some_and(|e| e.node_id == node_id) {
            self.active = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldValueError;
    use crate::node::NodeKind;
    use crate::template::{FieldType, NodeTemplate};
    use serde_json::json;

    fn setup() -> (MutationEngine, WorkflowGraph, NodeId, NodeTemplate) {
        let engine = MutationEngine::default();
        let mut graph = WorkflowGraph::new();
        let trigger = NodeTemplate::new("time-on-page", NodeKind::Trigger, "Time on Page")
            .with_field(
                FieldSchema::new("seconds", "Seconds", FieldType::Number).with_default(json!(10)),
            )
            .with_field(FieldSchema::new("label", "Label", FieldType::Text));
        let node = engine.add_node(&mut graph, &trigger, None).expect("trigger");
        (engine, graph, node.id, trigger)
    }

    fn config(graph: &WorkflowGraph, node_id: NodeId, key: &str) -> Option<JsonValue> {
        graph.node(node_id)?.config.get(key).cloned()
    }

    #[test]
    fn input_does_not_touch_model_until_commit() {
        let (engine, mut graph, node_id, template) = setup();
        let field = template.field("seconds").expect("field");
        let mut buffer = ConfigEditBuffer::new();

        buffer.begin(node_id, field, config(&graph, node_id, "seconds").as_ref());
        assert_eq!(buffer.draft(), Some("10"));

        buffer.input("4").expect("input");
        buffer.input("45").expect("input");
        assert_eq!(config(&graph, node_id, "seconds"), Some(json!(10)));

        let stored = buffer.commit(&engine, &mut graph).expect("commit");
        assert_eq!(stored, json!(45));
        assert_eq!(config(&graph, node_id, "seconds"), Some(json!(45)));
        assert!(buffer.active().is_none());
    }

    #[test]
    fn invalid_draft_is_kept_and_model_untouched() {
        let (engine, mut graph, node_id, template) = setup();
        let mut buffer = ConfigEditBuffer::new();
        buffer.begin(node_id, template.field("seconds").expect("field"), None);
        buffer.input("ten").expect("input");

        let err = buffer.commit(&engine, &mut graph).expect_err("not a number");
        assert_eq!(
            err,
            ConfigEditError::InvalidValue {
                key: "seconds".to_string(),
                error: FieldValueError::NotANumber {
                    input: "ten".to_string()
                },
            }
        );
        assert_eq!(buffer.draft(), Some("ten"));
        assert_eq!(config(&graph, node_id, "seconds"), Some(json!(10)));
    }

    #[test]
    fn empty_numeric_draft_commits_null() {
        let (engine, mut graph, node_id, template) = setup();
        let mut buffer = ConfigEditBuffer::new();
        buffer.begin(node_id, template.field("seconds").expect("field"), None);

        assert_eq!(buffer.commit(&engine, &mut graph), Ok(JsonValue::Null));
        assert_eq!(config(&graph, node_id, "seconds"), Some(JsonValue::Null));
    }

    #[test]
    fn begin_discards_previous_draft() {
        let (engine, mut graph, node_id, template) = setup();
        let mut buffer = ConfigEditBuffer::new();
        buffer.begin(node_id, template.field("seconds").expect("field"), None);
        buffer.input("99").expect("input");

        let discarded = buffer
            .begin(node_id, template.field("label").expect("field"), None)
            .expect("previous edit");
        assert_eq!(discarded.draft, "99");
        assert_eq!(config(&graph, node_id, "seconds"), Some(json!(10)));

        buffer.input("hero").expect("input");
        buffer.commit(&engine, &mut graph).expect("commit");
        assert_eq!(config(&graph, node_id, "label"), Some(json!("hero")));
        assert_eq!(config(&graph, node_id, "seconds"), Some(json!(10)));
    }

    #[test]
    fn cancel_and_missing_edit() {
        let (engine, mut graph, node_id, template) = setup();
        let mut buffer = ConfigEditBuffer::new();
        assert_eq!(buffer.input("x"), Err(ConfigEditError::NoActiveEdit));
        assert_eq!(
            buffer.commit(&engine, &mut graph),
            Err(ConfigEditError::NoActiveEdit)
        );

        buffer.begin(node_id, template.field("label").expect("field"), None);
        assert!(buffer.cancel().is_some());
        assert!(buffer.draft().is_none());
    }

    #[test]
    fn edit_on_deleted_node() {
        let (engine, mut graph, node_id, template) = setup();
        let mut buffer = ConfigEditBuffer::new();
        buffer.begin(node_id, template.field("label").expect("field"), None);

        assert!(!buffer.discard_for_node(NodeId::new()));
        engine.delete_node(&mut graph, node_id);
        assert_eq!(
            buffer.commit(&engine, &mut graph),
            Err(ConfigEditError::NodeNotFound { node_id })
        );

        buffer.begin(node_id, template.field("label").expect("field"), None);
        assert!(buffer.discard_for_node(node_id));
        assert!(buffer.active().is_none());
    }
}
