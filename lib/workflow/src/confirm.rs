//! Trigger replacement decisions.
//!
//! Replacing the existing trigger deletes it along with its connections, so
//! the engine asks an injected decision port first. The port is synchronous:
//! the engine does not proceed until it answers, and no partial replacement
//! is ever visible.

use crate::node::WorkflowNode;
use crate::template::NodeTemplate;

/// Answer to a trigger replacement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementDecision {
    /// Remove the existing trigger and insert the new one.
    Replace,
    /// Keep the existing trigger; the add is rejected.
    Keep,
}

/// Decides whether an existing trigger may be replaced.
pub trait ConfirmReplacement: Send + Sync {
    /// Called only when a trigger template is added while a trigger exists.
    fn confirm_replacement(
        &self,
        existing: &WorkflowNode,
        incoming: &NodeTemplate,
    ) -> ReplacementDecision;
}

impl<F> ConfirmReplacement for F
where
    F: Fn(&WorkflowNode, &NodeTemplate) -> ReplacementDecision + Send + Sync,
{
    fn confirm_replacement(
        &self,
        existing: &WorkflowNode,
        incoming: &NodeTemplate,
    ) -> ReplacementDecision {
        self(existing, incoming)
    }
}

/// Always keeps the existing trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepExisting;

impl ConfirmReplacement for KeepExisting {
    fn confirm_replacement(&self, _: &WorkflowNode, _: &NodeTemplate) -> ReplacementDecision {
        ReplacementDecision::Keep
    }
}

/// Always replaces the existing trigger.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReplace;

impl ConfirmReplacement for AlwaysReplace {
    fn confirm_replacement(&self, _: &WorkflowNode, _: &NodeTemplate) -> ReplacementDecision {
        ReplacementDecision::Replace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn closures_are_decision_ports() {
        let existing = WorkflowNode::new(NodeKind::Trigger, "Page Visit");
        let incoming = NodeTemplate::new("exit-intent", NodeKind::Trigger, "Exit Intent");

        let port = |existing: &WorkflowNode, incoming: &NodeTemplate| {
            if existing.name == incoming.name {
                ReplacementDecision::Keep
            } else {
                ReplacementDecision::Replace
            }
        };
        assert_eq!(
            port.confirm_replacement(&existing, &incoming),
            ReplacementDecision::Replace
        );
        assert_eq!(
            KeepExisting.confirm_replacement(&existing, &incoming),
            ReplacementDecision::Keep
        );
        assert_eq!(
            AlwaysReplace.confirm_replacement(&existing, &incoming),
            ReplacementDecision::Replace
        );
    }
}
