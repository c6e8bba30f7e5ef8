//! Reply-template table for the action-preparation step.
//!
//! Placeholders are substituted literally; there is no template logic.

use serde::{Deserialize, Serialize};

/// One action template keyed by issue type, from `replies.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyTemplate {
    pub issue_type: String,
    pub template: String,
}

/// Fixed table of action templates.
#[derive(Debug, Clone)]
pub struct TemplateTable {
    templates: Vec<ReplyTemplate>,
}

/// Action string used when no template matches the issue type.
const FALLBACK_ACTION: &str =
    "Review order {{order_id}} for {{customer_name}} and follow up with the standard resolution.";

impl TemplateTable {
    pub fn new(templates: Vec<ReplyTemplate>) -> Self {
        Self { templates }
    }

    /// Render the action for an issue type, falling back to the generic
    /// action string when no template matches.
    pub fn action_for(&self, issue_type: &str, customer_name: &str, order_id: &str) -> String {
        let template = self
            .templates
            .iter()
            .find(|t| t.issue_type == issue_type)
            .map(|t| t.template.as_str())
            .unwrap_or(FALLBACK_ACTION);

        render(template, customer_name, order_id)
    }
}

/// Literal placeholder substitution for `{{customer_name}}` / `{{order_id}}`.
pub fn render(template: &str, customer_name: &str, order_id: &str) -> String {
    template
        .replace("{{customer_name}}", customer_name)
        .replace("{{order_id}}", order_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn substitutes_placeholders_literally() {
        let rendered = render(
            "Refund {{order_id}} to {{customer_name}}.",
            "Dana Reyes",
            "ORD1001",
        );
        assert_eq!(rendered, "Refund ORD1001 to Dana Reyes.");
    }

    #[test]
    fn unmatched_issue_type_falls_back() {
        let table = TemplateTable::new(vec![ReplyTemplate {
            issue_type: "refund_request".to_string(),
            template: "Refund {{order_id}}.".to_string(),
        }]);
        let action = table.action_for("something_else", "Dana", "ORD1001");
        assert!(action.contains("ORD1001"));
        assert!(action.contains("Dana"));
        assert!(action.contains("standard resolution"));
    }

    #[test]
    fn repeated_placeholders_all_substituted() {
        let rendered = render("{{order_id}} / {{order_id}}", "x", "ORD1234");
        assert_eq!(rendered, "ORD1234 / ORD1234");
    }
}
