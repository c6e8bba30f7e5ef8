//! Keyword-table issue classification.
//!
//! The tie-break is a deterministic total order: among all rules whose
//! keyword occurs in the lowercased ticket text, the lowest numeric
//! priority wins; at equal priority the longer keyword wins (the more
//! specific match). Classification tests depend on exactly this order.

use serde::{Deserialize, Serialize};

use crate::state::ISSUE_UNKNOWN;

/// One `(keyword, issue_type, priority)` rule from the rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub keyword: String,
    pub issue_type: String,
    pub priority: u32,
}

/// Result of classifying a ticket text.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub issue_type: String,
    /// Human-readable account of why, for the reviewer-facing pipeline.
    pub evidence: String,
}

/// Deterministic keyword classifier over a fixed rule table.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Classifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, ticket_text: &str) -> Classification {
        let haystack = ticket_text.to_lowercase();

        let best = self
            .rules
            .iter()
            .filter(|rule| haystack.contains(&rule.keyword.to_lowercase()))
            .min_by_key(|rule| (rule.priority, std::cmp::Reverse(rule.keyword.len())));

        match best {
            Some(rule) => Classification {
                issue_type: rule.issue_type.clone(),
                evidence: format!(
                    "matched keyword '{}' (priority {})",
                    rule.keyword, rule.priority
                ),
            },
            None => Classification {
                issue_type: ISSUE_UNKNOWN.to_string(),
                evidence: "no classification keyword matched".to_string(),
            },
        }
    }
}
