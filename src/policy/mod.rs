//! Policy retrieval and the compliance note attached to suggested actions.
//!
//! Retrieval is a collaborator behind [`PolicyRetriever`]; the bundled
//! implementation scores markdown documents by term overlap. A vector
//! store can be slotted in without touching the engine. Absence of
//! citations always degrades gracefully: the engine proceeds with an
//! explicit note and never blocks on policy lookup.

mod index;

pub use index::{PolicyDoc, TermOverlapPolicyIndex};

use async_trait::async_trait;

use crate::error::PolicyError;
use crate::llm::TextGenerator;

/// A ranked policy citation returned by retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyCitation {
    pub source: String,
    pub title: String,
    pub content: String,
    pub relevance: f32,
}

/// Retrieval interface the policy-evaluation step calls.
#[async_trait]
pub trait PolicyRetriever: Send + Sync {
    /// Ranked citations for the issue type and query text.
    async fn citations(
        &self,
        issue_type: Option<&str>,
        query: &str,
    ) -> Result<Vec<PolicyCitation>, PolicyError>;
}

/// Note appended when no citations are available.
pub const NO_CITATIONS_NOTE: &str =
    "Policy evaluation: no policy citations available for this issue.";

/// Compose the compliance note appended to a suggested action.
///
/// Generator failure degrades to a manual-review note; this function
/// never errors.
pub async fn compose_evaluation(
    generator: &dyn TextGenerator,
    issue_type: &str,
    suggested_action: &str,
    citations: &[PolicyCitation],
) -> String {
    if citations.is_empty() {
        return NO_CITATIONS_NOTE.to_string();
    }

    let sources = citations
        .iter()
        .map(|c| c.source.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let snippets = citations
        .iter()
        .map(|c| {
            let excerpt: String = c.content.chars().take(700).collect();
            format!("[{}] {}: {}", c.source, c.title, excerpt)
        })
        .collect::<Vec<_>>()
        .join("\n---\n");

    let system_context =
        "You are a policy compliance checker for customer support decisions. \
         Answer with one short paragraph stating whether the proposed action is \
         compliant with the cited policies and why.";
    let user_context = format!(
        "Issue type: {issue_type}\nProposed action: {suggested_action}\n\nPolicy snippets:\n{snippets}"
    );

    match generator.generate(system_context, &user_context).await {
        Ok(note) => {
            let note = note.trim();
            if note.is_empty() {
                format!("Policy evaluation: cited policies require manual review.\nApplied policies: {sources}")
            } else {
                format!("Policy evaluation: {note}\nApplied policies: {sources}")
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "policy evaluation generation failed, degrading");
            format!("Policy evaluation: cited policies require manual review.\nApplied policies: {sources}")
        }
    }
}
