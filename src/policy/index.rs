//! Term-overlap policy index over markdown documents.

use async_trait::async_trait;

use crate::error::PolicyError;
use crate::policy::{PolicyCitation, PolicyRetriever};

/// One policy document, typically loaded from `data/policies/*.md`.
#[derive(Debug, Clone)]
pub struct PolicyDoc {
    /// File name the citation points back to.
    pub source: String,
    pub title: String,
    pub body: String,
}

/// In-process retriever scoring documents by distinct-term overlap with
/// the query, with a bonus for documents that mention the issue type.
/// One document per source, so results are deduplicated by construction.
pub struct TermOverlapPolicyIndex {
    docs: Vec<PolicyDoc>,
    top_k: usize,
}

impl TermOverlapPolicyIndex {
    pub fn new(docs: Vec<PolicyDoc>) -> Self {
        Self { docs, top_k: 3 }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    fn score(&self, doc: &PolicyDoc, issue_type: Option<&str>, query_terms: &[String]) -> f32 {
        let body = doc.body.to_lowercase();
        let mut score = query_terms
            .iter()
            .filter(|term| body.contains(term.as_str()))
            .count() as f32;

        if let Some(issue) = issue_type {
            let spaced = issue.replace('_', " ");
            if body.contains(&spaced) || doc.title.to_lowercase().contains(&spaced) {
                score += 2.0;
            }
        }
        score
    }
}

fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .map(str::to_string)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

#[async_trait]
impl PolicyRetriever for TermOverlapPolicyIndex {
    async fn citations(
        &self,
        issue_type: Option<&str>,
        query: &str,
    ) -> Result<Vec<PolicyCitation>, PolicyError> {
        let terms = query_terms(query);

        let mut scored: Vec<(f32, &PolicyDoc)> = self
            .docs
            .iter()
            .map(|doc| (self.score(doc, issue_type, &terms), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        // Highest score first; source name breaks ties deterministically.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.source.cmp(&b.1.source))
        });

        Ok(scored
            .into_iter()
            .take(self.top_k)
            .map(|(score, doc)| PolicyCitation {
                source: doc.source.clone(),
                title: doc.title.clone(),
                content: doc.body.clone(),
                relevance: score,
            })
            .collect())
    }
}
