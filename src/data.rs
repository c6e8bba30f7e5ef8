//! Startup loading of the static data tables.
//!
//! Orders, classification rules and reply templates are plain JSON files;
//! policy documents are markdown files whose first `# ` line is the title.
//! Everything is validated here once; malformed data is a startup error,
//! not a per-turn surprise.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::classify::ClassificationRule;
use crate::error::DataError;
use crate::orders::Order;
use crate::policy::PolicyDoc;
use crate::templates::ReplyTemplate;

/// All tables the engine is constructed from.
#[derive(Debug)]
pub struct DataTables {
    pub orders: Vec<Order>,
    pub rules: Vec<ClassificationRule>,
    pub templates: Vec<ReplyTemplate>,
    pub policies: Vec<PolicyDoc>,
}

/// Load every table from `data_dir`.
pub fn load(data_dir: &Path) -> Result<DataTables, DataError> {
    let tables = DataTables {
        orders: load_json(&data_dir.join("orders.json"))?,
        rules: load_json(&data_dir.join("issues.json"))?,
        templates: load_json(&data_dir.join("replies.json"))?,
        policies: load_policies(&data_dir.join("policies"))?,
    };

    tracing::info!(
        orders = tables.orders.len(),
        rules = tables.rules.len(),
        templates = tables.templates.len(),
        policies = tables.policies.len(),
        "data tables loaded"
    );
    Ok(tables)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DataError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(DataError::Missing { path: display });
    }
    let raw = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| DataError::Parse {
        path: display,
        reason: e.to_string(),
    })
}

/// Read `*.md` policy documents. A missing directory is an empty knowledge
/// base, not an error; retrieval degrades to "no citations".
fn load_policies(dir: &Path) -> Result<Vec<PolicyDoc>, DataError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let display = dir.display().to_string();
    let mut docs = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|source| DataError::Io {
        path: display.clone(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| DataError::Io {
            path: display.clone(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let body = std::fs::read_to_string(&path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let source_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("policy.md")
            .to_string();
        let title = body
            .lines()
            .find_map(|line| line.strip_prefix("# "))
            .unwrap_or(&source_name)
            .trim()
            .to_string();

        docs.push(PolicyDoc {
            source: source_name,
            title,
            body,
        });
    }

    // Directory iteration order is platform-dependent; keep the index stable.
    docs.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(docs)
}
