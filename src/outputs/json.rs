//! JSON export of comparisons and article lists.
//!
//! A comparison is written as
//! ```text
//! {
//!   "comparison_date": "2025-05-06T09:30:00",
//!   "tool": "MediaImmagine Web Ranking Tool",
//!   "domains": { "triesteallnews.it": [ { ...metrics... } ] }
//! }
//! ```
//! with domains kept in the order they were compared.

use super::write_text;
use crate::models::{ArticleData, Comparison};
use crate::resolver::BoxError;
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, instrument};

const TOOL: &str = "MediaImmagine Web Ranking Tool";

#[derive(Serialize)]
struct ComparisonDocument {
    comparison_date: String,
    tool: &'static str,
    domains: Map<String, Value>,
}

/// `{domain: [metrics]}` in comparison order.
pub fn domains_map(comparison: &Comparison) -> Result<Map<String, Value>, serde_json::Error> {
    let mut domains = Map::new();
    for (domain, records) in comparison {
        domains.insert(domain.clone(), serde_json::to_value(records)?);
    }
    Ok(domains)
}

/// Serialise `comparison` into the export document.
pub fn comparison_to_json(comparison: &Comparison, generated_at: NaiveDateTime) -> Result<String, BoxError> {
    let document = ComparisonDocument {
        comparison_date: generated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        tool: TOOL,
        domains: domains_map(comparison)?,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_comparison_json(
    comparison: &Comparison,
    generated_at: NaiveDateTime,
    path: &Path,
) -> Result<(), BoxError> {
    let json = comparison_to_json(comparison, generated_at)?;
    write_text(path, json).await?;
    info!(domains = comparison.len(), "Wrote comparison JSON");
    Ok(())
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_articles_json(articles: &[ArticleData], path: &Path) -> Result<(), BoxError> {
    let json = serde_json::to_string_pretty(articles)?;
    write_text(path, json).await?;
    info!(count = articles.len(), "Wrote articles JSON");
    Ok(())
}
