//! BuiltWith technology profile.
//!
//! BuiltWith reports which technologies a site runs, not how much traffic it
//! gets. Records carry the technology names only.

use super::fetch_json;
use crate::models::WebsiteMetrics;
use crate::resolver::{BoxError, Strategy};
use async_trait::async_trait;
use itertools::Itertools;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument};

pub struct BuiltWith {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl BuiltWith {
    pub fn new(client: Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

/// Technology names from the first result, in first-seen order.
///
/// Names are read from `Result.Paths[].Technologies[].Name`; a flat
/// `Result[].Name` list is accepted too.
fn technologies(data: &Value) -> Option<Vec<String>> {
    let result = data.get("Results")?.as_array()?.first()?.get("Result")?;
    let nested = result
        .get("Paths")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|path| path.get("Technologies").and_then(Value::as_array))
        .flatten();
    let flat = result.as_array().into_iter().flatten();

    let names: Vec<String> = nested
        .chain(flat)
        .filter_map(|tech| tech.get("Name").and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unique()
        .map(str::to_string)
        .collect();
    Some(names)
}

#[async_trait]
impl Strategy<str, WebsiteMetrics> for BuiltWith {
    fn label(&self) -> &str {
        "BuiltWith"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(level = "info", skip_all, fields(%domain))]
    async fn attempt(&self, domain: &str) -> Result<Option<WebsiteMetrics>, BoxError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        let request = self.client.get(&self.base_url).query(&[
            ("KEY", api_key),
            ("LOOKUP", domain),
            ("HIDETEXT", "true"),
            ("HIDEDL", "true"),
        ]);
        let data = fetch_json(request).await?;
        let Some(names) = technologies(&data) else {
            return Ok(None);
        };
        info!(count = names.len(), "BuiltWith technologies detected");

        let mut metrics = WebsiteMetrics::new(domain, self.label());
        metrics.technologies = names;
        Ok(Some(metrics))
    }
}
