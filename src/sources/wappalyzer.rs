//! Wappalyzer technology lookup.

use super::fetch_json;
use crate::models::WebsiteMetrics;
use crate::resolver::{BoxError, Strategy};
use async_trait::async_trait;
use itertools::Itertools;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{info, instrument};

pub struct Wappalyzer {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl Wappalyzer {
    pub fn new(client: Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

/// Application names from either `{"applications": [..]}` or the v2 shape
/// `[{"url": .., "technologies": [..]}]`.
fn applications(data: &Value) -> Vec<String> {
    let listed = data
        .get("applications")
        .and_then(Value::as_array)
        .into_iter()
        .flatten();
    let per_url = data
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.get("technologies").and_then(Value::as_array))
        .flatten();

    listed
        .chain(per_url)
        .filter_map(|app| app.get("name").and_then(Value::as_str))
        .unique()
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Strategy<str, WebsiteMetrics> for Wappalyzer {
    fn label(&self) -> &str {
        "Wappalyzer"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(level = "info", skip_all, fields(%domain))]
    async fn attempt(&self, domain: &str) -> Result<Option<WebsiteMetrics>, BoxError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        let request = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&json!({ "url": format!("https://{domain}") }));
        let names = applications(&fetch_json(request).await?);
        if names.is_empty() {
            return Ok(None);
        }
        info!(count = names.len(), "Wappalyzer applications detected");

        let mut metrics = WebsiteMetrics::new(domain, self.label());
        metrics.technologies = names;
        Ok(Some(metrics))
    }
}
