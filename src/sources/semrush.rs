//! SEMrush domain ranks.
//!
//! `domain_ranks` reports the SEMrush rank plus organic and paid keyword
//! figures. Organic traffic stands in for monthly visits.

use super::{fetch_json, json_f64, json_u64};
use crate::models::WebsiteMetrics;
use crate::resolver::{BoxError, Strategy};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument};

const EXPORT_COLUMNS: &str = "Db,Dn,Rk,Or,Ot,Oc,Ad,At,Ac";

pub struct SemRush {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl SemRush {
    pub fn new(client: Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

fn parse_ranks(domain: &str, data: &Value) -> Option<WebsiteMetrics> {
    let row = data.as_array()?.first()?;
    let mut metrics = WebsiteMetrics::new(domain, "SEMrush");
    metrics.global_rank = row.get("Rk").and_then(json_u64);
    metrics.monthly_visits = row.get("Ot").and_then(json_u64);
    for (column, name) in [
        ("Or", "Organic Keywords"),
        ("Ot", "Organic Traffic"),
        ("Ad", "AdWords Keywords"),
    ] {
        if let Some(value) = row.get(column).and_then(json_f64) {
            metrics.traffic_sources.insert(name.to_string(), value);
        }
    }
    Some(metrics)
}

#[async_trait]
impl Strategy<str, WebsiteMetrics> for SemRush {
    fn label(&self) -> &str {
        "SEMrush"
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
            ("key", api_key),
            ("type", "domain_ranks"),
            ("domain", domain),
            ("export_columns", EXPORT_COLUMNS),
            ("format", "json"),
        ]);
        let metrics = parse_ranks(domain, &fetch_json(request).await?);
        if let Some(m) = &metrics {
            info!(rank = m.global_rank, visits = m.monthly_visits, "SEMrush ranks received");
        }
        Ok(metrics)
    }
}
