//! SimilarWeb website API.
//!
//! The API has moved its traffic endpoint around over time, so four variants
//! are tried in order and the first `200` response carrying traffic is used.

use super::{fetch_json, json_f64, json_u64};
use crate::models::WebsiteMetrics;
use crate::resolver::{BoxError, Strategy};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

const ENDPOINTS: [&str; 4] = [
    "total-traffic-and-engagement/visits",
    "traffic-and-engagement/visits",
    "visits",
    "overview",
];

pub struct SimilarWeb {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl SimilarWeb {
    /// Source sending `api_key` in the `api-key` header. Without a key the
    /// resolver skips it.
    pub fn new(client: Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

/// `visits` is either a number or a list of `{"visits": n}` periods.
fn visits(data: &Value) -> Option<u64> {
    match data.get("visits")? {
        Value::Array(periods) => periods.first()?.get("visits").and_then(json_u64),
        other => json_u64(other),
    }
}

fn parse_traffic(domain: &str, data: &Value) -> WebsiteMetrics {
    let mut metrics = WebsiteMetrics::new(domain, "SimilarWeb");
    metrics.monthly_visits = visits(data);
    metrics.bounce_rate = data.get("bounce_rate").and_then(json_f64);
    metrics.avg_visit_duration = data.get("avg_visit_duration").and_then(json_f64);
    metrics.pages_per_visit = data.get("pages_per_visit").and_then(json_f64);
    metrics.global_rank = data.get("global_rank").and_then(json_u64);
    metrics.country_rank = data.get("country_rank").and_then(json_u64);
    metrics
}

#[async_trait]
impl Strategy<str, WebsiteMetrics> for SimilarWeb {
    fn label(&self) -> &str {
        "SimilarWeb"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(level = "info", skip_all, fields(%domain))]
    async fn attempt(&self, domain: &str) -> Result<Option<WebsiteMetrics>, BoxError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        for endpoint in ENDPOINTS {
            let url = format!("{}/{domain}/{endpoint}", self.base_url.trim_end_matches('/'));
            debug!(%url, "Trying SimilarWeb endpoint");
            match fetch_json(self.client.get(&url).header("api-key", api_key)).await {
                Ok(data) => {
                    let metrics = parse_traffic(domain, &data);
                    if !metrics.has_traffic() {
                        info!(endpoint, "SimilarWeb response had no visits or rank; trying next endpoint");
                        continue;
                    }
                    info!(
                        endpoint,
                        visits = metrics.monthly_visits,
                        rank = metrics.global_rank,
                        "SimilarWeb data received"
                    );
                    return Ok(Some(metrics));
                }
                Err(e) => warn!(error = %e, endpoint, "SimilarWeb endpoint failed"),
            }
        }
        Ok(None)
    }
}
