//! Google PageSpeed Insights.
//!
//! PageSpeed reports performance, not traffic. The Lighthouse score and Core
//! Web Vitals are kept in `traffic_sources` and the traffic figures come from
//! [`traffic_estimate`].

use super::{fetch_json, json_f64};
use crate::models::WebsiteMetrics;
use crate::resolver::{BoxError, Strategy};
use crate::synthetic::traffic_estimate;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, instrument};

pub const LABEL: &str = "PageSpeed (Real) + Traffic Estimate";

/// Lighthouse audits reported as seconds, with the key used in `traffic_sources`.
const TIMED_AUDITS: [(&str, &str); 3] = [
    ("first-contentful-paint", "First Contentful Paint"),
    ("largest-contentful-paint", "Largest Contentful Paint"),
    ("max-potential-fid", "Max Potential FID"),
];

pub struct PageSpeed {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl PageSpeed {
    pub fn new(client: Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

fn audit_value(lighthouse: &Value, audit: &str) -> f64 {
    lighthouse
        .pointer(&format!("/audits/{audit}/numericValue"))
        .and_then(json_f64)
        .unwrap_or(0.0)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Build the record from a PageSpeed response. `None` without a Lighthouse result.
fn parse_report(domain: &str, data: &Value) -> Option<WebsiteMetrics> {
    let lighthouse = data.get("lighthouseResult")?;
    let score = lighthouse
        .pointer("/categories/performance/score")
        .and_then(json_f64)
        .map(|s| (s * 100.0).round())
        .unwrap_or(0.0);

    let mut metrics = traffic_estimate(domain);
    metrics.data_source = LABEL.to_string();
    metrics.traffic_sources.insert("Performance Score".to_string(), score);
    for (audit, key) in TIMED_AUDITS {
        let seconds = audit_value(lighthouse, audit) / 1000.0;
        metrics.traffic_sources.insert(key.to_string(), round_to(seconds, 1));
    }
    metrics.traffic_sources.insert(
        "Cumulative Layout Shift".to_string(),
        round_to(audit_value(lighthouse, "cumulative-layout-shift"), 3),
    );
    Some(metrics)
}

#[async_trait]
impl Strategy<str, WebsiteMetrics> for PageSpeed {
    fn label(&self) -> &str {
        "PageSpeed"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(level = "info", skip_all, fields(%domain))]
    async fn attempt(&self, domain: &str) -> Result<Option<WebsiteMetrics>, BoxError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        let url = format!("https://{domain}");
        let request = self.client.get(&self.base_url).query(&[
            ("url", url.as_str()),
            ("key", api_key),
            ("strategy", "mobile"),
        ]);
        let data = fetch_json(request).await?;
        let metrics = parse_report(domain, &data);
        match &metrics {
            Some(m) => info!(
                score = m.traffic_sources.get("Performance Score"),
                lcp = m.traffic_sources.get("Largest Contentful Paint"),
                "PageSpeed report received"
            ),
            None => info!("PageSpeed returned no Lighthouse result"),
        }
        Ok(metrics)
    }
}
