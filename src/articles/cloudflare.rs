//! Cloudflare APIs: Browser Rendering for listing pages and zone insights.
//!
//! The news site sits behind Cloudflare's bot protection, so a plain GET often
//! returns an interstitial. The Browser Rendering API runs a real browser on
//! Cloudflare's side and hands back the rendered HTML.

use super::{ArticleQuery, CredentialsRejected, PageSource, SECTIONS, scan_sections, section_urls};
use crate::config::Config;
use crate::models::ArticleData;
use crate::resolver::{BoxError, Strategy};
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Browser Rendering strategy for the article engine.
pub struct BrowserRendering {
    client: Client,
    api_token: Option<String>,
    account_id: Option<String>,
    api_base_url: String,
    site_base_url: String,
    timeout: Duration,
    delay: Duration,
}

impl BrowserRendering {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_token: config.cloudflare.api_token.clone(),
            account_id: config.cloudflare.account_id.clone(),
            api_base_url: config.cloudflare.api_base_url.trim_end_matches('/').to_string(),
            site_base_url: config.site.base_url.clone(),
            timeout: config.rendering_timeout(),
            delay: config.url_retry_delay(),
        }
    }

    fn endpoint(&self, account_id: &str) -> String {
        format!("{}/accounts/{account_id}/browser-rendering/content", self.api_base_url)
    }
}

/// Rendered HTML from a Browser Rendering response.
///
/// `result` is either the HTML itself or an object with a `content` field.
fn rendered_content(data: &Value) -> Option<&str> {
    if !data.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    let html = match data.get("result")? {
        Value::String(html) => Some(html.as_str()),
        other => other.get("content").and_then(Value::as_str),
    };
    html.filter(|html| !html.is_empty())
}

#[async_trait]
impl PageSource for BrowserRendering {
    async fn fetch_page(&self, url: &str) -> Result<String, BoxError> {
        let (Some(token), Some(account_id)) = (self.api_token.as_deref(), self.account_id.as_deref()) else {
            return Err("Cloudflare credentials missing".into());
        };
        let payload = json!({
            "url": url,
            "wait_for": "networkidle",
            "timeout": 30000,
            "viewport": {"width": 1920, "height": 1080}
        });
        let response = self
            .client
            .post(self.endpoint(account_id))
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::FORBIDDEN => {
                warn!("Cloudflare returned 403; check that this IP is authorised for the API token");
                return Err(CredentialsRejected(status).into());
            }
            StatusCode::UNAUTHORIZED => {
                warn!("Cloudflare returned 401; check that the API token is valid");
                return Err(CredentialsRejected(status).into());
            }
            _ => {}
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {status}: {}", truncate_for_log(&body, 200)).into());
        }

        let data: Value = response.json().await?;
        match rendered_content(&data) {
            Some(html) => Ok(html.to_string()),
            None => {
                let errors = data.get("errors").map(Value::to_string).unwrap_or_default();
                Err(format!("rendering failed: {}", truncate_for_log(&errors, 200)).into())
            }
        }
    }
}

#[async_trait]
impl Strategy<ArticleQuery, Vec<ArticleData>> for BrowserRendering {
    fn label(&self) -> &str {
        "Cloudflare Browser Rendering"
    }

    fn is_configured(&self) -> bool {
        self.api_token.is_some() && self.account_id.is_some()
    }

    #[instrument(level = "info", skip_all, fields(%query))]
    async fn attempt(&self, query: &ArticleQuery) -> Result<Option<Vec<ArticleData>>, BoxError> {
        let urls = section_urls(&self.site_base_url, SECTIONS.len());
        Ok(scan_sections(self, self.label(), query, &self.site_base_url, &urls, self.delay).await)
    }
}

/// What Cloudflare knows about the site's zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInsights {
    pub zone_name: String,
    pub zone_status: String,
    pub zone_plan: String,
    /// When the insights were fetched, RFC 3339.
    pub last_updated: String,
    pub cloudflare_connected: bool,
}

impl ZoneInsights {
    /// The insights reported when the zone could not be reached.
    pub fn disconnected(zone_name: &str) -> Self {
        Self {
            zone_name: zone_name.to_string(),
            zone_status: "unknown".to_string(),
            zone_plan: "unknown".to_string(),
            last_updated: Utc::now().to_rfc3339(),
            cloudflare_connected: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ZoneEnvelope {
    #[serde(default)]
    success: bool,
    result: Option<Zone>,
}

#[derive(Debug, Deserialize)]
struct Zone {
    name: Option<String>,
    status: Option<String>,
    plan: Option<ZonePlan>,
}

#[derive(Debug, Deserialize)]
struct ZonePlan {
    name: Option<String>,
}

async fn fetch_zone(config: &Config, client: &Client) -> Result<Zone, BoxError> {
    let (Some(token), Some(zone_id)) = (
        config.cloudflare.api_token.as_deref(),
        config.cloudflare.zone_id.as_deref(),
    ) else {
        return Err("Cloudflare API token or zone id not configured".into());
    };
    let url = format!("{}/zones/{zone_id}", config.cloudflare.api_base_url.trim_end_matches('/'));
    let response = client.get(url).bearer_auth(token).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}").into());
    }
    let envelope: ZoneEnvelope = response.json().await?;
    match envelope.result {
        Some(zone) if envelope.success => Ok(zone),
        _ => Err("zone lookup unsuccessful".into()),
    }
}

/// Zone name, status, and plan for the configured zone.
///
/// Never fails: any problem yields [`ZoneInsights::disconnected`].
#[instrument(level = "info", skip_all)]
pub async fn zone_insights(config: &Config, client: &Client) -> ZoneInsights {
    let fallback_name = url::Url::parse(&config.site.base_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default();

    match fetch_zone(config, client).await {
        Ok(zone) => {
            let insights = ZoneInsights {
                zone_name: zone.name.unwrap_or(fallback_name),
                zone_status: zone.status.unwrap_or_else(|| "unknown".to_string()),
                zone_plan: zone
                    .plan
                    .and_then(|p| p.name)
                    .unwrap_or_else(|| "unknown".to_string()),
                last_updated: Utc::now().to_rfc3339(),
                cloudflare_connected: true,
            };
            info!(zone = %insights.zone_name, status = %insights.zone_status, "Cloudflare zone reachable");
            insights
        }
        Err(e) => {
            warn!(error = %e, "Cloudflare zone lookup failed");
            ZoneInsights::disconnected(&fallback_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use chrono::NaiveDate;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.cloudflare.api_token = Some("token".to_string());
        config.cloudflare.account_id = Some("acc".to_string());
        config.cloudflare.zone_id = Some("zone1".to_string());
        config.cloudflare.api_base_url = server.uri();
        config.site.base_url = "https://www.triesteallnews.it".to_string();
        config.url_retry_delay_ms = 0;
        config
    }

    #[test]
    fn test_rendered_content_shapes() {
        assert_eq!(rendered_content(&json!({"success": true, "result": "<html/>"})), Some("<html/>"));
        assert_eq!(
            rendered_content(&json!({"success": true, "result": {"content": "<p/>"}})),
            Some("<p/>")
        );
        assert_eq!(rendered_content(&json!({"success": false, "result": "<html/>"})), None);
        assert_eq!(rendered_content(&json!({"success": true, "result": ""})), None);
    }

    #[test]
    fn test_unconfigured_without_account() {
        let mut config = Config::default();
        config.cloudflare.api_token = Some("token".to_string());
        let strategy = BrowserRendering::new(&config, Client::new());
        assert!(!strategy.is_configured());
    }

    #[tokio::test]
    async fn test_attempt_renders_home_page() {
        let server = MockServer::start().await;
        let html = r#"<html><body><article><a href="/cronaca/mercato-ponterosso">Mercato di Ponterosso, novità e orari</a><span class="date">2025-05-06</span></article></body></html>"#;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/browser-rendering/content"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "result": html})))
            .mount(&server)
            .await;

        let strategy = BrowserRendering::new(&config_for(&server), Client::new());
        let query = ArticleQuery::on(Period::Daily, 10, NaiveDate::from_ymd_opt(2025, 5, 6).unwrap());
        let articles = strategy.attempt(&query).await.unwrap().unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://www.triesteallnews.it/cronaca/mercato-ponterosso");
    }

    #[tokio::test]
    async fn test_attempt_forbidden_stops_after_first_section() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let strategy = BrowserRendering::new(&config_for(&server), Client::new());
        let query = ArticleQuery::on(Period::Daily, 10, NaiveDate::from_ymd_opt(2025, 5, 6).unwrap());
        assert!(strategy.attempt(&query).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_attempt_server_errors_try_every_section() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .expect(SECTIONS.len() as u64)
            .mount(&server)
            .await;

        let strategy = BrowserRendering::new(&config_for(&server), Client::new());
        let query = ArticleQuery::on(Period::Daily, 10, NaiveDate::from_ymd_opt(2025, 5, 6).unwrap());
        assert!(strategy.attempt(&query).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zone_insights_connected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones/zone1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "result": {"name": "triesteallnews.it", "status": "active", "plan": {"name": "Free Website"}}
            })))
            .mount(&server)
            .await;

        let insights = zone_insights(&config_for(&server), &Client::new()).await;
        assert!(insights.cloudflare_connected);
        assert_eq!(insights.zone_status, "active");
        assert_eq!(insights.zone_plan, "Free Website");
    }

    #[tokio::test]
    async fn test_zone_insights_disconnected_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let insights = zone_insights(&config_for(&server), &Client::new()).await;
        assert!(!insights.cloudflare_connected);
        assert_eq!(insights.zone_name, "triesteallnews.it");
        assert_eq!(insights.zone_plan, "unknown");

        let unconfigured = zone_insights(&Config::default(), &Client::new()).await;
        assert!(!unconfigured.cloudflare_connected);
    }
}
