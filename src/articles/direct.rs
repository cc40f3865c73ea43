//! Direct HTTP fetching of the site's listing pages.
//!
//! [`BrowserProfile`] sends the headers a desktop Chrome would, which is
//! enough to get past lighter bot checks. [`Basic`] uses the shared client
//! as-is over fewer sections and is the last resort before synthetic data.

use super::{ArticleQuery, PageSource, SECTIONS, scan_sections, section_urls};
use crate::config::Config;
use crate::models::ArticleData;
use crate::resolver::{BoxError, Strategy};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::instrument;

/// Sections tried by [`Basic`].
const BASIC_SECTIONS: usize = 4;

async fn get_page(client: &Client, url: &str) -> Result<String, BoxError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}").into());
    }
    Ok(response.text().await?)
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("it-IT,it;q=0.9,en;q=0.8"));
    headers
}

/// Plain GET with browser-like headers over all six sections.
pub struct BrowserProfile {
    client: Client,
    base_url: String,
    delay: Duration,
}

impl BrowserProfile {
    /// Builds a dedicated client with a cookie jar and browser headers.
    ///
    /// # Errors
    ///
    /// Fails only if reqwest cannot build the client (e.g. TLS backend init).
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.http.user_agent.clone())
            .default_headers(browser_headers())
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            base_url: config.site.base_url.clone(),
            delay: config.url_retry_delay(),
        })
    }
}

#[async_trait]
impl PageSource for BrowserProfile {
    async fn fetch_page(&self, url: &str) -> Result<String, BoxError> {
        get_page(&self.client, url).await
    }
}

#[async_trait]
impl Strategy<ArticleQuery, Vec<ArticleData>> for BrowserProfile {
    fn label(&self) -> &str {
        "Browser-profile HTTP"
    }

    #[instrument(level = "info", skip_all, fields(%query))]
    async fn attempt(&self, query: &ArticleQuery) -> Result<Option<Vec<ArticleData>>, BoxError> {
        let urls = section_urls(&self.base_url, SECTIONS.len());
        Ok(scan_sections(self, self.label(), query, &self.base_url, &urls, self.delay).await)
    }
}

/// Plain GET with the shared client over the first four sections.
pub struct Basic {
    client: Client,
    base_url: String,
    delay: Duration,
}

impl Basic {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.site.base_url.clone(),
            delay: config.url_retry_delay(),
        }
    }
}

#[async_trait]
impl PageSource for Basic {
    async fn fetch_page(&self, url: &str) -> Result<String, BoxError> {
        get_page(&self.client, url).await
    }
}

#[async_trait]
impl Strategy<ArticleQuery, Vec<ArticleData>> for Basic {
    fn label(&self) -> &str {
        "Basic HTTP"
    }

    #[instrument(level = "info", skip_all, fields(%query))]
    async fn attempt(&self, query: &ArticleQuery) -> Result<Option<Vec<ArticleData>>, BoxError> {
        let urls = section_urls(&self.base_url, BASIC_SECTIONS);
        Ok(scan_sections(self, self.label(), query, &self.base_url, &urls, self.delay).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use chrono::NaiveDate;
    use wiremock::matchers::{headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.site.base_url = server.uri();
        config.url_retry_delay_ms = 0;
        config
    }

    fn query() -> ArticleQuery {
        ArticleQuery::on(Period::Last7Days, 10, NaiveDate::from_ymd_opt(2025, 5, 6).unwrap())
    }

    const SPORT_PAGE: &str = r#"<html><body>
        <article><h3><a href="/sport/barcolana-2025">Barcolana, oltre duemila barche in regata</a></h3>
        <time datetime="2025-05-03">3 maggio</time></article>
    </body></html>"#;

    #[tokio::test]
    async fn test_browser_profile_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sport"))
            .and(headers("accept-language", vec!["it-IT", "it;q=0.9", "en;q=0.8"]))
            .respond_with(ResponseTemplate::new(200).set_body_string(SPORT_PAGE))
            .mount(&server)
            .await;

        let strategy = BrowserProfile::new(&config_for(&server)).unwrap();
        let articles = strategy.attempt(&query()).await.unwrap().unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].category, "Sport");
        assert_eq!(articles[0].publish_date, "2025-05-03");
    }

    #[tokio::test]
    async fn test_basic_only_scans_four_sections() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/politica"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SPORT_PAGE))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let strategy = Basic::new(&config, Client::new());
        assert!(strategy.attempt(&query()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bot_check_page_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body>JavaScript is not available. <a href=\"/x/y\">Abilita JavaScript per continuare</a></body></html>",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cronaca"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SPORT_PAGE))
            .mount(&server)
            .await;

        let strategy = Basic::new(&config_for(&server), Client::new());
        let articles = strategy.attempt(&query()).await.unwrap().unwrap();
        assert_eq!(articles[0].title, "Barcolana, oltre duemila barche in regata");
    }
}
