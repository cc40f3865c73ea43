//! Application configuration.
//!
//! Configuration is read once at startup from a YAML file and passed to the
//! engines explicitly. Every field has a default, so a missing file is a
//! valid (keyless) configuration. Secrets can also come from the environment
//! (optionally via a `.env` file), which takes precedence over the file.
//!
//! ```yaml
//! api_keys:
//!   seozoom: AK-...
//!   pagespeed: AIza...
//! cloudflare:
//!   api_token: ...
//!   account_id: ...
//! use_mock_data: false
//! web:
//!   port: 5000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors raised while loading or rewriting the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unknown provider '{0}' (expected one of: {providers})", providers = PROVIDERS.join(", "))]
    UnknownProvider(String),
}

/// Providers whose key can be set with [`set_api_key`].
pub const PROVIDERS: &[&str] = &[
    "seozoom",
    "pagespeed",
    "builtwith",
    "wappalyzer",
    "similarweb",
    "semrush",
    "cloudflare_token",
    "cloudflare_account",
];

/// API keys for the metric providers. `None` means the source is skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub seozoom: Option<String>,
    pub pagespeed: Option<String>,
    pub builtwith: Option<String>,
    pub wappalyzer: Option<String>,
    pub similarweb: Option<String>,
    pub semrush: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareConfig {
    pub api_token: Option<String>,
    pub account_id: Option<String>,
    /// Zone of the news site, used for zone insights.
    pub zone_id: Option<String>,
    pub api_base_url: String,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            account_id: None,
            zone_id: None,
            api_base_url: "https://api.cloudflare.com/client/v4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseUrls {
    pub seozoom: String,
    pub pagespeed: String,
    pub builtwith: String,
    pub wappalyzer: String,
    pub similarweb: String,
    pub semrush: String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            seozoom: "https://apiv2.seozoom.com/api/v2".to_string(),
            pagespeed: "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string(),
            builtwith: "https://api.builtwith.com/v20/api.json".to_string(),
            wappalyzer: "https://api.wappalyzer.com/v2/lookup".to_string(),
            similarweb: "https://api.similarweb.com/v1/website".to_string(),
            semrush: "https://api.semrush.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root of the news site whose articles are analysed.
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.triesteallnews.it".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Browser rendering is slow; it gets its own, longer timeout.
    pub rendering_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            rendering_timeout_secs: 45,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_keys: ApiKeys,
    pub cloudflare: CloudflareConfig,
    pub base_urls: BaseUrls,
    pub site: SiteConfig,
    pub http: HttpConfig,
    /// Pause between domains in a comparison run.
    pub rate_limit_delay_ms: u64,
    /// Pause between candidate URLs inside one strategy.
    pub url_retry_delay_ms: u64,
    /// Skip every network source and use synthetic data directly.
    pub use_mock_data: bool,
    /// Random variation applied to synthetic data when `use_mock_data` is set.
    pub mock_data_variation: f64,
    pub web: WebConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_keys: ApiKeys::default(),
            cloudflare: CloudflareConfig::default(),
            base_urls: BaseUrls::default(),
            site: SiteConfig::default(),
            http: HttpConfig::default(),
            rate_limit_delay_ms: 500,
            url_retry_delay_ms: 2000,
            use_mock_data: false,
            mock_data_variation: 0.0,
            web: WebConfig::default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load the file at `path`, or the defaults when it does not exist.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Config file not found; using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a YAML document. An empty document is the default config.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Apply secrets from the process environment on top of the file values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up through `lookup` (an env-like source).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let apply = |slot: &mut Option<String>, var: &str| {
            if let Some(value) = non_empty(lookup(var)) {
                debug!(var, "Using key from environment");
                *slot = Some(value);
            }
        };
        apply(&mut self.api_keys.seozoom, "SEOZOOM_API_KEY");
        apply(&mut self.api_keys.pagespeed, "PAGESPEED_API_KEY");
        apply(&mut self.api_keys.builtwith, "BUILTWITH_API_KEY");
        apply(&mut self.api_keys.wappalyzer, "WAPPALYZER_API_KEY");
        apply(&mut self.api_keys.similarweb, "SIMILARWEB_API_KEY");
        apply(&mut self.api_keys.semrush, "SEMRUSH_API_KEY");
        apply(&mut self.cloudflare.api_token, "CLOUDFLARE_API_TOKEN");
        apply(&mut self.cloudflare.account_id, "CLOUDFLARE_ACCOUNT_ID");
        apply(&mut self.cloudflare.zone_id, "CLOUDFLARE_ZONE_ID");
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn rendering_timeout(&self) -> Duration {
        Duration::from_secs(self.http.rendering_timeout_secs)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn url_retry_delay(&self) -> Duration {
        Duration::from_millis(self.url_retry_delay_ms)
    }

    /// Names of the providers that have a key configured.
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let keys = &self.api_keys;
        [
            ("seozoom", &keys.seozoom),
            ("pagespeed", &keys.pagespeed),
            ("builtwith", &keys.builtwith),
            ("wappalyzer", &keys.wappalyzer),
            ("similarweb", &keys.similarweb),
            ("semrush", &keys.semrush),
        ]
        .into_iter()
        .filter(|(_, key)| key.is_some())
        .map(|(name, _)| name)
        .collect()
    }

    fn key_slot(&mut self, provider: &str) -> Result<&mut Option<String>, ConfigError> {
        let slot = match provider.to_ascii_lowercase().as_str() {
            "seozoom" => &mut self.api_keys.seozoom,
            "pagespeed" => &mut self.api_keys.pagespeed,
            "builtwith" => &mut self.api_keys.builtwith,
            "wappalyzer" => &mut self.api_keys.wappalyzer,
            "similarweb" => &mut self.api_keys.similarweb,
            "semrush" => &mut self.api_keys.semrush,
            "cloudflare_token" => &mut self.cloudflare.api_token,
            "cloudflare_account" => &mut self.cloudflare.account_id,
            _ => return Err(ConfigError::UnknownProvider(provider.to_string())),
        };
        Ok(slot)
    }

    /// Serialize and write to `path` atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let yaml = serde_yaml::to_string(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, yaml).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

/// Set `provider`'s key in the config file at `path` and write it back.
///
/// The file is created when missing. Environment overrides are not applied,
/// so keys coming from the environment are never written to disk.
#[instrument(level = "info", skip(path, key), fields(path = %path.display()))]
pub fn set_api_key(path: &Path, provider: &str, key: &str) -> Result<Config, ConfigError> {
    let mut config = Config::load(path)?;
    *config.key_slot(provider)? = non_empty(Some(key.trim().to_string()));
    config.save(path)?;
    info!(provider, key = %masked(key), "API key saved");
    Ok(config)
}

/// First ten characters of a secret followed by `...`, for display.
pub fn masked(key: &str) -> String {
    let prefix: String = key.chars().take(10).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.site.base_url, "https://www.triesteallnews.it");
        assert_eq!(config.web.port, 5000);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(!config.use_mock_data);
        assert!(config.configured_providers().is_empty());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml("   \n").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
api_keys:
  seozoom: AK-123
use_mock_data: true
web:
  port: 8080
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.api_keys.seozoom.as_deref(), Some("AK-123"));
        assert!(config.use_mock_data);
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.configured_providers(), vec!["seozoom"]);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("web_ranking.yaml");
        std::fs::write(&path, "api_keys: [not, a, map").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides_take_precedence_and_ignore_blank() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PAGESPEED_API_KEY", "AIza-env"),
            ("SEOZOOM_API_KEY", "  "),
            ("CLOUDFLARE_ACCOUNT_ID", "acct"),
        ]);
        let mut config = Config::default();
        config.api_keys.seozoom = Some("from-file".to_string());
        let config = config.with_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_keys.pagespeed.as_deref(), Some("AIza-env"));
        assert_eq!(config.api_keys.seozoom.as_deref(), Some("from-file"));
        assert_eq!(config.cloudflare.account_id.as_deref(), Some("acct"));
    }

    #[test]
    fn test_set_api_key_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("web_ranking.yaml");

        set_api_key(&path, "BuiltWith", "bw-secret").unwrap();
        set_api_key(&path, "seozoom", "AK-42").unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.api_keys.builtwith.as_deref(), Some("bw-secret"));
        assert_eq!(reloaded.api_keys.seozoom.as_deref(), Some("AK-42"));
        assert!(!dir.path().join("conf").join("web_ranking.yaml.tmp").exists());
    }

    #[test]
    fn test_set_api_key_unknown_provider() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("web_ranking.yaml");
        let err = set_api_key(&path, "alexa", "x").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProvider(ref p) if p == "alexa"));
        assert!(!path.exists());
    }

    #[test]
    fn test_masked() {
        assert_eq!(masked("AK-c8713689b856896216"), "AK-c871368...");
        assert_eq!(masked("abc"), "abc...");
    }
}
