use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::telemetry::page::{default_sections, SectionDef};

pub const CONFIG_ENV: &str = "PLANETY_CONFIG";
pub const ENDPOINT_ENV: &str = "PLANETY_COLLECT_ENDPOINT";
const LOCAL_CONFIG: &str = "./planety.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetyConfig {
    pub telemetry: TelemetryConfig,
    pub audit: AuditConfig,
    /// Where preferences persist. In-memory when unset.
    pub storage_path: Option<PathBuf>,
}

impl PlanetyConfig {
    /// The audited site's host: `audit.site_host`, else the host of
    /// `telemetry.page_url`.
    pub fn site_host(&self) -> Option<String> {
        self.audit.site_host.clone().or_else(|| {
            let url = Url::parse(&self.telemetry.page_url).ok()?;
            url.host_str().map(str::to_string)
        })
    }

    fn resolve_site_host(mut self) -> Self {
        self.audit.site_host = self.site_host();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub page_url: String,
    pub referrer: String,
    pub user_agent: String,
    /// Absolute URL of the collection endpoint. No HTTP delivery when unset.
    pub collect_endpoint: Option<String>,
    pub request_timeout_ms: u64,
    pub scroll_thresholds: Vec<u32>,
    pub dwell_thresholds_secs: Vec<u64>,
    pub dwell_poll_secs: u64,
    pub sections: Vec<SectionDef>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            page_url: "http://localhost/".to_string(),
            referrer: String::new(),
            user_agent: format!("planety/{}", env!("CARGO_PKG_VERSION")),
            collect_endpoint: None,
            request_timeout_ms: 2_000,
            scroll_thresholds: vec![25, 50, 75, 90, 100],
            dwell_thresholds_secs: vec![30, 60, 120, 300],
            dwell_poll_secs: 5,
            sections: default_sections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Host the audited page is served from; absolute links elsewhere are
    /// external. Loading fills it from `telemetry.page_url` when unset.
    pub site_host: Option<String>,
    pub misspellings: BTreeMap<String, String>,
    /// Lowercase term -> canonical spelling mid-sentence.
    pub brand_terms: BTreeMap<String, String>,
    pub legal_terms: Vec<String>,
    pub action_words: Vec<String>,
    pub vague_link_text: Vec<String>,
    pub cta_max_len: usize,
    pub title_len: (usize, usize),
    pub description_len: (usize, usize),
}

impl Default for AuditConfig {
    fn default() -> Self {
        let pairs = |items: &[(&str, &str)]| -> BTreeMap<String, String> {
            items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };
        let list =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };

        Self {
            site_host: None,
            misspellings: pairs(&[
                ("freindship", "friendship"),
                ("freinds", "friends"),
                ("seperate", "separate"),
                ("occured", "occurred"),
                ("recieve", "receive"),
                ("definately", "definitely"),
                ("accomodate", "accommodate"),
                ("embarass", "embarrass"),
                ("maintainance", "maintenance"),
                ("occassion", "occasion"),
            ]),
            brand_terms: pairs(&[
                ("planety", "Planety"),
                ("cosmic", "cosmic"),
                ("galaxy", "galaxy"),
                ("friendship", "friendship"),
            ]),
            legal_terms: list(&[
                "privacy",
                "data protection",
                "secure",
                "encrypted",
                "your data belongs to you",
            ]),
            action_words: list(&[
                "try", "start", "get", "join", "explore", "discover", "continue", "learn",
            ]),
            vague_link_text: list(&["click here", "read more", "learn more", "here", "this"]),
            cta_max_len: 25,
            title_len: (30, 60),
            description_len: (120, 160),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolution order:
    /// 1. explicit path
    /// 2. $PLANETY_CONFIG
    /// 3. ./planety.json
    /// 4. defaults
    ///
    /// $PLANETY_COLLECT_ENDPOINT overrides the endpoint in every case.
    pub fn load(explicit: Option<&Path>) -> Result<PlanetyConfig, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let local = PathBuf::from(LOCAL_CONFIG);

        let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from(&path)?,
            None if local.exists() => Self::load_from(&local)?,
            None => PlanetyConfig::default().resolve_site_host(),
        };

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                config.telemetry.collect_endpoint = Some(endpoint);
            }
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<PlanetyConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PlanetyConfig = serde_json::from_str(&content)?;
        Ok(config.resolve_site_host())
    }
}
