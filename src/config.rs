use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeConfig {
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    #[serde(default = "default_max_breeds")]
    pub max_breeds: usize,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_scrape_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_source_label")]
    pub source_label: String,
    #[serde(default = "default_link_patterns")]
    pub link_patterns: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            max_breeds: default_max_breeds(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_scrape_timeout_secs(),
            user_agent: default_user_agent(),
            source_label: default_source_label(),
            link_patterns: default_link_patterns(),
        }
    }
}

fn default_listing_url() -> String {
    "https://www.royalkennelclub.com/search/breeds-a-to-z".to_string()
}
fn default_max_breeds() -> usize {
    30
}
fn default_delay_ms() -> u64 {
    2000
}
fn default_scrape_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}
fn default_source_label() -> String {
    "Royal Kennel Club".to_string()
}
fn default_link_patterns() -> Vec<String> {
    vec![
        "/breed/".to_string(),
        "/breeds/".to_string(),
        "/dog-breeds/".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("dog_breeds_rkc.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_assistant_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_assistant_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_assistant_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}

impl AssistantConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Load and validate the configuration file.
///
/// A missing file is not an error: every field has a default, so the
/// scraper runs with no arguments and no config. A file that exists but
/// cannot be read or parsed is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.scrape.max_breeds == 0 {
        anyhow::bail!("scrape.max_breeds must be >= 1");
    }

    if config.scrape.timeout_secs == 0 {
        anyhow::bail!("scrape.timeout_secs must be >= 1");
    }

    if config.scrape.link_patterns.iter().all(|p| p.trim().is_empty()) {
        anyhow::bail!("scrape.link_patterns must contain at least one non-empty pattern");
    }

    url::Url::parse(&config.scrape.listing_url).with_context(|| {
        format!(
            "scrape.listing_url is not a valid URL: {}",
            config.scrape.listing_url
        )
    })?;

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    match config.assistant.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown assistant provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.scrape.max_breeds, 30);
        assert_eq!(cfg.scrape.delay_ms, 2000);
        assert_eq!(cfg.scrape.timeout_secs, 10);
        assert_eq!(cfg.store.path, PathBuf::from("dog_breeds_rkc.json"));
        assert_eq!(cfg.scrape.link_patterns.len(), 3);
        assert!(cfg.assistant.is_enabled());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scout.toml");
        std::fs::write(&path, "[scrape]\nmax_breeds = 5\n\n[assistant]\nprovider = \"disabled\"\n")
            .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.scrape.max_breeds, 5);
        assert_eq!(cfg.scrape.source_label, "Royal Kennel Club");
        assert_eq!(cfg.retrieval.top_k, 3);
        assert!(!cfg.assistant.is_enabled());
    }

    #[test]
    fn rejects_zero_max_breeds() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scout.toml");
        std::fs::write(&path, "[scrape]\nmax_breeds = 0\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("max_breeds"));
    }

    #[test]
    fn rejects_unknown_provider() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scout.toml");
        std::fs::write(&path, "[assistant]\nprovider = \"carrier-pigeon\"\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn rejects_bad_listing_url() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scout.toml");
        std::fs::write(&path, "[scrape]\nlisting_url = \"not a url\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scout.toml");
        std::fs::write(&path, "[scrape\nmax_breeds = ").unwrap();
        assert!(load_config(&path).is_err());
    }
}
