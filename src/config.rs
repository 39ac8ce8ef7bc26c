use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const MAX_LOOKBACK_DAYS: i64 = 365 * 100;

// Settings for the upstream market-data client
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub cookie_url: String,
    pub random_agent: bool,
    pub request_timeout: Option<Duration>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            random_agent: false,
            request_timeout: None,
        }
    }
}

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug)]
pub struct ConfigYaml {
    pub node_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub provider_base_url: Option<String>,
    pub provider_cookie_url: Option<String>,
    pub random_agent: Option<bool>,
    pub request_timeout_secs: Option<u64>,
    pub default_lookback_days: Option<i64>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub provider: ProviderConfig,
    pub default_lookback_days: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_name: "stockview".to_string(),
            environment: "development".to_string(),
            port: 8501,
            provider: ProviderConfig::default(),
            default_lookback_days: 365,
        }
    }
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml(file_path: &str) -> anyhow::Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> anyhow::Result<Self> {
        let yaml_config: ConfigYaml =
            serde_yaml::from_str(yaml_content).context("Failed to parse YAML config")?;
        let defaults = Self::default();

        Self {
            node_name: yaml_config.node_name.unwrap_or(defaults.node_name),
            environment: yaml_config.environment.unwrap_or(defaults.environment),
            port: yaml_config.port.unwrap_or(defaults.port),
            provider: ProviderConfig {
                base_url: yaml_config.provider_base_url.unwrap_or(defaults.provider.base_url),
                cookie_url: yaml_config.provider_cookie_url.unwrap_or(defaults.provider.cookie_url),
                random_agent: yaml_config.random_agent.unwrap_or(defaults.provider.random_agent),
                request_timeout: yaml_config.request_timeout_secs.map(Duration::from_secs),
            },
            default_lookback_days: yaml_config
                .default_lookback_days
                .unwrap_or(defaults.default_lookback_days),
        }
        .validated()
    }

    // Load all configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        let defaults = Self::default();

        Self {
            node_name: env::var("NODE_NAME").unwrap_or(defaults.node_name),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            provider: ProviderConfig {
                base_url: env::var("PROVIDER_BASE_URL").unwrap_or(defaults.provider.base_url),
                cookie_url: env::var("PROVIDER_COOKIE_URL").unwrap_or(defaults.provider.cookie_url),
                random_agent: parse_var("RANDOM_AGENT")?.unwrap_or(defaults.provider.random_agent),
                request_timeout: parse_var::<u64>("REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs),
            },
            default_lookback_days: parse_var("DEFAULT_LOOKBACK_DAYS")?
                .unwrap_or(defaults.default_lookback_days),
        }
        .validated()
    }

    fn validated(self) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (0..=MAX_LOOKBACK_DAYS).contains(&self.default_lookback_days),
            "default_lookback_days must be between 0 and {}, got {}",
            MAX_LOOKBACK_DAYS,
            self.default_lookback_days
        );
        Ok(self)
    }
}

fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let config = AppConfig::from_yaml_str("port: 9000\nrandom_agent: true\n").unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.provider.random_agent);
        assert_eq!(config.node_name, "stockview");
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.request_timeout, None);
        assert_eq!(config.default_lookback_days, 365);
    }

    #[test]
    fn test_yaml_timeout() {
        let config = AppConfig::from_yaml_str("request_timeout_secs: 15").unwrap();
        assert_eq!(config.provider.request_timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_yaml_rejects_negative_lookback() {
        assert!(AppConfig::from_yaml_str("default_lookback_days: -3").is_err());
    }

    #[test]
    fn test_yaml_rejects_huge_lookback() {
        assert!(AppConfig::from_yaml_str("default_lookback_days: 999999999999").is_err());
        assert!(AppConfig::from_yaml_str("default_lookback_days: 36500").is_ok());
    }

    #[test]
    fn test_yaml_rejects_garbage() {
        assert!(AppConfig::from_yaml_str("port: [not, a, port]").is_err());
    }
}
