//! Configuration loading
//!
//! Everything has a compiled-in default, so the program runs without any
//! file. A TOML file (explicit `--config` path, or `goldfolio/config.toml`
//! under the platform config directory) overrides whole sections.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::holdings::defaults::default_holdings;
use crate::holdings::Holdings;
use crate::pricing::gold::PriceBounds;

/// Environment switch that disables every network price lookup
pub const OFFLINE_ENV: &str = "GOLDFOLIO_OFFLINE";

pub fn offline_requested() -> bool {
    std::env::var(OFFLINE_ENV)
        .map(|v| !v.is_empty() && v != "0")
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub holdings: Holdings,
    pub gold: GoldSourceConfig,
    pub equity: EquitySourceConfig,
    pub charts: ChartConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            holdings: default_holdings(),
            gold: GoldSourceConfig::default(),
            equity: EquitySourceConfig::default(),
            charts: ChartConfig::default(),
            mail: None,
        }
    }
}

/// A custodian and the page its gram-gold price is scraped from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustodianPage {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoldSourceConfig {
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub custodians: Vec<CustodianPage>,
}

impl Default for GoldSourceConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            timeout_secs: 15,
            min_price: Decimal::from(1000),
            max_price: Decimal::from(10000),
            custodians: vec![
                CustodianPage {
                    name: "Ziraat".to_string(),
                    url: "https://altin.doviz.com/ziraat-bankasi/gram-altin".to_string(),
                },
                CustodianPage {
                    name: "Yapıkredi".to_string(),
                    url: "https://altin.doviz.com/yapikredi/gram-altin".to_string(),
                },
            ],
        }
    }
}

impl GoldSourceConfig {
    pub fn bounds(&self) -> PriceBounds {
        PriceBounds {
            min: self.min_price,
            max: self.max_price,
        }
    }

    pub fn page_map(&self) -> HashMap<String, String> {
        self.custodians
            .iter()
            .map(|c| (c.name.trim().to_string(), c.url.clone()))
            .collect()
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EquitySourceConfig {
    /// Appended to tickers when querying Yahoo Finance
    pub exchange_suffix: String,
    pub delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for EquitySourceConfig {
    fn default() -> Self {
        Self {
            exchange_suffix: ".IS".to_string(),
            delay_ms: 500,
            timeout_secs: 15,
        }
    }
}

impl EquitySourceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub enabled: bool,
    pub output_dir: PathBuf,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from: String,
    pub to: String,
    /// Login name; defaults to `from`
    #[serde(default)]
    pub username: Option<String>,
    /// Environment variable holding the SMTP password
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_password_env() -> String {
    "GOLDFOLIO_SMTP_PASSWORD".to_string()
}

impl Config {
    /// Load configuration from `path`, the default location, or defaults
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.display().to_string()).into());
                }
                p.to_path_buf()
            }
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("No config file found, using compiled-in defaults");
                    return Ok(Config::default());
                }
            },
        };

        info!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(&path)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gold.min_price >= self.gold.max_price {
            return Err(ConfigError::Validation(format!(
                "gold.min_price ({}) must be below gold.max_price ({})",
                self.gold.min_price, self.gold.max_price
            )));
        }

        let mut seen = HashSet::new();
        for custodian in &self.gold.custodians {
            if !seen.insert(custodian.name.trim()) {
                return Err(ConfigError::Validation(format!(
                    "custodian '{}' is listed twice",
                    custodian.name
                )));
            }
        }

        if let Some(mail) = &self.mail {
            if mail.from.trim().is_empty() || mail.to.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "mail.from and mail.to must both be set".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/goldfolio/config.toml`, or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::config_home)
        .map(|dir| dir.join("goldfolio").join("config.toml"))
}
