//! Configuration types for algo-exec

use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Paper exchange configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    /// Fee charged on each simulated fill, as a fraction of notional
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,

    /// Reference price per symbol
    #[serde(default = "default_prices")]
    pub prices: HashMap<String, Decimal>,

    /// Starting balance per asset
    #[serde(default = "default_balances")]
    pub balances: HashMap<String, Decimal>,
}

fn default_fee_rate() -> Decimal {
    Decimal::new(4, 4) // 0.0004 = 0.04% taker
}
fn default_prices() -> HashMap<String, Decimal> {
    HashMap::from([
        ("BTCUSDT".to_string(), Decimal::new(60000, 0)),
        ("ETHUSDT".to_string(), Decimal::new(2000, 0)),
    ])
}
fn default_balances() -> HashMap<String, Decimal> {
    HashMap::from([("USDT".to_string(), Decimal::new(10000, 0))])
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
            prices: default_prices(),
            balances: default_balances(),
        }
    }
}

/// Strategy engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// TWAP interval used when the caller does not give one
    #[serde(default = "default_twap_interval_secs")]
    pub default_twap_interval_secs: u64,

    /// Upper bound on grid levels per strategy
    #[serde(default = "default_max_grid_levels")]
    pub max_grid_levels: u32,
}

fn default_twap_interval_secs() -> u64 {
    60
}
fn default_max_grid_levels() -> u32 {
    100
}

impl StrategyConfig {
    pub fn default_twap_interval(&self) -> Duration {
        Duration::from_secs(self.default_twap_interval_secs)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            default_twap_interval_secs: 60,
            max_grid_levels: 100,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
