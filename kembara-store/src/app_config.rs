use serde::Deserialize;
use std::env;
use std::time::Duration;
use kembara_catalog::PricingConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Root of the availability backend; may carry a path prefix
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 { 10_000 }

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    pub interval_seconds: u64,
    pub lookahead_days: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_seconds: 60, lookahead_days: 30 }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_occupancy")]
    pub vehicle_occupancy: u32,
    pub tax_rate: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_occupancy() -> u32 { 8 }
fn default_currency() -> String { "RM".to_string() }

impl BusinessRules {
    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            vehicle_occupancy: self.vehicle_occupancy,
            tax_rate: self.tax_rate,
            currency: self.currency.clone(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `KEMBARA__UPSTREAM__BASE_URL=http://localhost:5000`
            .add_source(config::Environment::with_prefix("KEMBARA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
