//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;
use rust_decimal::Decimal;
use thiserror::Error;
use crate::inventory::policy::DEFAULT_MAX_QUANTITY_PER_LINE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InventoryBackend { Postgres, Memory, None }

impl FromStr for InventoryBackend {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            "none" | "" => Ok(Self::None),
            other => Err(ConfigError::Invalid { key: "INVENTORY_BACKEND", value: other.to_string() }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub inventory_backend: InventoryBackend,
    pub storage_dir: PathBuf,
    pub checkout: CheckoutConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutConfig {
    pub payment_gateway_url: String,
    pub max_quantity_per_line: u32,
    pub delivery_charge: Decimal,
    /// Orders at or above this subtotal ship free.
    pub free_delivery_threshold: Option<Decimal>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            payment_gateway_url: "https://payments.example.com/pay".to_string(),
            max_quantity_per_line: DEFAULT_MAX_QUANTITY_PER_LINE,
            delivery_charge: Decimal::new(99, 0),
            free_delivery_threshold: Some(Decimal::new(1999, 0)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get("DATABASE_URL").filter(|s| !s.is_empty());
        let inventory_backend = match get("INVENTORY_BACKEND") {
            Some(raw) => raw.parse()?,
            None if database_url.is_some() => InventoryBackend::Postgres,
            None => InventoryBackend::None,
        };
        let defaults = CheckoutConfig::default();
        let free_delivery_threshold = match get("FREE_DELIVERY_THRESHOLD") {
            Some(raw) if raw.trim().is_empty() || raw.trim() == "0" => None,
            Some(raw) => Some(parse("FREE_DELIVERY_THRESHOLD", &raw)?),
            None => defaults.free_delivery_threshold,
        };
        Ok(Self {
            port: parse_or("PORT", get("PORT"), 8083)?,
            database_url,
            nats_url: get("NATS_URL").filter(|s| !s.is_empty()),
            inventory_backend,
            storage_dir: get("STORAGE_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./var/sessions")),
            checkout: CheckoutConfig {
                payment_gateway_url: get("PAYMENT_GATEWAY_URL").unwrap_or(defaults.payment_gateway_url),
                max_quantity_per_line: parse_or("MAX_QUANTITY_PER_LINE", get("MAX_QUANTITY_PER_LINE"), defaults.max_quantity_per_line)?,
                delivery_charge: parse_or("DELIVERY_CHARGE", get("DELIVERY_CHARGE"), defaults.delivery_charge)?,
                free_delivery_threshold,
            },
        })
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw.to_string() })
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    raw.map_or(Ok(default), |raw| parse(key, &raw))
}
