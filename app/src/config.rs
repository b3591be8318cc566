// order-relay/src/config.rs

use crate::errors::{AppError, Result};
use crate::queue::RetryPolicy;
use crate::storage::BlobStoreConfig;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Credentials and endpoint used to publish order events to the bus.
#[derive(Clone)]
pub struct BusSettings {
  pub endpoint: String,
  pub key_name: String,
  pub key: String,
}

// The key must never reach the logs.
impl std::fmt::Debug for BusSettings {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BusSettings")
      .field("endpoint", &self.endpoint)
      .field("key_name", &self.key_name)
      .field("key", &"[REDACTED]")
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct QueueSettings {
  pub retry: RetryPolicy,
  pub max_delivery_count: u32,
  pub max_concurrent_calls: usize,
  /// Oldest entries are evicted once the dead-letter list holds this many.
  pub max_dead_letters: usize,
}

/// Everything the relay reads from its environment, loaded once at startup and shared
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  pub storage: BlobStoreConfig,
  pub orders_container: String,

  pub bus: BusSettings,
  pub delivery_processor_endpoint: Option<String>,
  pub workflow_webhook_uri: Option<String>,

  /// Makes orders holding the sentinel catalog item fail persistence on purpose.
  pub test_failure: bool,
  pub http_timeout: Duration,

  pub queue: QueueSettings,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any variable source. `from_env` passes the process
  /// environment; tests pass a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let required = |name: &str| {
      lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)))
    };
    let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let server_host = or_default("SERVER_HOST", "127.0.0.1");
    let server_port = parse_value::<u16>("SERVER_PORT", &or_default("SERVER_PORT", "8080"))?;

    let storage = BlobStoreConfig::parse(&or_default("STORAGE_CONNECTION", "memory:"))?;
    let orders_container = or_default("ORDERS_CONTAINER", "orders");

    let bus = BusSettings {
      endpoint: required("SERVICE_BUS_ENDPOINT")?,
      key_name: required("SERVICE_BUS_KEY_NAME")?,
      key: required("SERVICE_BUS_KEY")?,
    };

    let test_failure = parse_value::<bool>("TEST_FAILURE", &or_default("TEST_FAILURE", "false"))?;
    let http_timeout_secs = parse_value::<u64>("HTTP_TIMEOUT_SECS", &or_default("HTTP_TIMEOUT_SECS", "30"))?;

    let retry = RetryPolicy {
      max_attempts: parse_value("RETRY_MAX_ATTEMPTS", &or_default("RETRY_MAX_ATTEMPTS", "3"))?,
      min_backoff: Duration::from_secs(parse_value("RETRY_MIN_BACKOFF_SECS", &or_default("RETRY_MIN_BACKOFF_SECS", "15"))?),
      max_backoff: Duration::from_secs(parse_value("RETRY_MAX_BACKOFF_SECS", &or_default("RETRY_MAX_BACKOFF_SECS", "60"))?),
    };
    retry.validate()?;

    let queue = QueueSettings {
      retry,
      max_delivery_count: parse_value("QUEUE_MAX_DELIVERY_COUNT", &or_default("QUEUE_MAX_DELIVERY_COUNT", "10"))?,
      max_concurrent_calls: parse_value("QUEUE_MAX_CONCURRENT_CALLS", &or_default("QUEUE_MAX_CONCURRENT_CALLS", "16"))?,
      max_dead_letters: parse_value("QUEUE_MAX_DEAD_LETTERS", &or_default("QUEUE_MAX_DEAD_LETTERS", "1000"))?,
    };
    if queue.max_concurrent_calls == 0 {
      return Err(AppError::Config("QUEUE_MAX_CONCURRENT_CALLS must be at least 1".to_string()));
    }

    let config = Self {
      server_host,
      server_port,
      storage,
      orders_container,
      bus,
      delivery_processor_endpoint: optional("DELIVERY_ORDER_PROCESSOR_ENDPOINT"),
      workflow_webhook_uri: optional("LOGIC_APP_URI"),
      test_failure,
      http_timeout: Duration::from_secs(http_timeout_secs),
      queue,
    };

    tracing::info!("Application configuration loaded successfully.");
    tracing::debug!(config = ?config, "Loaded config details");
    Ok(config)
  }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}
