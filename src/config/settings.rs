use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ResolverError, RetryConfig};
use crate::registry::{PRICE_PRODUCT, PRICE_PROTOCOL};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub resolver: ResolverSettings,
    pub logging: LoggingSettings,
}

/// Limits applied to each resolution pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Hops below a top-level position after which nodes are left unresolved
    pub max_depth: usize,
    /// Deadline for each adapter or registry call
    pub branch_timeout_ms: u64,
    /// Attempts per `rate_of` call for transient RPC errors
    pub retry_attempts: u32,
    pub price_protocol: String,
    pub price_product: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// One of "json", "pretty", "compact"
    pub format: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        ResolverSettings {
            max_depth: 8,
            branch_timeout_ms: 30_000,
            retry_attempts: 3,
            price_protocol: PRICE_PROTOCOL.to_string(),
            price_product: PRICE_PRODUCT.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl ResolverSettings {
    pub fn branch_timeout(&self) -> Duration {
        Duration::from_millis(self.branch_timeout_ms)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_attempts,
            ..RetryConfig::for_blockchain()
        }
    }

    /// Reads `RESOLVER_*` variables, falling back to defaults per field
    pub fn from_env() -> Result<Self, ResolverError> {
        let source = config::Config::builder()
            .add_source(config::Environment::with_prefix("RESOLVER").try_parsing(true))
            .build()?;
        Self::from_config(source)
    }

    pub fn from_config(source: config::Config) -> Result<Self, ResolverError> {
        let settings: Self = source.try_deserialize()?;
        if settings.max_depth == 0 {
            return Err(ResolverError::Config("max_depth must be at least 1".to_string()));
        }
        Ok(settings)
    }
}

impl LoggingSettings {
    /// Reads `LOG_LEVEL` and `LOG_FORMAT`
    pub fn from_env() -> Result<Self, ResolverError> {
        let source = config::Config::builder()
            .add_source(config::Environment::with_prefix("LOG"))
            .build()?;
        Ok(source.try_deserialize()?)
    }
}

impl Settings {
    pub fn new() -> Result<Self, ResolverError> {
        dotenvy::dotenv().ok();

        Ok(Settings {
            resolver: ResolverSettings::from_env()?,
            logging: LoggingSettings::from_env()?,
        })
    }
}
