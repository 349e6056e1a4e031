use alloy::primitives::Address;

use crate::adapters::AdapterError;

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// A decomposition adapter failed with something other than not-deployed
    #[error("Adapter {protocol} failed resolving {token}: {source}")]
    Adapter {
        protocol: String,
        token: Address,
        #[source]
        source: AdapterError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for ResolverError {
    fn from(err: config::ConfigError) -> Self {
        ResolverError::Config(err.to_string())
    }
}

impl From<tracing_subscriber::util::TryInitError> for ResolverError {
    fn from(err: tracing_subscriber::util::TryInitError) -> Self {
        ResolverError::Config(format!("Failed to initialize logging: {}", err))
    }
}
