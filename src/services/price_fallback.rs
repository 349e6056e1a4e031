use alloy::primitives::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::ResolverSettings;
use crate::error::{with_retry, RetryConfig};
use crate::models::Chain;
use crate::registry::AdapterRegistry;

/// Terminal valuation for tokens no adapter decomposes.
///
/// Every failure on this path is soft: a missing price adapter, an adapter
/// error, an empty quote or a timeout all yield `None`.
pub struct PriceFallback {
    registry: Arc<dyn AdapterRegistry>,
    protocol: String,
    product: String,
    call_timeout: Duration,
    retry: RetryConfig,
}

impl PriceFallback {
    pub fn new(registry: Arc<dyn AdapterRegistry>, settings: &ResolverSettings) -> Self {
        Self {
            registry,
            protocol: settings.price_protocol.clone(),
            product: settings.price_product.clone(),
            call_timeout: settings.branch_timeout(),
            retry: settings.retry_config(),
        }
    }

    /// USD price of one whole `token`, scaled by `10^USD_DECIMALS`
    pub async fn price_of(
        &self,
        chain: Chain,
        token: Address,
        block_number: Option<u64>,
    ) -> Option<U256> {
        let lookup = self.registry.named_adapter(chain, &self.protocol, &self.product);
        let adapter = match timeout(self.call_timeout, lookup).await {
            Ok(Ok(adapter)) => adapter,
            Ok(Err(error)) => {
                tracing::debug!(
                    chain = %chain,
                    token = %token,
                    error = %error,
                    "No price adapter available, leaving token unpriced"
                );
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    chain = %chain,
                    token = %token,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Price adapter lookup timed out"
                );
                return None;
            }
        };

        let quote = with_retry("price_of", &self.retry, || adapter.rate_of(token, block_number));
        match timeout(self.call_timeout, quote).await {
            Ok(Ok(result)) => {
                let price = result.usd_rate();
                if price.is_none() {
                    tracing::warn!(
                        chain = %chain,
                        token = %token,
                        "Price adapter returned no quote"
                    );
                }
                price
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    chain = %chain,
                    token = %token,
                    protocol = adapter.protocol_name(),
                    error = %error,
                    "Price lookup failed, leaving token unpriced"
                );
                None
            }
            Err(_) => {
                tracing::warn!(
                    chain = %chain,
                    token = %token,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Price lookup timed out"
                );
                None
            }
        }
    }
}
