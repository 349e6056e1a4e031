#![allow(dead_code)]

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use defi_underlying_resolver::{
    adapters::{AdapterError, DeFiAdapter, StaticRateAdapter},
    config::ResolverSettings,
    models::{Chain, ConversionResult, RateEntry, TokenBalance, TokenDescriptor, Underlying},
    registry::{StaticRegistry, PRICE_PRODUCT, PRICE_PROTOCOL},
    services::UnderlyingResolver,
    utils::pow10,
};

pub const CHAIN: Chain = Chain::Ethereum;

pub fn token(byte: u8, symbol: &str, decimals: u8) -> TokenDescriptor {
    TokenDescriptor::new(Address::repeat_byte(byte), symbol, symbol, decimals)
}

pub fn lp() -> TokenDescriptor {
    token(0x01, "LP", 18)
}

pub fn usdc() -> TokenDescriptor {
    token(0x02, "USDC", 6)
}

pub fn weth() -> TokenDescriptor {
    token(0x03, "WETH", 18)
}

pub fn steth() -> TokenDescriptor {
    token(0x04, "stETH", 18)
}

pub fn wsteth() -> TokenDescriptor {
    token(0x05, "wstETH", 18)
}

pub fn dai() -> TokenDescriptor {
    token(0x06, "DAI", 18)
}

pub fn units(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * pow10(decimals)
}

pub fn position(token: TokenDescriptor, balance_raw: U256) -> Underlying {
    Underlying::new(token, balance_raw)
}

/// USD price adapter quoting USDC at $1, WETH at $2000, DAI at $1
pub fn price_adapter() -> StaticRateAdapter {
    StaticRateAdapter::usd_prices(
        PRICE_PROTOCOL,
        PRICE_PRODUCT,
        [
            (usdc(), units(1, 18)),
            (weth(), units(2_000, 18)),
            (dai(), units(1, 18)),
        ],
    )
}

pub fn resolver(registry: StaticRegistry) -> UnderlyingResolver {
    resolver_with(registry, ResolverSettings::default())
}

pub fn resolver_with(registry: StaticRegistry, settings: ResolverSettings) -> UnderlyingResolver {
    UnderlyingResolver::new(Arc::new(registry), settings)
}

pub fn fast_settings() -> ResolverSettings {
    ResolverSettings {
        branch_timeout_ms: 50,
        retry_attempts: 1,
        ..ResolverSettings::default()
    }
}

/// Wraps an adapter and counts `rate_of` calls
pub struct CountingAdapter {
    inner: StaticRateAdapter,
    pub calls: Arc<AtomicU32>,
}

impl CountingAdapter {
    pub fn new(inner: StaticRateAdapter) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeFiAdapter for CountingAdapter {
    fn protocol_name(&self) -> &str {
        self.inner.protocol_name()
    }

    fn product_id(&self) -> &str {
        self.inner.product_id()
    }

    async fn protocol_token(&self, token: Address) -> Result<TokenDescriptor, AdapterError> {
        self.inner.protocol_token(token).await
    }

    async fn balances_of(
        &self,
        balance: &TokenBalance,
        user: Option<Address>,
        block_number: Option<u64>,
    ) -> Result<Vec<Underlying>, AdapterError> {
        self.inner.balances_of(balance, user, block_number).await
    }

    async fn rate_of(
        &self,
        token: Address,
        block_number: Option<u64>,
    ) -> Result<ConversionResult, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.rate_of(token, block_number).await
    }
}

/// Adapter whose every call fails with the configured error
pub struct FailingAdapter {
    pub error: AdapterError,
}

#[async_trait]
impl DeFiAdapter for FailingAdapter {
    fn protocol_name(&self) -> &str {
        "failing"
    }

    fn product_id(&self) -> &str {
        "broken"
    }

    async fn protocol_token(&self, _token: Address) -> Result<TokenDescriptor, AdapterError> {
        Err(self.error.clone())
    }

    async fn balances_of(
        &self,
        _balance: &TokenBalance,
        _user: Option<Address>,
        _block_number: Option<u64>,
    ) -> Result<Vec<Underlying>, AdapterError> {
        Err(self.error.clone())
    }

    async fn rate_of(
        &self,
        _token: Address,
        _block_number: Option<u64>,
    ) -> Result<ConversionResult, AdapterError> {
        Err(self.error.clone())
    }
}

/// Adapter that answers after a delay
pub struct SlowAdapter {
    pub delay: Duration,
    pub rate: ConversionResult,
}

impl SlowAdapter {
    pub fn new(delay: Duration, token: TokenDescriptor, underlyings: Vec<RateEntry>) -> Self {
        Self {
            delay,
            rate: ConversionResult::new(token, underlyings),
        }
    }
}

#[async_trait]
impl DeFiAdapter for SlowAdapter {
    fn protocol_name(&self) -> &str {
        "slow"
    }

    fn product_id(&self) -> &str {
        "vault"
    }

    async fn protocol_token(&self, _token: Address) -> Result<TokenDescriptor, AdapterError> {
        Ok(self.rate.token.clone())
    }

    async fn balances_of(
        &self,
        _balance: &TokenBalance,
        _user: Option<Address>,
        _block_number: Option<u64>,
    ) -> Result<Vec<Underlying>, AdapterError> {
        Ok(Vec::new())
    }

    async fn rate_of(
        &self,
        _token: Address,
        _block_number: Option<u64>,
    ) -> Result<ConversionResult, AdapterError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.rate.clone())
    }
}
