use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;

use crate::adapters::rate_composer::RateComposer;
use crate::adapters::traits::{AdapterError, DeFiAdapter};
use crate::models::{ConversionResult, RateEntry, TokenBalance, TokenDescriptor, Underlying};

#[derive(Debug, Clone)]
struct StaticRate {
    token: TokenDescriptor,
    underlyings: Vec<RateEntry>,
    deployed_at: Option<u64>,
}

/// Adapter serving fixed conversion rates from memory.
///
/// Covers pegged wrappers (1:1 wrapped tokens), manually maintained USD price
/// tables, and stands in for on-chain adapters in tests.
#[derive(Debug, Clone)]
pub struct StaticRateAdapter {
    protocol: String,
    product: String,
    rates: HashMap<Address, StaticRate>,
}

impl StaticRateAdapter {
    pub fn new(protocol: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            product: product.into(),
            rates: HashMap::new(),
        }
    }

    /// USD price table: one entry per token, quoted against the USD pseudo-token
    pub fn usd_prices(
        protocol: impl Into<String>,
        product: impl Into<String>,
        prices: impl IntoIterator<Item = (TokenDescriptor, U256)>,
    ) -> Self {
        prices.into_iter().fold(Self::new(protocol, product), |adapter, (token, price_raw)| {
            adapter.with_rate(token, vec![RateEntry::new(TokenDescriptor::usd(), price_raw)])
        })
    }

    pub fn with_rate(mut self, token: TokenDescriptor, underlyings: Vec<RateEntry>) -> Self {
        self.rates.insert(
            token.address,
            StaticRate {
                token,
                underlyings,
                deployed_at: None,
            },
        );
        self
    }

    /// Blocks before `block_number` report the token as not yet deployed
    pub fn with_deployment_block(mut self, token: Address, block_number: u64) -> Self {
        if let Some(rate) = self.rates.get_mut(&token) {
            rate.deployed_at = Some(block_number);
        }
        self
    }

    /// Protocol tokens this adapter serves
    pub fn tokens(&self) -> Vec<Address> {
        self.rates.keys().copied().collect()
    }

    fn lookup(
        &self,
        token: Address,
        block_number: Option<u64>,
    ) -> Result<&StaticRate, AdapterError> {
        let rate = self.rates.get(&token).ok_or(AdapterError::UnsupportedToken(token))?;

        match (rate.deployed_at, block_number) {
            (Some(deployed_at), Some(block_number)) if block_number < deployed_at => {
                Err(AdapterError::NotDeployedAtBlock {
                    address: token,
                    block_number,
                })
            }
            _ => Ok(rate),
        }
    }
}

#[async_trait]
impl DeFiAdapter for StaticRateAdapter {
    fn protocol_name(&self) -> &str {
        &self.protocol
    }

    fn product_id(&self) -> &str {
        &self.product
    }

    async fn protocol_token(&self, token: Address) -> Result<TokenDescriptor, AdapterError> {
        Ok(self.lookup(token, None)?.token.clone())
    }

    async fn balances_of(
        &self,
        balance: &TokenBalance,
        _user: Option<Address>,
        block_number: Option<u64>,
    ) -> Result<Vec<Underlying>, AdapterError> {
        let rate = self.rate_of(balance.address(), block_number).await?;
        RateComposer::compose(balance, &rate)
    }

    async fn rate_of(
        &self,
        token: Address,
        block_number: Option<u64>,
    ) -> Result<ConversionResult, AdapterError> {
        let rate = self.lookup(token, block_number)?;
        Ok(ConversionResult::new(rate.token.clone(), rate.underlyings.clone()))
    }
}
