use alloy::primitives::Address;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::AdapterRegistry;
use crate::adapters::{AdapterError, DeFiAdapter};
use crate::models::Chain;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdapterKey {
    pub chain: Chain,
    pub protocol: String,
    pub product: String,
}

impl AdapterKey {
    pub fn new(chain: Chain, protocol: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            chain,
            protocol: protocol.into(),
            product: product.into(),
        }
    }
}

/// Map-backed registry built once and shared read-only
#[derive(Default, Clone)]
pub struct StaticRegistry {
    token_adapters: HashMap<(Chain, Address), Arc<dyn DeFiAdapter>>,
    named_adapters: HashMap<AdapterKey, Arc<dyn DeFiAdapter>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route lookups for `token` on `chain` to `adapter`
    pub fn with_token_adapter(
        mut self,
        chain: Chain,
        token: Address,
        adapter: Arc<dyn DeFiAdapter>,
    ) -> Self {
        self.token_adapters.insert((chain, token), adapter);
        self
    }

    /// Register `adapter` under its own protocol/product identity
    pub fn with_named_adapter(mut self, chain: Chain, adapter: Arc<dyn DeFiAdapter>) -> Self {
        let key = AdapterKey::new(chain, adapter.protocol_name(), adapter.product_id());
        self.named_adapters.insert(key, adapter);
        self
    }

    /// Register `adapter` under an explicit identity, e.g. as a chain's price adapter
    pub fn with_named_adapter_as(
        mut self,
        chain: Chain,
        protocol: &str,
        product: &str,
        adapter: Arc<dyn DeFiAdapter>,
    ) -> Self {
        self.named_adapters.insert(AdapterKey::new(chain, protocol, product), adapter);
        self
    }

    /// Register `adapter` by identity and as the decomposer of every token in `tokens`
    pub fn register(
        self,
        chain: Chain,
        adapter: Arc<dyn DeFiAdapter>,
        tokens: impl IntoIterator<Item = Address>,
    ) -> Self {
        let registry = self.with_named_adapter(chain, adapter.clone());
        tokens.into_iter().fold(registry, |registry, token| {
            registry.with_token_adapter(chain, token, adapter.clone())
        })
    }

    pub fn token_adapter_count(&self) -> usize {
        self.token_adapters.len()
    }
}

#[async_trait]
impl AdapterRegistry for StaticRegistry {
    async fn token_adapter(&self, chain: Chain, token: Address) -> Option<Arc<dyn DeFiAdapter>> {
        self.token_adapters.get(&(chain, token)).cloned()
    }

    async fn named_adapter(
        &self,
        chain: Chain,
        protocol: &str,
        product: &str,
    ) -> Result<Arc<dyn DeFiAdapter>, AdapterError> {
        let key = AdapterKey::new(chain, protocol, product);
        self.named_adapters
            .get(&key)
            .cloned()
            .ok_or(AdapterError::AdapterMissing {
                chain,
                protocol: key.protocol,
                product: key.product,
            })
    }
}
