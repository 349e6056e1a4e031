//! Adapter lookup seams consumed by the resolver.
//!
//! A registry answers two questions: which adapter decomposes a given token
//! address, and which adapter is registered under a (protocol, product)
//! identity. The first treats absence as a normal outcome; the second reports
//! it as [`AdapterError::AdapterMissing`].

pub mod static_registry;

pub use static_registry::{AdapterKey, StaticRegistry};

use alloy::primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;

use crate::adapters::{AdapterError, DeFiAdapter};
use crate::models::Chain;

/// Protocol id of the dedicated USD pricing adapter
pub const PRICE_PROTOCOL: &str = "prices";

/// Product id of the dedicated USD pricing adapter
pub const PRICE_PRODUCT: &str = "usd";

#[async_trait]
pub trait AdapterRegistry: Send + Sync {
    /// Adapter that decomposes `token` on `chain`, if any
    async fn token_adapter(&self, chain: Chain, token: Address) -> Option<Arc<dyn DeFiAdapter>>;

    /// Adapter registered under a protocol/product identity
    async fn named_adapter(
        &self,
        chain: Chain,
        protocol: &str,
        product: &str,
    ) -> Result<Arc<dyn DeFiAdapter>, AdapterError>;
}
