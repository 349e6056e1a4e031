use alloy::primitives::Address;
use async_trait::async_trait;

use crate::adapters::rate_composer::RateComposer;
use crate::models::{Chain, ConversionResult, TokenBalance, TokenDescriptor, Underlying};

/// Common error type for all DeFi protocol adapters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The contract did not exist yet at the requested block
    #[error("Contract {address} not deployed at block {block_number}")]
    NotDeployedAtBlock { address: Address, block_number: u64 },

    #[error("No adapter registered for {protocol}/{product} on {chain}")]
    AdapterMissing {
        chain: Chain,
        protocol: String,
        product: String,
    },

    #[error("Contract call failed: {0}")]
    ContractError(String),

    #[error("Invalid position data: {0}")]
    InvalidData(String),

    #[error("Protocol token not supported: {0}")]
    UnsupportedToken(Address),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

impl AdapterError {
    pub fn is_not_deployed(&self) -> bool {
        matches!(self, AdapterError::NotDeployedAtBlock { .. })
    }
}

/// Rate provider contract every protocol adapter exposes to the resolver
#[async_trait]
pub trait DeFiAdapter: Send + Sync {
    /// Protocol identifier (e.g. "lido", "uniswap-v2")
    fn protocol_name(&self) -> &str;

    /// Product within the protocol (e.g. "wst-eth", "pool")
    fn product_id(&self) -> &str;

    /// Descriptor of a protocol token this adapter serves
    async fn protocol_token(&self, token: Address) -> Result<TokenDescriptor, AdapterError>;

    /// Decompose an actual balance into its underlying balances
    async fn balances_of(
        &self,
        balance: &TokenBalance,
        user: Option<Address>,
        block_number: Option<u64>,
    ) -> Result<Vec<Underlying>, AdapterError>;

    /// Underlying tokens and rates for one whole unit of `token`.
    ///
    /// The default decomposes exactly `10^decimals` through `balances_of`.
    async fn rate_of(
        &self,
        token: Address,
        block_number: Option<u64>,
    ) -> Result<ConversionResult, AdapterError> {
        let descriptor = self.protocol_token(token).await?;
        let unit = TokenBalance::one_unit(descriptor.clone());
        let underlyings = self.balances_of(&unit, None, block_number).await?;

        Ok(RateComposer::rate_from_unit_balances(descriptor, &underlyings))
    }
}
