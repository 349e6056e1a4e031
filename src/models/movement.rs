use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use super::token::{TokenDescriptor, Underlying};

/// A deposit, withdrawal or transfer event against a protocol token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRecord {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub protocol_token: TokenDescriptor,
    /// Per-event underlying deltas
    pub tokens: Vec<Underlying>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
}

impl MovementRecord {
    pub fn new(
        transaction_hash: B256,
        block_number: u64,
        protocol_token: TokenDescriptor,
        tokens: Vec<Underlying>,
    ) -> Self {
        Self {
            transaction_hash,
            block_number,
            protocol_token,
            tokens,
            from: None,
            to: None,
        }
    }

    pub fn with_parties(mut self, from: Address, to: Address) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}
