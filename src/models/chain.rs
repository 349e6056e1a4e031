use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EVM chains an adapter registry can be keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Optimism,
    Bsc,
    Polygon,
    Fantom,
    Base,
    Arbitrum,
    Avalanche,
    Linea,
}

impl Chain {
    pub const ALL: [Chain; 9] = [
        Chain::Ethereum,
        Chain::Optimism,
        Chain::Bsc,
        Chain::Polygon,
        Chain::Fantom,
        Chain::Base,
        Chain::Arbitrum,
        Chain::Avalanche,
        Chain::Linea,
    ];

    /// EIP-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Optimism => 10,
            Chain::Bsc => 56,
            Chain::Polygon => 137,
            Chain::Fantom => 250,
            Chain::Base => 8453,
            Chain::Arbitrum => 42161,
            Chain::Avalanche => 43114,
            Chain::Linea => 59144,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Optimism => "optimism",
            Chain::Bsc => "bsc",
            Chain::Polygon => "polygon",
            Chain::Fantom => "fantom",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum",
            Chain::Avalanche => "avalanche",
            Chain::Linea => "linea",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported chain: {0}")]
pub struct UnsupportedChain(pub String);

impl TryFrom<u64> for Chain {
    type Error = UnsupportedChain;

    fn try_from(chain_id: u64) -> Result<Self, Self::Error> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.chain_id() == chain_id)
            .ok_or_else(|| UnsupportedChain(chain_id.to_string()))
    }
}

impl FromStr for Chain {
    type Err = UnsupportedChain;

    /// Accepts either the chain name or its numeric id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(chain_id) = trimmed.parse::<u64>() {
            return Chain::try_from(chain_id);
        }

        Chain::ALL
            .into_iter()
            .find(|chain| chain.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnsupportedChain(trimmed.to_string()))
    }
}
