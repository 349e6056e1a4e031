use alloy::primitives::{address, Address, U256};
use serde::{Deserialize, Serialize};

use crate::utils::fixed_point::pow10;

/// Pseudo-token address used for USD quotes (ISO 4217 numeric code 840)
pub const USD_ADDRESS: Address = address!("0000000000000000000000000000000000000348");

/// Fixed-point scale of every USD price
pub const USD_DECIMALS: u8 = 18;

/// Immutable identity of an on-chain asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    /// Fixed-point scale for every balance and rate of this token
    pub decimals: u8,
}

impl TokenDescriptor {
    pub fn new(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    /// The USD pseudo-token price adapters quote against
    pub fn usd() -> Self {
        Self::new(USD_ADDRESS, "US Dollar", "USD", USD_DECIMALS)
    }

    /// Raw amount representing exactly one whole token
    pub fn one_unit(&self) -> U256 {
        pow10(self.decimals)
    }
}

/// A descriptor plus a raw balance scaled by `10^decimals`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(flatten)]
    pub token: TokenDescriptor,
    pub balance_raw: U256,
}

impl TokenBalance {
    pub fn new(token: TokenDescriptor, balance_raw: U256) -> Self {
        Self { token, balance_raw }
    }

    /// Balance of exactly one whole token
    pub fn one_unit(token: TokenDescriptor) -> Self {
        let balance_raw = token.one_unit();
        Self { token, balance_raw }
    }

    pub fn address(&self) -> Address {
        self.token.address
    }

    pub fn decimals(&self) -> u8 {
        self.token.decimals
    }
}

/// Role a token plays inside a position tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenType {
    Protocol,
    Underlying,
    UnderlyingClaimable,
}

/// Outcome of resolution for a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Broken down into further underlying tokens
    Decomposed,
    /// Valued by a USD price instead of further tokens
    Priced,
    /// Value could not be determined; not the same as a zero balance
    Unresolved,
}

/// A node of a position tree.
///
/// At most one of `tokens` and `price_raw` is populated. Both stay empty when
/// resolution for the node failed softly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Underlying {
    #[serde(flatten)]
    pub balance: TokenBalance,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<Underlying>>,
    /// USD price of one whole token, scaled by `10^USD_DECIMALS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_raw: Option<U256>,
}

impl Underlying {
    pub fn new(token: TokenDescriptor, balance_raw: U256) -> Self {
        Self {
            balance: TokenBalance::new(token, balance_raw),
            token_type: TokenType::Underlying,
            tokens: None,
            price_raw: None,
        }
    }

    pub fn with_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<Underlying>) -> Self {
        self.tokens = Some(tokens);
        self.price_raw = None;
        self
    }

    pub fn with_price(mut self, price_raw: U256) -> Self {
        self.price_raw = Some(price_raw);
        self.tokens = None;
        self
    }

    pub fn address(&self) -> Address {
        self.balance.address()
    }

    pub fn decimals(&self) -> u8 {
        self.balance.decimals()
    }

    pub fn balance_raw(&self) -> U256 {
        self.balance.balance_raw
    }

    pub fn descriptor(&self) -> &TokenDescriptor {
        &self.balance.token
    }

    pub fn resolution(&self) -> Resolution {
        match (&self.tokens, &self.price_raw) {
            (Some(_), _) => Resolution::Decomposed,
            (None, Some(_)) => Resolution::Priced,
            (None, None) => Resolution::Unresolved,
        }
    }

    /// True once the node carries either children or a price
    pub fn is_settled(&self) -> bool {
        self.resolution() != Resolution::Unresolved
    }

    /// Terminal nodes of this subtree, in depth-first order
    pub fn leaves(&self) -> Vec<&Underlying> {
        match &self.tokens {
            Some(children) if !children.is_empty() => {
                children.iter().flat_map(|child| child.leaves()).collect()
            }
            _ => vec![self],
        }
    }

    /// Number of hops from this node to its deepest descendant
    pub fn depth(&self) -> usize {
        self.tokens
            .as_ref()
            .and_then(|children| children.iter().map(Underlying::depth).max())
            .map_or(0, |deepest| deepest + 1)
    }
}

/// Underlying token yielded by one whole unit of a protocol token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateEntry {
    #[serde(flatten)]
    pub token: TokenDescriptor,
    /// Underlying base units per `10^decimals` base units of the protocol token
    /// (scaled by the protocol token's decimals, not the underlying's)
    pub underlying_rate_raw: U256,
}

impl RateEntry {
    pub fn new(token: TokenDescriptor, underlying_rate_raw: U256) -> Self {
        Self {
            token,
            underlying_rate_raw,
        }
    }
}

/// Exchange rates for one whole unit of a protocol token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ConversionResultWire")]
pub struct ConversionResult {
    #[serde(flatten)]
    pub token: TokenDescriptor,
    base_rate: u8,
    pub tokens: Vec<RateEntry>,
}

impl ConversionResult {
    pub fn new(token: TokenDescriptor, tokens: Vec<RateEntry>) -> Self {
        Self {
            token,
            base_rate: 1,
            tokens,
        }
    }

    /// Always 1: rates are relative to one whole protocol token
    pub fn base_rate(&self) -> u8 {
        self.base_rate
    }

    /// USD quote, present only when an entry is the USD pseudo-token
    pub fn usd_rate(&self) -> Option<U256> {
        self.tokens
            .iter()
            .find(|entry| entry.token.address == USD_ADDRESS)
            .map(|entry| entry.underlying_rate_raw)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversionResultWire {
    #[serde(flatten)]
    token: TokenDescriptor,
    base_rate: u8,
    tokens: Vec<RateEntry>,
}

impl TryFrom<ConversionResultWire> for ConversionResult {
    type Error = String;

    fn try_from(wire: ConversionResultWire) -> Result<Self, Self::Error> {
        if wire.base_rate != 1 {
            return Err(format!("baseRate must be 1, got {}", wire.base_rate));
        }
        Ok(ConversionResult::new(wire.token, wire.tokens))
    }
}
