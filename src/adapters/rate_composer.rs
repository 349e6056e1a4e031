use alloy::primitives::U256;

use crate::adapters::traits::AdapterError;
use crate::models::{ConversionResult, RateEntry, TokenBalance, TokenDescriptor, Underlying};
use crate::utils::fixed_point::{mul_div_floor, pow10};

/// Turns protocol-token balances and fetched rates into underlying balances,
/// and back into one-unit rates.
///
/// All arithmetic is integer U256: rates are scaled by the protocol token's
/// own decimals, so `underlying = balance * rate / 10^decimals` rounds down
/// by at most one base unit of the underlying.
pub struct RateComposer;

impl RateComposer {
    /// Underlying base units yielded by `balance_raw` of a token with `decimals`
    pub fn underlying_amount(
        balance_raw: U256,
        decimals: u8,
        rate_raw: U256,
    ) -> Result<U256, AdapterError> {
        mul_div_floor(balance_raw, rate_raw, decimals).ok_or_else(|| {
            AdapterError::CalculationError(format!(
                "overflow composing balance {} with rate {}",
                balance_raw, rate_raw
            ))
        })
    }

    /// Decompose a protocol-token balance using a fetched conversion rate
    pub fn compose(
        balance: &TokenBalance,
        rate: &ConversionResult,
    ) -> Result<Vec<Underlying>, AdapterError> {
        if balance.address() != rate.token.address {
            return Err(AdapterError::InvalidData(format!(
                "rate for {} applied to balance of {}",
                rate.token.address,
                balance.address()
            )));
        }

        rate.tokens
            .iter()
            .map(|entry| {
                let amount = Self::underlying_amount(
                    balance.balance_raw,
                    balance.decimals(),
                    entry.underlying_rate_raw,
                )?;
                Ok(Underlying::new(entry.token.clone(), amount))
            })
            .collect()
    }

    /// Rate view from balances that were computed for exactly one whole unit
    pub fn rate_from_unit_balances(
        token: TokenDescriptor,
        underlyings: &[Underlying],
    ) -> ConversionResult {
        let tokens = underlyings
            .iter()
            .map(|underlying| {
                RateEntry::new(underlying.descriptor().clone(), underlying.balance_raw())
            })
            .collect();

        ConversionResult::new(token, tokens)
    }

    /// Rate view from balances computed for an arbitrary non-zero balance.
    ///
    /// `rate = underlying * 10^decimals / balance`, rounded down.
    pub fn rate_from_balance(
        token: TokenDescriptor,
        balance_raw: U256,
        underlyings: &[Underlying],
    ) -> Result<ConversionResult, AdapterError> {
        if balance_raw.is_zero() {
            return Err(AdapterError::CalculationError(format!(
                "cannot derive rate of {} from a zero balance",
                token.address
            )));
        }

        let scale = pow10(token.decimals);
        let tokens = underlyings
            .iter()
            .map(|underlying| {
                let rate = underlying
                    .balance_raw()
                    .checked_mul(scale)
                    .map(|scaled| scaled / balance_raw)
                    .ok_or_else(|| {
                        AdapterError::CalculationError(format!(
                            "overflow deriving rate for {}",
                            underlying.address()
                        ))
                    })?;
                Ok(RateEntry::new(underlying.descriptor().clone(), rate))
            })
            .collect::<Result<Vec<_>, AdapterError>>()?;

        Ok(ConversionResult::new(token, tokens))
    }
}
