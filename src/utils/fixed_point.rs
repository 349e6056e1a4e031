use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Largest scale `rust_decimal` can represent
const MAX_DECIMAL_SCALE: u8 = 28;

/// `10^decimals` as a U256
pub fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// `floor(value * numerator / 10^decimals)`, or `None` on overflow
pub fn mul_div_floor(value: U256, numerator: U256, decimals: u8) -> Option<U256> {
    value.checked_mul(numerator).map(|product| product / pow10(decimals))
}

/// Converts a raw fixed-point amount into a human-scale decimal.
///
/// Precision below 28 decimal places is truncated. Returns `None` when the
/// integer part does not fit in a `Decimal`.
pub fn to_decimal(raw: U256, decimals: u8) -> Option<Decimal> {
    let (raw, scale) = if decimals > MAX_DECIMAL_SCALE {
        (raw / pow10(decimals - MAX_DECIMAL_SCALE), MAX_DECIMAL_SCALE)
    } else {
        (raw, decimals)
    };

    let unit = pow10(scale);
    let whole = u128::try_from(raw / unit).ok()?;
    let fraction = u128::try_from(raw % unit).ok()?;

    let whole = Decimal::try_from_i128_with_scale(i128::try_from(whole).ok()?, 0).ok()?;
    let fraction =
        Decimal::try_from_i128_with_scale(i128::try_from(fraction).ok()?, scale as u32).ok()?;

    whole.checked_add(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0), U256::from(1u64));
        assert_eq!(pow10(6), U256::from(1_000_000u64));
        assert_eq!(pow10(18), U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_mul_div_floor_truncates() {
        let result = mul_div_floor(U256::from(10u64), U256::from(3u64), 1);
        assert_eq!(result, Some(U256::from(3u64)));
        assert_eq!(mul_div_floor(U256::MAX, U256::from(2u64), 0), None);
    }

    #[test]
    fn test_to_decimal() {
        let raw = U256::from(2_100_000u64);
        assert_eq!(to_decimal(raw, 6), Some(Decimal::from_str("2.1").unwrap()));

        let wei = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(to_decimal(wei, 18), Some(Decimal::from_str("1.5").unwrap()));

        // 30 decimals is beyond Decimal's scale and gets truncated to 28
        let tiny = pow10(30) + U256::from(1u64);
        assert_eq!(to_decimal(tiny, 30), Some(Decimal::ONE));
    }
}
