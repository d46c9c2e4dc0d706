use alloy::primitives::U256;
use bigdecimal::{BigDecimal, Zero};
use std::str::FromStr;

pub fn u256_to_bd(val: U256) -> BigDecimal {
    BigDecimal::from_str(&val.to_string()).unwrap_or_default()
}

/// Scale a raw fixed-point integer down by `10^decimals`. Exact: only the
/// exponent changes.
pub fn normalize(raw: U256, decimals: u8) -> BigDecimal {
    shift(u256_to_bd(raw), decimals)
}

fn shift(value: BigDecimal, decimals: u8) -> BigDecimal {
    let (int, exponent) = value.into_bigint_and_exponent();
    BigDecimal::new(int, exponent + decimals as i64)
}

/// |a - b| without leaving unsigned space.
pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Division that yields zero instead of panicking on a zero divisor.
pub fn div_or_zero(numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
    if denominator.is_zero() {
        BigDecimal::zero()
    } else {
        numerator / denominator
    }
}
