use alloy::primitives::U256;
use bigdecimal::{BigDecimal, Zero};

use super::types::Token;
use crate::codec::amount::normalize;
use crate::pricing::FiatConverter;

/// Normalized amounts and prices of one two-token event.
/// `price_a` is token1 per token0, `price_b` its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuote {
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub price_a: BigDecimal,
    pub price_b: BigDecimal,
    pub price_a_usd: BigDecimal,
    pub price_b_usd: BigDecimal,
}

impl SwapQuote {
    /// `None` when either normalized amount is zero. When `rate_pair` is set
    /// the converter sees the pair price before both sides are valued.
    pub fn new(
        converter: &FiatConverter,
        rate_pair: Option<&str>,
        token0: &Token,
        token1: &Token,
        raw0: U256,
        raw1: U256,
    ) -> Option<Self> {
        let amount0 = normalize(raw0, token0.decimals);
        let amount1 = normalize(raw1, token1.decimals);
        if amount0.is_zero() || amount1.is_zero() {
            return None;
        }

        let price_a = &amount1 / &amount0;
        let price_b = &amount0 / &amount1;
        if let Some(pair) = rate_pair {
            converter.update(pair, &token0.address, &token1.address, &price_a);
        }
        let (price_a_usd, price_b_usd) = converter.convert_ab(&token0.address, &token1.address, &price_a);

        Some(Self {
            amount0,
            amount1,
            price_a,
            price_b,
            price_a_usd,
            price_b_usd,
        })
    }

    pub fn trade_value(&self) -> BigDecimal {
        trade_value_usd(&self.amount0, &self.amount1, &self.price_a_usd, &self.price_b_usd)
    }

    pub fn reserve_value(&self) -> BigDecimal {
        reserve_value_usd(&self.amount0, &self.amount1, &self.price_a_usd, &self.price_b_usd)
    }
}

/// USD value of a trade: the smaller of the two independently priced legs,
/// or the only leg that could be priced. Zero means unknown.
pub fn trade_value_usd(
    amount_a: &BigDecimal,
    amount_b: &BigDecimal,
    price_a_usd: &BigDecimal,
    price_b_usd: &BigDecimal,
) -> BigDecimal {
    let leg_a = (!price_a_usd.is_zero()).then(|| (amount_a * price_a_usd).abs());
    let leg_b = (!price_b_usd.is_zero()).then(|| (amount_b * price_b_usd).abs());
    match (leg_a, leg_b) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => BigDecimal::zero(),
    }
}

/// USD value of a pool: both sides, i.e. twice the conservative leg.
pub fn reserve_value_usd(
    reserve_a: &BigDecimal,
    reserve_b: &BigDecimal,
    price_a_usd: &BigDecimal,
    price_b_usd: &BigDecimal,
) -> BigDecimal {
    trade_value_usd(reserve_a, reserve_b, price_a_usd, price_b_usd) * BigDecimal::from(2)
}
