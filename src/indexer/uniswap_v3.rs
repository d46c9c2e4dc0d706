use alloy::primitives::{Log as PrimitiveLog, I256};
use alloy::sol;
use alloy::sol_types::SolEvent;

use super::context::BlockContext;
use super::dispatcher::selector;
use super::types::{LogContext, PairKind};
use super::valuation::SwapQuote;
use crate::codec::TronAddress;

sol! {
    interface IUniswapV3Pool {
        event Swap(
            address indexed sender,
            address indexed recipient,
            int256 amount0,
            int256 amount1,
            uint160 sqrtPriceX96,
            uint128 liquidity,
            int24 tick
        );
    }

    interface IUniswapV3Factory {
        event PoolCreated(
            address indexed token0,
            address indexed token1,
            uint24 indexed fee,
            int24 tickSpacing,
            address pool
        );
    }
}

pub const SWAP: u32 = selector(IUniswapV3Pool::Swap::SIGNATURE_HASH);
pub const POOL_CREATED: u32 = selector(IUniswapV3Factory::PoolCreated::SIGNATURE_HASH);

pub const SELECTORS: [u32; 2] = [SWAP, POOL_CREATED];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum V3Event {
    /// Pool balance deltas: positive means the pool received the token.
    Swap { amount0: I256, amount1: I256 },
    PoolCreated { pool: TronAddress },
}

pub fn decode(selector: u32, log: &PrimitiveLog) -> Option<alloy::sol_types::Result<V3Event>> {
    let decoded = match selector {
        SWAP => IUniswapV3Pool::Swap::decode_log(log).map(|e| V3Event::Swap {
            amount0: e.amount0,
            amount1: e.amount1,
        }),
        POOL_CREATED => IUniswapV3Factory::PoolCreated::decode_log(log).map(|e| V3Event::PoolCreated {
            pool: TronAddress::from_evm(e.pool),
        }),
        _ => return None,
    };
    Some(decoded)
}

pub async fn apply(ctx: &BlockContext, lctx: &LogContext, contract: &TronAddress, event: V3Event) {
    match event {
        V3Event::PoolCreated { pool } => ctx.register_pair(lctx, contract, &pool, PairKind::UniswapV3),
        V3Event::Swap { amount0, amount1 } => {
            if amount0 == I256::ONE || amount1 == I256::ONE {
                tracing::warn!(tx = %lctx.tx, %amount0, %amount1, "Dust swap amounts, skipping");
                return;
            }
            // token1 flowing into the pool means token0 was bought.
            let buy = amount1.is_positive();
            let (raw0, raw1) = (amount0.unsigned_abs(), amount1.unsigned_abs());
            if raw0.is_zero() || raw1.is_zero() {
                tracing::warn!(tx = %lctx.tx, %amount0, %amount1, "Zero swap amount, skipping");
                return;
            }

            let Some(pair) = ctx.pair(contract, PairKind::UniswapV3, lctx).await else {
                return;
            };
            let Some(quote) = SwapQuote::new(&ctx.converter, None, &pair.token0, &pair.token1, raw0, raw1) else {
                tracing::warn!(tx = %lctx.tx, pair = %pair.address, %amount0, %amount1, "Zero swap amount, skipping");
                return;
            };

            let swap = ctx.pair_swap(lctx, &pair.address, raw0, raw1, buy, &quote, lctx.wallet());
            ctx.state.add_trade(swap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, block, log_ctx, node_log, topic_address, topic_hash, topic_uint, usdt, Harness};
    use alloy::primitives::U256;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn swap_log(pool: &TronAddress, amount0: i64, amount1: i64) -> PrimitiveLog {
        let mut data = Vec::new();
        data.extend(I256::try_from(amount0).unwrap().to_be_bytes::<32>());
        data.extend(I256::try_from(amount1).unwrap().to_be_bytes::<32>());
        data.extend(U256::from(1u64).to_be_bytes::<32>()); // sqrtPriceX96
        data.extend(U256::from(1u64).to_be_bytes::<32>()); // liquidity
        data.extend([0u8; 32]); // tick
        node_log(
            pool,
            vec![
                topic_hash(IUniswapV3Pool::Swap::SIGNATURE_HASH),
                topic_address(&addr(0x01)),
                topic_address(&addr(0x02)),
            ],
            &data,
        )
        .to_primitive()
        .unwrap()
    }

    async fn run(ctx: &BlockContext, contract: &TronAddress, log: &PrimitiveLog, selector: u32) {
        let event = decode(selector, log).unwrap().unwrap();
        apply(ctx, &log_ctx("tx-1", 0), contract, event).await;
    }

    #[test]
    fn test_selectors() {
        assert_eq!(SWAP, 0xc42079f9);
        assert_eq!(POOL_CREATED, 0x783cca1c);
    }

    #[tokio::test]
    async fn test_swap_buy() {
        let harness = Harness::new();
        let pool = addr(0x70);
        harness.two_token_pair(&pool, (&addr(0x71), 6), (&usdt(), 6));
        let ctx = harness.context(block(100, false), &[]);

        // Pool paid out 4 token0 and received 10 USDT.
        run(&ctx, &pool, &swap_log(&pool, -4_000_000, 10_000_000), SWAP).await;

        let swaps = ctx.state.pair_swaps();
        assert_eq!(swaps.len(), 1);
        assert!(swaps[0].buy);
        assert_eq!(swaps[0].amount0, U256::from(4_000_000u64));
        assert_eq!(swaps[0].amount1, U256::from(10_000_000u64));
        assert_eq!(swaps[0].price_a, BigDecimal::from_str("2.5").unwrap());
        assert_eq!(swaps[0].value_usd, BigDecimal::from_str("10").unwrap());
    }

    #[tokio::test]
    async fn test_swap_sell() {
        let harness = Harness::new();
        let pool = addr(0x70);
        harness.two_token_pair(&pool, (&addr(0x71), 6), (&usdt(), 6));
        let ctx = harness.context(block(100, false), &[]);

        run(&ctx, &pool, &swap_log(&pool, 4_000_000, -10_000_000), SWAP).await;
        let swaps = ctx.state.pair_swaps();
        assert_eq!(swaps.len(), 1);
        assert!(!swaps[0].buy);
    }

    #[tokio::test]
    async fn test_dust_and_zero_dropped() {
        let harness = Harness::new();
        let pool = addr(0x70);
        harness.two_token_pair(&pool, (&addr(0x71), 6), (&usdt(), 6));
        let ctx = harness.context(block(100, false), &[]);

        run(&ctx, &pool, &swap_log(&pool, 1, -10_000_000), SWAP).await;
        run(&ctx, &pool, &swap_log(&pool, 0, -10_000_000), SWAP).await;
        assert!(ctx.state.pair_swaps().is_empty());
    }

    #[tokio::test]
    async fn test_pool_created() {
        let harness = Harness::new();
        let ctx = harness.context(block(100, false), &[]);
        let factory = addr(0x80);
        let mut data = U256::from(60u64).to_be_bytes::<32>().to_vec();
        data.extend_from_slice(addr(0x81).evm().into_word().as_slice());
        let log = node_log(
            &factory,
            vec![
                topic_hash(IUniswapV3Factory::PoolCreated::SIGNATURE_HASH),
                topic_address(&addr(0x71)),
                topic_address(&usdt()),
                topic_uint(3000),
            ],
            &data,
        )
        .to_primitive()
        .unwrap();
        run(&ctx, &factory, &log, POOL_CREATED).await;

        let pairs = ctx.state.new_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].pair, addr(0x81).to_base58());
        assert_eq!(pairs[0].klass, PairKind::UniswapV3);
    }
}
