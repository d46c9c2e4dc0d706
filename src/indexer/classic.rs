//! Exchange-per-token AMM (JustSwap-style): every exchange trades one token
//! against TRX and reports all amounts in indexed topics.

use alloy::primitives::{Log as PrimitiveLog, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use bigdecimal::Zero;

use super::context::BlockContext;
use super::dispatcher::selector;
use super::types::{LiquidityKind, LogContext, PairKind, NATIVE_SYMBOL};
use super::valuation::SwapQuote;
use crate::codec::TronAddress;

sol! {
    interface IJustswapExchange {
        event TokenPurchase(address indexed buyer, uint256 indexed trx_sold, uint256 indexed tokens_bought);
        event TrxPurchase(address indexed buyer, uint256 indexed tokens_sold, uint256 indexed trx_bought);
        event AddLiquidity(address indexed provider, uint256 indexed trx_amount, uint256 indexed token_amount);
        event RemoveLiquidity(address indexed provider, uint256 indexed trx_amount, uint256 indexed token_amount);
        event Snapshot(address indexed operator, uint256 indexed trx_balance, uint256 indexed token_balance);
    }

    interface IJustswapFactory {
        event NewExchange(address indexed exchange, address indexed token);
    }
}

pub const TOKEN_PURCHASE: u32 = selector(IJustswapExchange::TokenPurchase::SIGNATURE_HASH);
pub const TRX_PURCHASE: u32 = selector(IJustswapExchange::TrxPurchase::SIGNATURE_HASH);
pub const ADD_LIQUIDITY: u32 = selector(IJustswapExchange::AddLiquidity::SIGNATURE_HASH);
pub const REMOVE_LIQUIDITY: u32 = selector(IJustswapExchange::RemoveLiquidity::SIGNATURE_HASH);
pub const SNAPSHOT: u32 = selector(IJustswapExchange::Snapshot::SIGNATURE_HASH);
pub const NEW_EXCHANGE: u32 = selector(IJustswapFactory::NewExchange::SIGNATURE_HASH);

pub const SELECTORS: [u32; 6] = [TOKEN_PURCHASE, TRX_PURCHASE, ADD_LIQUIDITY, REMOVE_LIQUIDITY, SNAPSHOT, NEW_EXCHANGE];

/// Classic exchange events with amounts split into token and TRX sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassicEvent {
    /// `buy` is true when TRX was sold for tokens.
    Purchase {
        wallet: TronAddress,
        tokens: U256,
        trx: U256,
        buy: bool,
    },
    Liquidity {
        provider: TronAddress,
        kind: LiquidityKind,
        tokens: U256,
        trx: U256,
    },
    Snapshot { tokens: U256, trx: U256 },
    NewExchange { exchange: TronAddress },
}

pub fn decode(selector: u32, log: &PrimitiveLog) -> Option<alloy::sol_types::Result<ClassicEvent>> {
    let decoded = match selector {
        TOKEN_PURCHASE => IJustswapExchange::TokenPurchase::decode_log(log).map(|e| ClassicEvent::Purchase {
            wallet: TronAddress::from_evm(e.buyer),
            tokens: e.tokens_bought,
            trx: e.trx_sold,
            buy: true,
        }),
        TRX_PURCHASE => IJustswapExchange::TrxPurchase::decode_log(log).map(|e| ClassicEvent::Purchase {
            wallet: TronAddress::from_evm(e.buyer),
            tokens: e.tokens_sold,
            trx: e.trx_bought,
            buy: false,
        }),
        ADD_LIQUIDITY => IJustswapExchange::AddLiquidity::decode_log(log).map(|e| ClassicEvent::Liquidity {
            provider: TronAddress::from_evm(e.provider),
            kind: LiquidityKind::Mint,
            tokens: e.token_amount,
            trx: e.trx_amount,
        }),
        REMOVE_LIQUIDITY => IJustswapExchange::RemoveLiquidity::decode_log(log).map(|e| ClassicEvent::Liquidity {
            provider: TronAddress::from_evm(e.provider),
            kind: LiquidityKind::Burn,
            tokens: e.token_amount,
            trx: e.trx_amount,
        }),
        SNAPSHOT => IJustswapExchange::Snapshot::decode_log(log).map(|e| ClassicEvent::Snapshot {
            tokens: e.token_balance,
            trx: e.trx_balance,
        }),
        NEW_EXCHANGE => IJustswapFactory::NewExchange::decode_log(log).map(|e| ClassicEvent::NewExchange {
            exchange: TronAddress::from_evm(e.exchange),
        }),
        _ => return None,
    };
    Some(decoded)
}

pub async fn apply(ctx: &BlockContext, lctx: &LogContext, contract: &TronAddress, event: ClassicEvent) {
    if let ClassicEvent::NewExchange { exchange } = event {
        ctx.register_pair(lctx, contract, &exchange, PairKind::Classic);
        return;
    }

    let Some(pair) = ctx.pair(contract, PairKind::Classic, lctx).await else {
        return;
    };

    match event {
        ClassicEvent::Purchase { wallet, tokens, trx, buy } => {
            let Some(quote) = SwapQuote::new(&ctx.converter, None, &pair.token0, &pair.token1, tokens, trx) else {
                tracing::warn!(tx = %lctx.tx, pair = %pair.address, %tokens, %trx, "Zero swap amount, skipping");
                return;
            };
            let swap = ctx.pair_swap(lctx, &pair.address, tokens, trx, buy, &quote, wallet.to_base58());
            ctx.state.add_trade(swap);
        }
        ClassicEvent::Liquidity { provider, kind, tokens, trx } => {
            let Some(quote) = SwapQuote::new(&ctx.converter, None, &pair.token0, &pair.token1, tokens, trx) else {
                tracing::warn!(tx = %lctx.tx, pair = %pair.address, %tokens, %trx, "Zero liquidity amount, skipping");
                return;
            };
            let event = ctx.liquidity_event(lctx, &pair.address, kind, tokens, trx, &quote, provider.to_base58());
            ctx.state.add_liquidity(event);
        }
        ClassicEvent::Snapshot { tokens, trx } => {
            let Some(quote) =
                SwapQuote::new(&ctx.converter, Some(&pair.address), &pair.token0, &pair.token1, tokens, trx)
            else {
                tracing::warn!(tx = %lctx.tx, pair = %pair.address, %tokens, %trx, "Empty reserves, skipping");
                return;
            };

            // Reserve snapshots are the authoritative price source for the token.
            if !quote.price_a_usd.is_zero() {
                ctx.converter.update_token_usd_price(&pair.token0.address, quote.price_a_usd.clone());
            }
            if ctx.is_reference_pair(&pair.address) && !quote.price_b_usd.is_zero() {
                ctx.converter.update_token_usd_price(NATIVE_SYMBOL, quote.price_b_usd.clone());
            }

            let event = ctx.liquidity_event(lctx, &pair.address, LiquidityKind::Sync, tokens, trx, &quote, lctx.wallet());
            ctx.state.add_liquidity(event);
        }
        ClassicEvent::NewExchange { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, block, log_ctx, node_log, topic_address, topic_hash, topic_uint, usdt, Harness};
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn classic_log(contract: &TronAddress, signature: alloy::primitives::B256, who: &TronAddress, a: u64, b: u64) -> PrimitiveLog {
        node_log(
            contract,
            vec![topic_hash(signature), topic_address(who), topic_uint(a), topic_uint(b)],
            &[],
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
        assert_eq!(TOKEN_PURCHASE, 0xcd60aa75);
        assert_eq!(TRX_PURCHASE, 0xdad9ec5c);
        assert_eq!(SNAPSHOT, 0xcc7244d3);
        assert_eq!(ADD_LIQUIDITY, 0x06239653);
        assert_eq!(REMOVE_LIQUIDITY, 0x0fbf06c0);
        assert_eq!(NEW_EXCHANGE, 0x9d42cb01);
    }

    #[test]
    fn test_other_selector_not_claimed() {
        let log = classic_log(&addr(0x10), IJustswapExchange::TokenPurchase::SIGNATURE_HASH, &addr(0xaa), 1, 1);
        assert!(decode(0xddf252ad, &log).is_none());
    }

    #[tokio::test]
    async fn test_token_purchase() {
        let harness = Harness::new();
        let (pair, token) = (addr(0x10), addr(0x20));
        harness.classic_pair(&pair, &token, 8);
        let ctx = harness.context(block(100, false), &[]);
        ctx.converter.update_token_usd_price(NATIVE_SYMBOL, dec("0.1"));

        // 2 TRX sold for 5 tokens
        let log = classic_log(&pair, IJustswapExchange::TokenPurchase::SIGNATURE_HASH, &addr(0xbb), 2_000_000, 500_000_000);
        run(&ctx, &pair, &log, TOKEN_PURCHASE).await;

        let swaps = ctx.state.pair_swaps();
        assert_eq!(swaps.len(), 1);
        let swap = &swaps[0];
        assert!(swap.buy);
        assert_eq!(swap.amount0, U256::from(500_000_000u64));
        assert_eq!(swap.amount1, U256::from(2_000_000u64));
        assert_eq!(swap.price_a, dec("0.4"));
        assert_eq!(swap.wallet, addr(0xbb).to_base58());
        assert_eq!(swap.value_usd, dec("0.2"));
        assert_eq!(swap.pair, pair.to_base58());
    }

    #[tokio::test]
    async fn test_trx_purchase_is_sell() {
        let harness = Harness::new();
        let (pair, token) = (addr(0x10), addr(0x20));
        harness.classic_pair(&pair, &token, 6);
        let ctx = harness.context(block(100, false), &[]);

        let log = classic_log(&pair, IJustswapExchange::TrxPurchase::SIGNATURE_HASH, &addr(0xbb), 3_000_000, 1_000_000);
        run(&ctx, &pair, &log, TRX_PURCHASE).await;

        let swaps = ctx.state.pair_swaps();
        assert_eq!(swaps.len(), 1);
        assert!(!swaps[0].buy);
        assert_eq!(swaps[0].amount0, U256::from(3_000_000u64));
        assert_eq!(swaps[0].amount1, U256::from(1_000_000u64));
        // TRX unpriced: value unknown, not an error.
        assert!(swaps[0].value_usd.is_zero());
    }

    #[tokio::test]
    async fn test_zero_amount_dropped() {
        let harness = Harness::new();
        let (pair, token) = (addr(0x10), addr(0x20));
        harness.classic_pair(&pair, &token, 8);
        let ctx = harness.context(block(100, false), &[]);

        let log = classic_log(&pair, IJustswapExchange::TokenPurchase::SIGNATURE_HASH, &addr(0xbb), 2_000_000, 0);
        run(&ctx, &pair, &log, TOKEN_PURCHASE).await;
        assert!(ctx.state.pair_swaps().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_pair_dropped() {
        let harness = Harness::new();
        let ctx = harness.context(block(100, false), &[]);
        let pair = addr(0x10);

        let log = classic_log(&pair, IJustswapExchange::TokenPurchase::SIGNATURE_HASH, &addr(0xbb), 2_000_000, 5);
        run(&ctx, &pair, &log, TOKEN_PURCHASE).await;
        assert_eq!(ctx.state.counts(), Default::default());
    }

    #[tokio::test]
    async fn test_reference_snapshot_prices_trx() {
        let harness = Harness::new();
        let pair = addr(0x30);
        harness.classic_pair(&pair, &usdt(), 6);
        let ctx = harness.context(block(100, false), &[&pair]);

        // 1000 USDT against 12500 TRX
        let log = classic_log(&pair, IJustswapExchange::Snapshot::SIGNATURE_HASH, &addr(0xcc), 12_500_000_000, 1_000_000_000);
        run(&ctx, &pair, &log, SNAPSHOT).await;

        assert_eq!(ctx.converter.price_of_token(NATIVE_SYMBOL), dec("0.08"));
        let events = ctx.state.liquidities();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].klass, LiquidityKind::Sync);
        assert_eq!(events[0].reserve0, U256::from(1_000_000_000u64));
        assert_eq!(events[0].reserve1, U256::from(12_500_000_000u64));
        assert_eq!(events[0].reserve_usd, dec("2000"));
    }

    #[tokio::test]
    async fn test_snapshot_outside_reference_list_keeps_trx() {
        let harness = Harness::new();
        let pair = addr(0x30);
        harness.classic_pair(&pair, &usdt(), 6);
        let ctx = harness.context(block(100, false), &[]);
        ctx.converter.update_token_usd_price(NATIVE_SYMBOL, dec("0.1"));

        let log = classic_log(&pair, IJustswapExchange::Snapshot::SIGNATURE_HASH, &addr(0xcc), 12_500_000_000, 1_000_000_000);
        run(&ctx, &pair, &log, SNAPSHOT).await;
        assert_eq!(ctx.converter.price_of_token(NATIVE_SYMBOL), dec("0.1"));
    }

    #[tokio::test]
    async fn test_snapshot_prices_token() {
        let harness = Harness::new();
        let (pair, token) = (addr(0x10), addr(0x20));
        harness.classic_pair(&pair, &token, 6);
        let ctx = harness.context(block(100, false), &[]);
        ctx.converter.update_token_usd_price(NATIVE_SYMBOL, dec("0.1"));

        // 100 tokens against 300 TRX: 3 TRX per token
        let log = classic_log(&pair, IJustswapExchange::Snapshot::SIGNATURE_HASH, &addr(0xcc), 300_000_000, 100_000_000);
        run(&ctx, &pair, &log, SNAPSHOT).await;
        assert_eq!(ctx.converter.price_of_token(&token.to_base58()), dec("0.3"));
    }

    #[tokio::test]
    async fn test_add_liquidity() {
        let harness = Harness::new();
        let (pair, token) = (addr(0x10), addr(0x20));
        harness.classic_pair(&pair, &token, 6);
        let ctx = harness.context(block(100, false), &[]);

        let log = classic_log(&pair, IJustswapExchange::AddLiquidity::SIGNATURE_HASH, &addr(0xdd), 4_000_000, 2_000_000);
        run(&ctx, &pair, &log, ADD_LIQUIDITY).await;

        let events = ctx.state.liquidities();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].klass, LiquidityKind::Mint);
        assert_eq!(events[0].amount0, U256::from(2_000_000u64));
        assert_eq!(events[0].amount1, U256::from(4_000_000u64));
        assert_eq!(events[0].wallet, addr(0xdd).to_base58());
        assert!(events[0].reserve0.is_zero());
    }

    #[tokio::test]
    async fn test_new_exchange_registers_pair() {
        let harness = Harness::new();
        let ctx = harness.context(block(100, false), &[]);
        let factory = addr(0x40);
        let log = node_log(
            &factory,
            vec![
                topic_hash(IJustswapFactory::NewExchange::SIGNATURE_HASH),
                topic_address(&addr(0x41)),
                topic_address(&addr(0x42)),
            ],
            &[],
        )
        .to_primitive()
        .unwrap();
        run(&ctx, &factory, &log, NEW_EXCHANGE).await;

        let pairs = ctx.state.new_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].pair, addr(0x41).to_base58());
        assert_eq!(pairs[0].factory, factory.to_base58());
        assert_eq!(pairs[0].klass, PairKind::Classic);
        assert_eq!(pairs[0].node, "http://fake-node");
    }
}
