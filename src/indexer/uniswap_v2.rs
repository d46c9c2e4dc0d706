use alloy::primitives::{Log as PrimitiveLog, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;

use super::context::BlockContext;
use super::dispatcher::selector;
use super::types::{LiquidityKind, LogContext, PairKind};
use super::valuation::SwapQuote;
use crate::codec::amount::abs_diff;
use crate::codec::TronAddress;

sol! {
    interface IUniswapV2Pair {
        event Swap(
            address indexed sender,
            uint256 amount0In,
            uint256 amount1In,
            uint256 amount0Out,
            uint256 amount1Out,
            address indexed to
        );
        event Sync(uint112 reserve0, uint112 reserve1);
        event Mint(address indexed sender, uint256 amount0, uint256 amount1);
        event Burn(address indexed sender, uint256 amount0, uint256 amount1, address indexed to);
    }

    interface IUniswapV2Factory {
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 index);
    }
}

pub const SWAP: u32 = selector(IUniswapV2Pair::Swap::SIGNATURE_HASH);
pub const SYNC: u32 = selector(IUniswapV2Pair::Sync::SIGNATURE_HASH);
pub const MINT: u32 = selector(IUniswapV2Pair::Mint::SIGNATURE_HASH);
pub const BURN: u32 = selector(IUniswapV2Pair::Burn::SIGNATURE_HASH);
pub const PAIR_CREATED: u32 = selector(IUniswapV2Factory::PairCreated::SIGNATURE_HASH);

pub const SELECTORS: [u32; 5] = [SWAP, SYNC, MINT, BURN, PAIR_CREATED];

/// Raw swap legs as the pair reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapAmounts {
    pub amount0_in: U256,
    pub amount1_in: U256,
    pub amount0_out: U256,
    pub amount1_out: U256,
}

impl SwapAmounts {
    /// Net movement of each token through the pool.
    pub fn net(&self) -> (U256, U256) {
        (
            abs_diff(self.amount0_in, self.amount0_out),
            abs_diff(self.amount1_out, self.amount1_in),
        )
    }

    /// An input leg of exactly one raw unit marks dust or spoofed swaps.
    pub fn is_dust(&self) -> bool {
        self.amount0_in == U256::from(1) || self.amount1_in == U256::from(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum V2Event {
    Swap(SwapAmounts),
    Sync { reserve0: U256, reserve1: U256 },
    Liquidity { kind: LiquidityKind, amount0: U256, amount1: U256 },
    PairCreated { pair: TronAddress },
}

/// Buy/sell from the pair's point of view on token0.
pub fn is_buy(amounts: &SwapAmounts) -> bool {
    let zero = U256::ZERO;
    if amounts.amount1_in == zero {
        return false;
    }
    if amounts.amount0_in == zero {
        return true;
    }
    if amounts.amount1_in > zero && amounts.amount0_out > zero {
        return true;
    }
    if amounts.amount0_in > zero && amounts.amount1_out > zero {
        return false;
    }
    false
}

pub fn decode(selector: u32, log: &PrimitiveLog) -> Option<alloy::sol_types::Result<V2Event>> {
    let decoded = match selector {
        SWAP => IUniswapV2Pair::Swap::decode_log(log).map(|e| {
            V2Event::Swap(SwapAmounts {
                amount0_in: e.amount0In,
                amount1_in: e.amount1In,
                amount0_out: e.amount0Out,
                amount1_out: e.amount1Out,
            })
        }),
        SYNC => IUniswapV2Pair::Sync::decode_log(log).map(|e| V2Event::Sync {
            reserve0: U256::from(e.reserve0),
            reserve1: U256::from(e.reserve1),
        }),
        MINT => IUniswapV2Pair::Mint::decode_log(log).map(|e| V2Event::Liquidity {
            kind: LiquidityKind::Mint,
            amount0: e.amount0,
            amount1: e.amount1,
        }),
        BURN => IUniswapV2Pair::Burn::decode_log(log).map(|e| V2Event::Liquidity {
            kind: LiquidityKind::Burn,
            amount0: e.amount0,
            amount1: e.amount1,
        }),
        PAIR_CREATED => IUniswapV2Factory::PairCreated::decode_log(log).map(|e| V2Event::PairCreated {
            pair: TronAddress::from_evm(e.pair),
        }),
        _ => return None,
    };
    Some(decoded)
}

pub async fn apply(ctx: &BlockContext, lctx: &LogContext, contract: &TronAddress, event: V2Event) {
    match event {
        V2Event::PairCreated { pair } => ctx.register_pair(lctx, contract, &pair, PairKind::UniswapV2),
        V2Event::Swap(amounts) => on_swap(ctx, lctx, contract, amounts).await,
        V2Event::Sync { reserve0, reserve1 } => {
            let Some(pair) = ctx.pair(contract, PairKind::UniswapV2, lctx).await else {
                return;
            };
            let Some(quote) =
                SwapQuote::new(&ctx.converter, Some(&pair.address), &pair.token0, &pair.token1, reserve0, reserve1)
            else {
                tracing::warn!(tx = %lctx.tx, pair = %pair.address, %reserve0, %reserve1, "Empty reserves, skipping");
                return;
            };
            let event = ctx.liquidity_event(lctx, &pair.address, LiquidityKind::Sync, reserve0, reserve1, &quote, lctx.wallet());
            ctx.state.add_liquidity(event);
        }
        V2Event::Liquidity { kind, amount0, amount1 } => {
            let Some(pair) = ctx.pair(contract, PairKind::UniswapV2, lctx).await else {
                return;
            };
            let Some(quote) = SwapQuote::new(&ctx.converter, None, &pair.token0, &pair.token1, amount0, amount1) else {
                tracing::warn!(tx = %lctx.tx, pair = %pair.address, %amount0, %amount1, "Zero liquidity amount, skipping");
                return;
            };
            let event = ctx.liquidity_event(lctx, &pair.address, kind, amount0, amount1, &quote, lctx.wallet());
            ctx.state.add_liquidity(event);
        }
    }
}

async fn on_swap(ctx: &BlockContext, lctx: &LogContext, contract: &TronAddress, amounts: SwapAmounts) {
    if amounts.is_dust() {
        tracing::warn!(
            tx = %lctx.tx,
            amount0_in = %amounts.amount0_in,
            amount1_in = %amounts.amount1_in,
            "Dust swap amounts, skipping"
        );
        return;
    }

    let (amount0, amount1) = amounts.net();
    if amount0.is_zero() || amount1.is_zero() {
        tracing::warn!(tx = %lctx.tx, %amount0, %amount1, "Zero swap amount, skipping");
        return;
    }

    let Some(pair) = ctx.pair(contract, PairKind::UniswapV2, lctx).await else {
        return;
    };
    let Some(quote) = SwapQuote::new(&ctx.converter, None, &pair.token0, &pair.token1, amount0, amount1) else {
        tracing::warn!(tx = %lctx.tx, pair = %pair.address, %amount0, %amount1, "Zero swap amount, skipping");
        return;
    };

    let swap = ctx.pair_swap(lctx, &pair.address, amount0, amount1, is_buy(&amounts), &quote, lctx.wallet());
    ctx.state.add_trade(swap);
}
