//! SWFT bridge swaps: a direct token-for-token swap with no pair contract.

use alloy::primitives::{Log as PrimitiveLog, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;

use super::context::BlockContext;
use super::dispatcher::selector;
use super::types::{DirectSwap, LogContext, Token};
use super::valuation::SwapQuote;
use crate::codec::TronAddress;

pub const PROTOCOL: &str = "swftswap";

sol! {
    interface ISwftSwap {
        event Swap(
            address fromToken,
            string toToken,
            address sender,
            string destination,
            uint256 fromAmount,
            uint256 minReturnAmount
        );
    }
}

pub const SWAP: u32 = selector(ISwftSwap::Swap::SIGNATURE_HASH);

pub const SELECTORS: [u32; 1] = [SWAP];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwftSwap {
    pub src_token: TronAddress,
    /// Destination token as written by the bridge; parsed when applied.
    pub destination: String,
    pub sender: TronAddress,
    pub from_amount: U256,
    pub min_return_amount: U256,
}

pub fn decode(selector: u32, log: &PrimitiveLog) -> Option<alloy::sol_types::Result<SwftSwap>> {
    if selector != SWAP {
        return None;
    }
    Some(ISwftSwap::Swap::decode_log(log).map(|e| SwftSwap {
        src_token: TronAddress::from_evm(e.fromToken),
        destination: e.destination.clone(),
        sender: TronAddress::from_evm(e.sender),
        from_amount: e.fromAmount,
        min_return_amount: e.minReturnAmount,
    }))
}

pub async fn apply(ctx: &BlockContext, lctx: &LogContext, swap: SwftSwap) {
    let dst_token = match TronAddress::parse(&swap.destination) {
        Ok(address) => address,
        Err(e) => {
            tracing::debug!(tx = %lctx.tx, destination = %swap.destination, error = %e, "Unreadable swap destination");
            return;
        }
    };

    let (src_decimals, dst_decimals) = futures::join!(
        ctx.resolver.token_decimals(&swap.src_token),
        ctx.resolver.token_decimals(&dst_token),
    );
    let (Some(src_decimals), Some(dst_decimals)) = (src_decimals, dst_decimals) else {
        tracing::error!(tx = %lctx.tx, src = %swap.src_token, dst = %dst_token, "Could not get token decimals, skipping");
        return;
    };
    let src = Token::new(&swap.src_token, src_decimals);
    let dst = Token::new(&dst_token, dst_decimals);

    let Some(quote) = SwapQuote::new(&ctx.converter, None, &src, &dst, swap.from_amount, swap.min_return_amount) else {
        tracing::warn!(
            tx = %lctx.tx,
            from_amount = %swap.from_amount,
            min_return = %swap.min_return_amount,
            "Zero swap amount, skipping"
        );
        return;
    };

    ctx.state.add_direct_swap(DirectSwap {
        tx: lctx.tx.clone(),
        date: lctx.date(),
        chain: ctx.network().to_string(),
        block_number: ctx.height(),
        protocol: PROTOCOL.to_string(),
        src_token: src.address,
        dst_token: dst.address,
        amount0: swap.from_amount,
        amount1: swap.min_return_amount,
        value_usd: quote.trade_value(),
        price_a: quote.price_a,
        price_a_usd: quote.price_a_usd,
        price_b: quote.price_b,
        price_b_usd: quote.price_b_usd,
        wallet: swap.sender.to_base58(),
        order: lctx.order,
    });
}
