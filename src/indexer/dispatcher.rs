use alloy::primitives::B256;

use super::context::BlockContext;
use super::types::LogContext;
use super::{aggregator, classic, transfer, uniswap_v2, uniswap_v3};
use crate::codec::TronAddress;
use crate::node::types::Log;

/// First four bytes of an event signature hash, as the node's topic hex starts.
pub const fn selector(hash: B256) -> u32 {
    u32::from_be_bytes([hash.0[0], hash.0[1], hash.0[2], hash.0[3]])
}

/// A log decoded into exactly one protocol's event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLog {
    Transfer(transfer::TokenTransfer),
    Classic(classic::ClassicEvent),
    UniswapV2(uniswap_v2::V2Event),
    UniswapV3(uniswap_v3::V3Event),
    Aggregator(aggregator::SwftSwap),
}

pub fn is_known(selector: u32) -> bool {
    selector == transfer::TRANSFER
        || classic::SELECTORS.contains(&selector)
        || uniswap_v2::SELECTORS.contains(&selector)
        || uniswap_v3::SELECTORS.contains(&selector)
        || aggregator::SELECTORS.contains(&selector)
}

/// Route a log by its signature. Unknown signatures and logs without topics
/// are dropped silently; malformed payloads of known events are logged.
pub fn decode(log: &Log) -> Option<(TronAddress, DecodedLog)> {
    let selector = log.selector()?;
    if !is_known(selector) {
        return None;
    }

    let raw = match log.to_primitive() {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(selector = %format!("{:#010x}", selector), error = %e, "Malformed log");
            return None;
        }
    };

    let decoded = if selector == transfer::TRANSFER {
        Some(transfer::decode(&raw).map(DecodedLog::Transfer))
    } else {
        classic::decode(selector, &raw)
            .map(|r| r.map(DecodedLog::Classic))
            .or_else(|| uniswap_v2::decode(selector, &raw).map(|r| r.map(DecodedLog::UniswapV2)))
            .or_else(|| uniswap_v3::decode(selector, &raw).map(|r| r.map(DecodedLog::UniswapV3)))
            .or_else(|| aggregator::decode(selector, &raw).map(|r| r.map(DecodedLog::Aggregator)))
    };

    match decoded? {
        Ok(event) => Some((TronAddress::from_evm(raw.address), event)),
        Err(e) => {
            tracing::debug!(selector = %format!("{:#010x}", selector), error = %e, "Unpack error");
            None
        }
    }
}

pub async fn apply(ctx: &BlockContext, lctx: &LogContext, contract: &TronAddress, event: DecodedLog) {
    match event {
        DecodedLog::Transfer(t) => transfer::apply(ctx, lctx, contract, t),
        DecodedLog::Classic(e) => classic::apply(ctx, lctx, contract, e).await,
        DecodedLog::UniswapV2(e) => uniswap_v2::apply(ctx, lctx, contract, e).await,
        DecodedLog::UniswapV3(e) => uniswap_v3::apply(ctx, lctx, contract, e).await,
        DecodedLog::Aggregator(e) => aggregator::apply(ctx, lctx, e).await,
    }
}

/// Decode and apply one log.
pub async fn process_log(ctx: &BlockContext, lctx: &LogContext, log: &Log) {
    if let Some((contract, event)) = decode(log) {
        apply(ctx, lctx, &contract, event).await;
    }
}
