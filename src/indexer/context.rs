use alloy::primitives::U256;
use bigdecimal::{BigDecimal, Zero};
use std::collections::HashSet;
use std::sync::Arc;

use super::state::BlockState;
use super::types::{Block, LiquidityEvent, LiquidityKind, LogContext, NewPair, Pair, PairKind, PairSwap};
use super::valuation::SwapQuote;
use crate::codec::TronAddress;
use crate::pricing::FiatConverter;
use crate::tokens::PairResolver;

/// Everything a decoder needs while one block is being parsed.
pub struct BlockContext {
    pub block: Block,
    /// Node endpoint recorded on new-pair listings.
    pub node: String,
    pub state: BlockState,
    pub converter: FiatConverter,
    pub resolver: Arc<PairResolver>,
    /// Classic pairs whose reserve snapshots also price the native currency.
    pub reference_pairs: Arc<HashSet<String>>,
}

impl BlockContext {
    pub fn network(&self) -> &str {
        &self.block.network
    }

    pub fn height(&self) -> u64 {
        self.block.number
    }

    pub fn is_reference_pair(&self, pair: &str) -> bool {
        self.reference_pairs.contains(pair)
    }

    /// Resolve a pair, logging the failure. Callers skip the event on `None`.
    pub async fn pair(&self, address: &TronAddress, kind: PairKind, lctx: &LogContext) -> Option<Pair> {
        let pair = self.resolver.resolve_pair(address, kind).await;
        if pair.is_none() {
            tracing::error!(
                block = self.height(),
                tx = %lctx.tx,
                pair = %address,
                class = %kind,
                "Could not resolve pair, skipping event"
            );
        }
        pair
    }

    pub fn pair_swap(
        &self,
        lctx: &LogContext,
        pair: &str,
        amount0: U256,
        amount1: U256,
        buy: bool,
        quote: &SwapQuote,
        wallet: String,
    ) -> PairSwap {
        PairSwap {
            tx: lctx.tx.clone(),
            date: lctx.date(),
            chain: self.network().to_string(),
            block_number: self.height(),
            pair: pair.to_string(),
            amount0,
            amount1,
            buy,
            price_a: quote.price_a.clone(),
            price_a_usd: quote.price_a_usd.clone(),
            price_b: quote.price_b.clone(),
            price_b_usd: quote.price_b_usd.clone(),
            bot: false,
            wallet,
            order: lctx.order,
            value_usd: quote.trade_value(),
        }
    }

    /// Sync events carry reserves and a pool value; mint and burn carry
    /// amounts and a trade value.
    pub fn liquidity_event(
        &self,
        lctx: &LogContext,
        pair: &str,
        klass: LiquidityKind,
        raw0: U256,
        raw1: U256,
        quote: &SwapQuote,
        wallet: String,
    ) -> LiquidityEvent {
        let (amounts, reserves, value_usd, reserve_usd) = match klass {
            LiquidityKind::Sync => ((U256::ZERO, U256::ZERO), (raw0, raw1), BigDecimal::zero(), quote.reserve_value()),
            LiquidityKind::Mint | LiquidityKind::Burn => {
                ((raw0, raw1), (U256::ZERO, U256::ZERO), quote.trade_value(), BigDecimal::zero())
            }
        };
        LiquidityEvent {
            block_number: self.height(),
            date: lctx.date(),
            tx: lctx.tx.clone(),
            pair: pair.to_string(),
            chain: self.network().to_string(),
            klass,
            wallet,
            order: lctx.order,
            amount0: amounts.0,
            amount1: amounts.1,
            reserve0: reserves.0,
            reserve1: reserves.1,
            price: quote.price_a.clone(),
            price_usd: quote.price_a_usd.clone(),
            value_usd,
            reserve_usd,
        }
    }

    pub fn register_pair(&self, lctx: &LogContext, factory: &TronAddress, pair: &TronAddress, klass: PairKind) {
        tracing::debug!(block = self.height(), pair = %pair, class = %klass, "New pair listed");
        self.state.register_new_pair(NewPair {
            factory: factory.to_base58(),
            pair: pair.to_base58(),
            klass,
            network: self.network().to_string(),
            node: self.node.clone(),
            pool_created: lctx.timestamp,
        });
    }
}
