use parking_lot::Mutex;
use serde::Serialize;

use super::types::{Block, DirectSwap, Holder, LiquidityEvent, NewPair, PairSwap, TransferEvent};

/// Events accumulated while one block is parsed. Append-only; each kind has
/// its own lock so concurrent decoders of different kinds never contend.
#[derive(Debug)]
pub struct BlockState {
    block: Block,
    pair_swaps: Mutex<Vec<PairSwap>>,
    liquidities: Mutex<Vec<LiquidityEvent>>,
    transfers: Mutex<Vec<TransferEvent>>,
    direct_swaps: Mutex<Vec<DirectSwap>>,
    new_pairs: Mutex<Vec<NewPair>>,
    holders: Mutex<Vec<Holder>>,
}

/// Serialized form of a parsed block.
#[derive(Debug, Clone, Serialize)]
pub struct BlockRecord {
    pub direct_swaps: Vec<DirectSwap>,
    pub pair_swaps: Vec<PairSwap>,
    pub liquidity_events: Vec<LiquidityEvent>,
    pub transfer_events: Vec<TransferEvent>,
    pub new_pairs: Vec<NewPair>,
    pub block: Block,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub pair_swaps: usize,
    pub liquidities: usize,
    pub transfers: usize,
    pub direct_swaps: usize,
    pub new_pairs: usize,
    pub holders: usize,
}

impl BlockState {
    pub fn new(block: Block) -> Self {
        Self {
            block,
            pair_swaps: Mutex::new(Vec::new()),
            liquidities: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
            direct_swaps: Mutex::new(Vec::new()),
            new_pairs: Mutex::new(Vec::new()),
            holders: Mutex::new(Vec::new()),
        }
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn add_trade(&self, swap: PairSwap) {
        self.pair_swaps.lock().push(swap);
    }

    pub fn add_liquidity(&self, event: LiquidityEvent) {
        self.liquidities.lock().push(event);
    }

    pub fn add_transfer(&self, event: TransferEvent) {
        self.transfers.lock().push(event);
    }

    pub fn add_direct_swap(&self, swap: DirectSwap) {
        self.direct_swaps.lock().push(swap);
    }

    pub fn register_new_pair(&self, pair: NewPair) {
        self.new_pairs.lock().push(pair);
    }

    pub fn add_holder(&self, holder: Holder) {
        self.holders.lock().push(holder);
    }

    /// Hand the holder deltas to the publisher; they are not kept.
    pub fn take_holders(&self) -> Vec<Holder> {
        std::mem::take(&mut *self.holders.lock())
    }

    pub fn counts(&self) -> StateCounts {
        StateCounts {
            pair_swaps: self.pair_swaps.lock().len(),
            liquidities: self.liquidities.lock().len(),
            transfers: self.transfers.lock().len(),
            direct_swaps: self.direct_swaps.lock().len(),
            new_pairs: self.new_pairs.lock().len(),
            holders: self.holders.lock().len(),
        }
    }

    pub fn to_record(&self) -> BlockRecord {
        BlockRecord {
            direct_swaps: self.direct_swaps.lock().clone(),
            pair_swaps: self.pair_swaps.lock().clone(),
            liquidity_events: self.liquidities.lock().clone(),
            transfer_events: self.transfers.lock().clone(),
            new_pairs: self.new_pairs.lock().clone(),
            block: self.block.clone(),
        }
    }

    pub fn pair_swaps(&self) -> Vec<PairSwap> {
        self.pair_swaps.lock().clone()
    }

    pub fn liquidities(&self) -> Vec<LiquidityEvent> {
        self.liquidities.lock().clone()
    }

    pub fn direct_swaps(&self) -> Vec<DirectSwap> {
        self.direct_swaps.lock().clone()
    }

    pub fn transfers(&self) -> Vec<TransferEvent> {
        self.transfers.lock().clone()
    }

    pub fn new_pairs(&self) -> Vec<NewPair> {
        self.new_pairs.lock().clone()
    }
}
