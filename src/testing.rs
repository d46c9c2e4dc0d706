//! Shared fixtures for unit tests.

use alloy::primitives::{Address, B256, U256};
use bigdecimal::BigDecimal;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, MemoryCache, PairsCache};
use crate::codec::TronAddress;
use crate::config::TokensConfig;
use crate::indexer::context::BlockContext;
use crate::indexer::state::BlockState;
use crate::indexer::types::{Block, LogContext};
use crate::node::contracts::{TOKEN0, TOKEN1, TOKEN_ADDRESS};
use crate::node::fake::FakeChain;
use crate::node::types::{
    ContractCall, ContractParameter, ContractValue, Log, Transaction, TransactionRaw, TransactionRet, SUCCESS,
    TRANSFER_CONTRACT,
};
use crate::pricing::quotes::{QuoteKind, QuotePair};
use crate::pricing::{FiatConverter, QuoteConfig};
use crate::tokens::{PairResolver, TokenRegistry};

pub const USDT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

pub fn addr(byte: u8) -> TronAddress {
    TronAddress::from_evm(Address::repeat_byte(byte))
}

pub fn usdt() -> TronAddress {
    TronAddress::parse(USDT).unwrap()
}

pub fn block(number: u64, notify: bool) -> Block {
    Block {
        kind: "block".to_string(),
        network: "TRON".to_string(),
        number,
        node: String::new(),
        notify,
        timestamp: 1_680_000_000,
    }
}

/// USDT pinned at 1; TRX priced from whatever the block observes.
pub fn quotes() -> QuoteConfig {
    QuoteConfig {
        quotes: vec![
            QuotePair {
                title: "USDT".to_string(),
                token: USDT.to_string(),
                kind: QuoteKind::Stable,
                flipped: false,
                pair: None,
                before: None,
                after: None,
            },
            QuotePair {
                title: "TRX".to_string(),
                token: "TRX".to_string(),
                kind: QuoteKind::Normal,
                flipped: false,
                pair: None,
                before: None,
                after: None,
            },
        ],
    }
}

pub fn converter_with_trx(rate: BigDecimal) -> FiatConverter {
    let converter = FiatConverter::new(Arc::new(MemoryCache::new()), &block(100, false), &quotes(), Duration::from_secs(30));
    converter.update_token_usd_price("TRX", rate);
    converter
}

pub fn log_ctx(tx: &str, order: u32) -> LogContext {
    LogContext {
        tx: tx.to_string(),
        timestamp: 1_680_000_000,
        owner: Some(addr(0xaa)),
        order,
    }
}

/// Scripted node + in-memory cache wired into a resolver.
pub struct Harness {
    pub chain: Arc<FakeChain>,
    pub cache: Arc<MemoryCache>,
    pub resolver: Arc<PairResolver>,
}

impl Harness {
    pub fn new() -> Self {
        let chain = Arc::new(FakeChain::new());
        let cache = Arc::new(MemoryCache::new());
        let pairs = PairsCache::new(cache.clone(), "TRON", Duration::from_secs(3600));
        let resolver = PairResolver::new(
            chain.clone(),
            pairs,
            Arc::new(TokenRegistry::new()),
            &TokensConfig::default(),
        )
        .unwrap();
        Self {
            chain,
            cache,
            resolver: Arc::new(resolver),
        }
    }

    pub fn shared_cache(&self) -> Arc<dyn Cache> {
        self.cache.clone()
    }

    /// Classic exchange `pair` trading `token` against TRX.
    pub fn classic_pair(&self, pair: &TronAddress, token: &TronAddress, decimals: u8) {
        self.chain.set_address_call(pair, TOKEN_ADDRESS, token);
        self.chain.set_decimals(token, decimals);
    }

    pub fn two_token_pair(&self, pair: &TronAddress, token0: (&TronAddress, u8), token1: (&TronAddress, u8)) {
        self.chain.set_address_call(pair, TOKEN0, token0.0);
        self.chain.set_address_call(pair, TOKEN1, token1.0);
        self.chain.set_decimals(token0.0, token0.1);
        self.chain.set_decimals(token1.0, token1.1);
    }

    pub fn context(&self, block: Block, reference_pairs: &[&TronAddress]) -> BlockContext {
        self.context_with_quotes(block, reference_pairs, &quotes())
    }

    pub fn context_with_quotes(&self, block: Block, reference_pairs: &[&TronAddress], quotes: &QuoteConfig) -> BlockContext {
        let converter = FiatConverter::new(self.shared_cache(), &block, quotes, Duration::from_secs(30));
        BlockContext {
            node: "http://fake-node".to_string(),
            state: BlockState::new(block.clone()),
            block,
            converter,
            resolver: self.resolver.clone(),
            reference_pairs: Arc::new(reference_pairs.iter().map(|a| a.to_base58()).collect::<HashSet<_>>()),
        }
    }
}

pub fn topic_hash(hash: B256) -> String {
    hex::encode(hash)
}

pub fn topic_address(address: &TronAddress) -> String {
    hex::encode(address.evm().into_word())
}

pub fn topic_uint(value: u64) -> String {
    hex::encode(U256::from(value).to_be_bytes::<32>())
}

/// Node-style log: bare hex, 20-byte emitter address.
pub fn node_log(contract: &TronAddress, topics: Vec<String>, data: &[u8]) -> Log {
    Log {
        address: hex::encode(contract.evm()),
        topics,
        data: hex::encode(data),
    }
}

/// Successful transaction whose first contract call has type `kind`.
pub fn contract_tx(id: &str, owner: &TronAddress, kind: &str) -> Transaction {
    Transaction {
        ret: vec![TransactionRet {
            contract_ret: SUCCESS.to_string(),
        }],
        tx_id: id.to_string(),
        raw_data: TransactionRaw {
            contract: vec![ContractCall {
                parameter: ContractParameter {
                    value: ContractValue {
                        owner_address: owner.to_hex(),
                        ..Default::default()
                    },
                },
                kind: kind.to_string(),
            }],
            timestamp: 1_680_000_123_000,
        },
    }
}

pub fn trx_transfer(id: &str, from: &TronAddress, to: &TronAddress, amount: i64) -> Transaction {
    let mut tx = contract_tx(id, from, TRANSFER_CONTRACT);
    let value = &mut tx.raw_data.contract[0].parameter.value;
    value.to_address = Some(to.to_hex());
    value.amount = Some(amount);
    tx
}
