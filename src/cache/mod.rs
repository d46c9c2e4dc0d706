pub mod memory;
pub mod pairs;
pub mod redis_cache;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::indexer::types::PairKind;

pub use self::memory::MemoryCache;
pub use self::pairs::PairsCache;
pub use self::redis_cache::RedisCache;

/// Key-value store shared across blocks (and across processes when backed by Redis).
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> eyre::Result<Option<String>>;

    /// `ttl = None` keeps the value until overwritten.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> eyre::Result<()>;

    async fn hash_get_all(&self, key: &str) -> eyre::Result<HashMap<String, String>>;

    /// Overwrite the given fields; other fields of the hash are left alone.
    async fn hash_set(&self, key: &str, fields: Vec<(String, String)>) -> eyre::Result<()>;
}

/// The class is part of the key: one address resolves differently per class.
pub fn pair_key(network: &str, kind: PairKind, pair: &str) -> String {
    format!("parser:{}:pair:{}:{}", network, kind, pair)
}

pub fn prices_key(network: &str, height: u64) -> String {
    format!("parser:prices:{}:{}", network, height)
}

pub fn live_prices_key(network: &str) -> String {
    format!("parser:prices:{}:live", network)
}
