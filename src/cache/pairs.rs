use std::sync::Arc;
use std::time::Duration;

use super::{pair_key, Cache};
use crate::indexer::types::{Pair, PairKind};

/// Typed view over the shared cache for resolved pairs. Read errors and
/// undecodable entries count as misses.
#[derive(Clone)]
pub struct PairsCache {
    cache: Arc<dyn Cache>,
    network: String,
    ttl: Duration,
}

impl PairsCache {
    pub fn new(cache: Arc<dyn Cache>, network: &str, ttl: Duration) -> Self {
        Self {
            cache,
            network: network.to_string(),
            ttl,
        }
    }

    pub async fn get(&self, address: &str, kind: PairKind) -> Option<Pair> {
        let key = pair_key(&self.network, kind, address);
        let raw = match self.cache.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(pair = %address, error = %e, "Pair cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(pair) => Some(pair),
            Err(e) => {
                tracing::warn!(pair = %address, error = %e, "Discarding undecodable pair cache entry");
                None
            }
        }
    }

    pub async fn store(&self, pair: &Pair) -> eyre::Result<()> {
        let key = pair_key(&self.network, pair.klass, &pair.address);
        let value = serde_json::to_string(pair)?;
        self.cache.set(&key, value, Some(self.ttl)).await
    }
}
