use bigdecimal::{BigDecimal, One, Zero};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::quotes::{QuoteConfig, QuoteKind};
use crate::cache::{live_prices_key, prices_key, Cache};
use crate::codec::amount::div_or_zero;
use crate::indexer::types::Block;

/// Persisted per-block price table, read back by the next block.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PriceSnapshot {
    prices: HashMap<String, BigDecimal>,
}

#[derive(Debug, Default)]
struct QuoteLists {
    supported: HashSet<String>,
    pairs: HashSet<String>,
    flips: HashMap<String, bool>,
}

/// Block-scoped token -> USD rate table.
///
/// Seeded from the quote table, the live hash (notify blocks only) and the
/// previous block's snapshot; updated concurrently by decoders; written back
/// by [`FiatConverter::commit`]. Stable tokens always price at exactly 1.
pub struct FiatConverter {
    cache: Arc<dyn Cache>,
    network: String,
    height: u64,
    notify: bool,
    snapshot_ttl: Duration,
    prices: RwLock<HashMap<String, BigDecimal>>,
    lists: RwLock<QuoteLists>,
    stables: Mutex<HashSet<String>>,
}

impl FiatConverter {
    /// Seed from the quote table only.
    pub fn new(cache: Arc<dyn Cache>, block: &Block, quotes: &QuoteConfig, snapshot_ttl: Duration) -> Self {
        let mut prices = HashMap::new();
        let mut lists = QuoteLists::default();
        let mut stables = HashSet::new();

        for quote in quotes.active(block.number) {
            let token = quote.token_key();
            if quote.kind == QuoteKind::Stable {
                prices.insert(token.clone(), BigDecimal::one());
                stables.insert(token.clone());
            }
            if let Some(pair) = quote.pair_key() {
                lists.flips.insert(pair.clone(), quote.flipped);
                lists.pairs.insert(pair);
            }
            lists.supported.insert(token);
        }

        Self {
            cache,
            network: block.network.clone(),
            height: block.number,
            notify: block.notify,
            snapshot_ttl,
            prices: RwLock::new(prices),
            lists: RwLock::new(lists),
            stables: Mutex::new(stables),
        }
    }

    /// Seed from the quote table, then overlay the live hash (notify blocks)
    /// and the previous block's snapshot. Later overlays win; stables are
    /// never overwritten. Cache failures only mean fewer seeded rates.
    pub async fn load(cache: Arc<dyn Cache>, block: &Block, quotes: &QuoteConfig, snapshot_ttl: Duration) -> Self {
        let converter = Self::new(cache, block, quotes, snapshot_ttl);

        if converter.notify {
            match converter.cache.hash_get_all(&live_prices_key(&converter.network)).await {
                Ok(live) => {
                    let parsed = live
                        .into_iter()
                        .filter_map(|(token, value)| BigDecimal::from_str(&value).ok().map(|p| (token, p)));
                    converter.overlay(parsed);
                }
                Err(e) => tracing::warn!(block = converter.height, error = %e, "Could not read live prices"),
            }
        }

        if let Some(previous) = converter.height.checked_sub(1) {
            match converter.cache.get(&prices_key(&converter.network, previous)).await {
                Ok(Some(raw)) => match serde_json::from_str::<PriceSnapshot>(&raw) {
                    Ok(snapshot) => converter.overlay(snapshot.prices),
                    Err(e) => tracing::warn!(block = previous, error = %e, "Discarding unreadable price snapshot"),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!(block = previous, error = %e, "Could not read price snapshot"),
            }
        }

        converter
    }

    fn overlay(&self, entries: impl IntoIterator<Item = (String, BigDecimal)>) {
        let stables = self.stables.lock().clone();
        let mut prices = self.prices.write();
        for (token, price) in entries {
            if !stables.contains(&token) {
                prices.insert(token, price);
            }
        }
    }

    /// Record a quote pair's price. Only pairs listed in the quote table count.
    pub fn update(&self, pair: &str, token_a: &str, token_b: &str, price: &BigDecimal) {
        if !self.is_quote_pair(pair) {
            return;
        }
        if self.should_flip(pair) {
            if price.is_zero() {
                return;
            }
            self.set_rate(token_b, BigDecimal::one() / price);
        } else {
            self.set_rate(token_a, price.clone());
        }
    }

    /// True for configured quote tokens and for any token that already has a price.
    pub fn convertable(&self, token: &str) -> bool {
        if self.lists.read().supported.contains(token) {
            return true;
        }
        self.prices.read().contains_key(token)
    }

    pub fn should_flip(&self, pair: &str) -> bool {
        self.lists.read().flips.get(pair).copied().unwrap_or(false)
    }

    pub fn is_stable(&self, token: &str) -> bool {
        self.stables.lock().contains(token)
    }

    pub fn price_of_token(&self, token: &str) -> BigDecimal {
        if self.is_stable(token) {
            return BigDecimal::one();
        }
        if self.convertable(token) {
            return self.rate(token);
        }
        BigDecimal::zero()
    }

    /// USD price of token A given `price` (B per A). Zero means unknown.
    pub fn convert(&self, token_a: &str, token_b: &str, price: &BigDecimal) -> BigDecimal {
        if self.is_stable(token_a) && !price.is_zero() {
            return BigDecimal::one() / price;
        }
        if self.convertable(token_b) {
            return price * self.rate(token_b);
        }
        BigDecimal::zero()
    }

    /// USD prices of both sides of a trade at `price` (B per A).
    ///
    /// Stable sides short-circuit. Otherwise B's rate is preferred over A's
    /// when both are known. `(0, 0)` when neither side can be priced.
    pub fn convert_ab(&self, token_a: &str, token_b: &str, price: &BigDecimal) -> (BigDecimal, BigDecimal) {
        if !price.is_zero() {
            if self.is_stable(token_a) {
                return (BigDecimal::one(), BigDecimal::one() / price);
            }
            if self.is_stable(token_b) {
                return (price.clone(), BigDecimal::one());
            }
        }
        if self.convertable(token_b) {
            let rate_b = self.rate(token_b);
            return (price * &rate_b, rate_b);
        }
        if self.convertable(token_a) {
            let rate_a = self.rate(token_a);
            let rate_b = div_or_zero(&rate_a, price);
            return (rate_a, rate_b);
        }
        (BigDecimal::zero(), BigDecimal::zero())
    }

    /// Overwrite a token's USD rate. No-op for stables.
    pub fn update_token_usd_price(&self, token: &str, price: BigDecimal) {
        self.set_rate(token, price);
    }

    /// Flush the live hash (notify blocks) and store this block's snapshot.
    pub async fn commit(&self) -> eyre::Result<()> {
        let prices = self.prices.read().clone();

        if self.notify {
            let fields = prices
                .iter()
                .map(|(token, price)| (token.clone(), price.normalized().to_string()))
                .collect();
            self.cache.hash_set(&live_prices_key(&self.network), fields).await?;
        }

        let snapshot = serde_json::to_string(&PriceSnapshot { prices })?;
        self.cache
            .set(&prices_key(&self.network, self.height), snapshot, Some(self.snapshot_ttl))
            .await
    }

    fn is_quote_pair(&self, pair: &str) -> bool {
        self.lists.read().pairs.contains(pair)
    }

    fn set_rate(&self, token: &str, price: BigDecimal) {
        if self.is_stable(token) {
            return;
        }
        self.prices.write().insert(token.to_string(), price);
    }

    fn rate(&self, token: &str) -> BigDecimal {
        self.prices.read().get(token).cloned().unwrap_or_else(BigDecimal::zero)
    }
}
