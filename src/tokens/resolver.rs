use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::registry::TokenRegistry;
use crate::cache::PairsCache;
use crate::codec::TronAddress;
use crate::config::TokensConfig;
use crate::indexer::types::{Pair, PairKind, Token};
use crate::node::{contracts, ChainClient};

/// Resolves a pair contract into its two tokens with decimals.
///
/// Lookup order: pair cache, then on-chain reads. Decimals come from the
/// static token list first, then from `decimals()` with a bounded number of
/// attempts. A pair is cached only when both tokens resolved.
pub struct PairResolver {
    chain: Arc<dyn ChainClient>,
    pairs: PairsCache,
    registry: Arc<TokenRegistry>,
    overrides: HashMap<TronAddress, TronAddress>,
    decimals_attempts: u32,
    decimals_backoff: Duration,
}

impl PairResolver {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        pairs: PairsCache,
        registry: Arc<TokenRegistry>,
        config: &TokensConfig,
    ) -> eyre::Result<Self> {
        let mut overrides = HashMap::new();
        for entry in &config.pair_token_overrides {
            let pair = TronAddress::parse(&entry.pair)?;
            let token = TronAddress::parse(&entry.token)?;
            overrides.insert(pair, token);
        }

        Ok(Self {
            chain,
            pairs,
            registry,
            overrides,
            decimals_attempts: config.decimals_attempts.max(1),
            decimals_backoff: Duration::from_millis(config.decimals_backoff_ms),
        })
    }

    pub async fn resolve_pair(&self, address: &TronAddress, kind: PairKind) -> Option<Pair> {
        let key = address.to_base58();
        if let Some(pair) = self.pairs.get(&key, kind).await {
            return Some(pair);
        }

        let (token0, token1) = match kind {
            PairKind::Classic => {
                let token = match self.overrides.get(address) {
                    Some(token) => *token,
                    None => match contracts::pair_token_address(self.chain.as_ref(), address).await {
                        Ok(token) => token,
                        Err(e) => {
                            tracing::error!(pair = %key, error = %e, "Could not read exchange token");
                            return None;
                        }
                    },
                };
                (self.resolve_token(&token).await?, Token::native())
            }
            PairKind::UniswapV2 | PairKind::UniswapV3 => {
                let (a, b) = match futures::try_join!(
                    contracts::token0(self.chain.as_ref(), address),
                    contracts::token1(self.chain.as_ref(), address),
                ) {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::error!(pair = %key, class = %kind, error = %e, "Could not read pair tokens");
                        return None;
                    }
                };
                let (token0, token1) = futures::join!(self.resolve_token(&a), self.resolve_token(&b));
                (token0?, token1?)
            }
        };

        let pair = Pair {
            address: key,
            klass: kind,
            token0,
            token1,
        };
        if let Err(e) = self.pairs.store(&pair).await {
            tracing::warn!(pair = %pair.address, error = %e, "Could not cache pair");
        }
        Some(pair)
    }

    pub async fn resolve_token(&self, address: &TronAddress) -> Option<Token> {
        let decimals = self.token_decimals(address).await?;
        Some(Token::new(address, decimals))
    }

    pub async fn token_decimals(&self, address: &TronAddress) -> Option<u8> {
        let key = address.to_base58();
        if let Some(decimals) = self.registry.get_decimals(&key) {
            return Some(decimals);
        }

        for attempt in 1..=self.decimals_attempts {
            match contracts::token_decimals(self.chain.as_ref(), address).await {
                Ok(decimals) => {
                    self.registry.remember(&key, decimals);
                    return Some(decimals);
                }
                Err(e) => {
                    tracing::debug!(token = %key, attempt, error = %e, "decimals() failed");
                    if attempt < self.decimals_attempts && !self.decimals_backoff.is_zero() {
                        tokio::time::sleep(self.jittered_backoff()).await;
                    }
                }
            }
        }

        tracing::error!(
            token = %key,
            attempts = self.decimals_attempts,
            "Could not resolve token decimals"
        );
        None
    }

    fn jittered_backoff(&self) -> Duration {
        let base = self.decimals_backoff.as_millis() as u64;
        let jitter = rand::rng().random_range(0..=base / 2);
        Duration::from_millis(base + jitter)
    }
}
