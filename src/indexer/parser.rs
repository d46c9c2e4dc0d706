use eyre::WrapErr;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::context::BlockContext;
use super::state::BlockState;
use super::types::{Block, LogContext};
use super::{dispatcher, receipt_fetcher, transfer};
use crate::cache::Cache;
use crate::codec::address::canonical;
use crate::config::{Config, ReceiptMode};
use crate::node::types::{Transaction, TransactionInfo};
use crate::node::ChainClient;
use crate::pricing::{FiatConverter, QuoteConfig};
use crate::tokens::PairResolver;

/// Turns a block descriptor into the events of that block.
pub struct Parser {
    chain: Arc<dyn ChainClient>,
    cache: Arc<dyn Cache>,
    resolver: Arc<PairResolver>,
    quotes: Arc<QuoteConfig>,
    reference_pairs: Arc<HashSet<String>>,
    receipt_mode: ReceiptMode,
    /// 0 means one task per log with no limit.
    max_concurrent_logs: usize,
    snapshot_ttl: Duration,
}

impl Parser {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        cache: Arc<dyn Cache>,
        resolver: Arc<PairResolver>,
        quotes: QuoteConfig,
        config: &Config,
    ) -> Self {
        let reference_pairs = config
            .pricing
            .reference_pairs
            .iter()
            .map(|pair| canonical(pair))
            .collect();

        Self {
            chain,
            cache,
            resolver,
            quotes: Arc::new(quotes),
            reference_pairs: Arc::new(reference_pairs),
            receipt_mode: config.chain.receipt_mode,
            max_concurrent_logs: config.parser.max_concurrent_logs,
            snapshot_ttl: Duration::from_secs(config.cache.price_snapshot_ttl_secs),
        }
    }

    /// Parse one block. An error means the block could not be read and should
    /// be requeued; problems with single logs never fail the block.
    pub async fn parse(&self, block: &Block) -> eyre::Result<BlockState> {
        if block.number == 0 {
            eyre::bail!("Block descriptor has height 0");
        }
        let started = Instant::now();

        let response = self
            .chain
            .get_block_by_number(block.number)
            .await
            .wrap_err_with(|| format!("Could not fetch block {}", block.number))?;
        if response.block_id.is_empty() {
            eyre::bail!("Block {} is not available on {}", block.number, self.chain.endpoint());
        }

        let height = block.number;
        let block_time = response.block_header.raw_data.timestamp / 1000;
        let mut block = block.clone();
        if block.timestamp == 0 {
            block.timestamp = u64::try_from(block_time).unwrap_or_default();
        }

        let converter = FiatConverter::load(self.cache.clone(), &block, &self.quotes, self.snapshot_ttl).await;
        let node = if block.node.is_empty() {
            self.chain.endpoint().to_string()
        } else {
            block.node.clone()
        };
        let ctx = Arc::new(BlockContext {
            state: BlockState::new(block.clone()),
            block,
            node,
            converter,
            resolver: self.resolver.clone(),
            reference_pairs: self.reference_pairs.clone(),
        });

        let total = response.transactions.len();
        let mut eligible = Vec::new();
        for tx in response.transactions {
            if tx.is_success() && tx.is_native_transfer() {
                transfer::apply_native(&ctx, &tx);
            } else if tx.needs_logs() {
                eligible.push(tx);
            }
        }

        let infos = self.fetch_receipts(height, &eligible).await?;
        tracing::debug!(
            block = height,
            txs = total,
            eligible = eligible.len(),
            receipts = infos.len(),
            "Fetched receipts"
        );

        let txs: HashMap<&str, &Transaction> = eligible.iter().map(|tx| (tx.tx_id.as_str(), tx)).collect();
        let permits = (self.max_concurrent_logs > 0).then(|| Arc::new(Semaphore::new(self.max_concurrent_logs)));
        let mut tasks = JoinSet::new();

        for info in infos {
            let Some(tx) = txs.get(info.id.as_str()) else {
                continue;
            };
            let timestamp = if tx.raw_data.timestamp > 0 {
                tx.timestamp_secs()
            } else {
                block_time
            };
            let owner = tx.owner();

            for (index, log) in info.log.into_iter().enumerate() {
                let lctx = LogContext {
                    tx: info.id.clone(),
                    timestamp,
                    owner,
                    order: index as u32,
                };
                let ctx = ctx.clone();
                let permits = permits.clone();
                tasks.spawn(async move {
                    let _permit = match permits {
                        Some(permits) => permits.acquire_owned().await.ok(),
                        None => None,
                    };
                    dispatcher::process_log(&ctx, &lctx, &log).await;
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(block = height, error = %e, "Log task failed");
            }
        }

        if let Err(e) = ctx.converter.commit().await {
            tracing::warn!(block = height, error = %e, "Could not store prices");
        }

        let ctx = Arc::try_unwrap(ctx).map_err(|_| eyre::eyre!("Block {} context is still shared", height))?;
        let counts = ctx.state.counts();
        tracing::info!(
            block = height,
            pair_swaps = counts.pair_swaps,
            liquidities = counts.liquidities,
            transfers = counts.transfers,
            direct_swaps = counts.direct_swaps,
            new_pairs = counts.new_pairs,
            holders = counts.holders,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Parsed block"
        );

        Ok(ctx.state)
    }

    async fn fetch_receipts(&self, height: u64, txs: &[Transaction]) -> eyre::Result<Vec<TransactionInfo>> {
        match self.receipt_mode {
            ReceiptMode::PerTransaction => {
                let first = receipt_fetcher::fetch_per_transaction(self.chain.as_ref(), txs).await;
                let mut infos = first.infos;
                if !first.failed.is_empty() {
                    tracing::warn!(block = height, failed = first.failed.len(), "Retrying failed transactions");
                    let retry = receipt_fetcher::fetch_per_transaction(self.chain.as_ref(), &first.failed).await;
                    if !retry.failed.is_empty() {
                        tracing::error!(block = height, dropped = retry.failed.len(), "Giving up on transactions");
                    }
                    infos.extend(retry.infos);
                }
                Ok(infos)
            }
            ReceiptMode::Block => {
                if txs.is_empty() {
                    return Ok(Vec::new());
                }
                let wanted: HashSet<&str> = txs.iter().map(|tx| tx.tx_id.as_str()).collect();
                receipt_fetcher::fetch_block(self.chain.as_ref(), height, &wanted)
                    .await
                    .wrap_err_with(|| format!("Could not fetch receipts of block {}", height))
            }
        }
    }
}
