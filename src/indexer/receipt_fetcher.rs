use std::collections::HashSet;

use crate::node::types::{Transaction, TransactionInfo};
use crate::node::ChainClient;

/// Receipts fetched for a block, plus the transactions whose fetch failed.
#[derive(Debug, Default)]
pub struct ReceiptBatch {
    pub infos: Vec<TransactionInfo>,
    pub failed: Vec<Transaction>,
}

/// Fetch receipts one transaction at a time. Failures are collected for a
/// later retry pass instead of aborting the block; reverted receipts are dropped.
pub async fn fetch_per_transaction(chain: &dyn ChainClient, txs: &[Transaction]) -> ReceiptBatch {
    let mut batch = ReceiptBatch::default();

    for tx in txs {
        match chain.get_transaction_info(&tx.tx_id).await {
            Ok(info) => {
                if info.is_success() {
                    batch.infos.push(info);
                }
            }
            Err(e) => {
                tracing::error!(tx = %tx.tx_id, error = %e, "Could not fetch transaction info");
                batch.failed.push(tx.clone());
            }
        }
    }

    batch
}

/// Fetch every receipt of the block in one call and keep the successful ones
/// belonging to `wanted`. A failure here is fatal for the block.
pub async fn fetch_block(
    chain: &dyn ChainClient,
    height: u64,
    wanted: &HashSet<&str>,
) -> eyre::Result<Vec<TransactionInfo>> {
    let infos = chain.get_block_transaction_infos(height).await?;
    Ok(infos
        .into_iter()
        .filter(|info| info.is_success() && wanted.contains(info.id.as_str()))
        .collect())
}
