use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::SourceConfig;
use crate::indexer::parser::Parser;
use crate::indexer::types::Block;
use crate::node::ChainClient;
use crate::publish::{self, Publisher};

/// Block source for one network: walks heights from `start_block` (or the
/// node's head) and publishes each parsed block, one block at a time.
/// Stops at `end_block` when configured, otherwise follows the head.
pub async fn run_block_loop(
    parser: &Parser,
    publisher: &dyn Publisher,
    chain: &dyn ChainClient,
    network: &str,
    source: &SourceConfig,
    shutdown: CancellationToken,
) -> eyre::Result<()> {
    let poll_interval = Duration::from_millis(source.poll_interval_ms);
    let mut next = match source.start_block {
        Some(start) => start,
        None => retry_rpc("get_now_block", || chain.get_now_block_number()).await?,
    };

    tracing::info!(
        network,
        start_block = next,
        end_block = ?source.end_block,
        poll_interval_ms = source.poll_interval_ms,
        "Block loop started"
    );

    while !shutdown.is_cancelled() {
        if source.end_block.is_some_and(|end| next > end) {
            tracing::info!(network, last_block = next - 1, "Reached end block");
            break;
        }

        let head = match retry_rpc("get_now_block", || chain.get_now_block_number()).await {
            Ok(head) => head,
            Err(e) => {
                tracing::error!(network, error = %e, "Failed to get head block");
                if wait(poll_interval, &shutdown).await {
                    break;
                }
                continue;
            }
        };

        if next > head {
            if wait(poll_interval, &shutdown).await {
                break;
            }
            continue;
        }

        let last = source.end_block.map_or(head, |end| end.min(head));
        for height in next..=last {
            if shutdown.is_cancelled() {
                break;
            }
            let block = Block {
                kind: "block".to_string(),
                network: network.to_string(),
                number: height,
                node: chain.endpoint().to_string(),
                notify: source.notify,
                timestamp: 0,
            };
            process_block(parser, publisher, &block).await;
            next = height + 1;
        }
    }

    tracing::info!(network, "Block loop stopped");
    Ok(())
}

/// Parse one block and publish the outcome. A block that cannot be parsed
/// is requeued on the failed topic.
pub async fn process_block(parser: &Parser, publisher: &dyn Publisher, block: &Block) {
    if block.number == 0 {
        tracing::warn!(network = %block.network, "Skipping block descriptor with height 0");
        return;
    }

    match parser.parse(block).await {
        Ok(state) => {
            if let Err(e) = publish::publish_state(publisher, &state).await {
                tracing::error!(block = block.number, error = %e, "Failed to publish block");
            }
        }
        Err(e) => {
            tracing::error!(block = block.number, error = %e, "Failed to parse block");
            if let Err(e) = publish::publish_failed(publisher, block).await {
                tracing::error!(block = block.number, error = %e, "Failed to requeue block");
            }
        }
    }
}

/// Sleep for `delay`; returns true when shutdown arrived first.
async fn wait(delay: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = shutdown.cancelled() => true,
    }
}

/// Retry an async node call with exponential backoff.
pub async fn retry_rpc<F, Fut, T, E>(op: &str, mut f: F) -> eyre::Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = Duration::from_millis(500);
    let max_retries = 5;

    for attempt in 0..max_retries {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                tracing::warn!(
                    op,
                    attempt = attempt + 1,
                    max_retries,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Node call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }
        }
    }

    f().await
        .map_err(|e| eyre::eyre!("{} failed after {} retries: {}", op, max_retries, e))
}
