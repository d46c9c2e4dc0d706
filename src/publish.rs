//! Output boundary: encoded block records and where they are sent.

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::indexer::state::BlockState;
use crate::indexer::types::{Block, Holder};

pub const PARSED_TOPIC: &str = "parser.sys.parsed";
pub const HOLDERS_TOPIC: &str = "parser.sys.holders";
pub const FAILED_TOPIC: &str = "failed_blocks";

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> eyre::Result<()>;
}

/// Writes one `{"topic": ..., "payload": ...}` object per line to stdout.
pub struct StdoutPublisher {
    out: Mutex<tokio::io::Stdout>,
}

impl StdoutPublisher {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for StdoutPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> eyre::Result<()> {
        let payload: serde_json::Value = serde_json::from_slice(&payload)?;
        let mut line = serde_json::to_vec(&serde_json::json!({ "topic": topic, "payload": payload }))?;
        line.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }
}

/// Holder deltas of one block, published apart from the parsed record.
#[derive(Debug, Clone, Serialize)]
pub struct HoldersRecord {
    pub block: u64,
    pub timestamp: u64,
    pub network: String,
    pub holders: Vec<Holder>,
    pub notify: bool,
}

pub fn encode_block(state: &BlockState) -> eyre::Result<Vec<u8>> {
    Ok(serde_json::to_vec(&state.to_record())?)
}

/// Encode the holder deltas and clear them from the state.
pub fn encode_holders(state: &BlockState) -> eyre::Result<Vec<u8>> {
    let block = state.block();
    let record = HoldersRecord {
        block: block.number,
        timestamp: block.timestamp,
        network: block.network.clone(),
        holders: state.take_holders(),
        notify: block.notify,
    };
    Ok(serde_json::to_vec(&record)?)
}

/// Publish the parsed record, then the holders record.
pub async fn publish_state(publisher: &dyn Publisher, state: &BlockState) -> eyre::Result<()> {
    publisher.publish(PARSED_TOPIC, encode_block(state)?).await?;
    publisher.publish(HOLDERS_TOPIC, encode_holders(state)?).await
}

/// Requeue the original descriptor of a block that could not be parsed.
pub async fn publish_failed(publisher: &dyn Publisher, block: &Block) -> eyre::Result<()> {
    if block.number == 0 {
        tracing::warn!(network = %block.network, "Not requeueing block descriptor with height 0");
        return Ok(());
    }
    publisher.publish(FAILED_TOPIC, serde_json::to_vec(block)?).await
}
