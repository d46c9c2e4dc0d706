pub mod contracts;
pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::codec::TronAddress;
use types::{BlockResponse, TransactionInfo};

/// Blocking-style remote calls against a Tron node. Every call may fail;
/// callers decide whether to retry.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Endpoint this client talks to, recorded on new-pair listings.
    fn endpoint(&self) -> &str;

    async fn get_now_block_number(&self) -> eyre::Result<u64>;

    async fn get_block_by_number(&self, height: u64) -> eyre::Result<BlockResponse>;

    async fn get_transaction_info(&self, tx_id: &str) -> eyre::Result<TransactionInfo>;

    async fn get_block_transaction_infos(&self, height: u64) -> eyre::Result<Vec<TransactionInfo>>;

    /// Run a view function and return the raw ABI-encoded result.
    async fn call_read_only(
        &self,
        contract: &TronAddress,
        function_selector: &str,
        parameter: &str,
    ) -> eyre::Result<Vec<u8>>;
}
