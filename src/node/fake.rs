use alloy::primitives::U256;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::contracts::DECIMALS;
use super::types::{BlockResponse, TransactionInfo};
use super::ChainClient;
use crate::codec::TronAddress;

/// Scriptable in-memory node for tests.
#[derive(Default)]
pub(crate) struct FakeChain {
    now: Mutex<u64>,
    blocks: Mutex<HashMap<u64, BlockResponse>>,
    tx_infos: Mutex<HashMap<String, TransactionInfo>>,
    block_infos: Mutex<HashMap<u64, Vec<TransactionInfo>>>,
    calls: Mutex<HashMap<(TronAddress, String), Vec<u8>>>,
    /// Remaining forced failures per call key (tx id or `addr:selector`).
    failures: Mutex<HashMap<String, u32>>,
    call_counts: Mutex<HashMap<String, u32>>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&self, height: u64) {
        *self.now.lock() = height;
    }

    pub fn add_block(&self, height: u64, block: BlockResponse) {
        self.blocks.lock().insert(height, block);
    }

    pub fn add_tx_info(&self, info: TransactionInfo) {
        self.tx_infos.lock().insert(info.id.clone(), info);
    }

    pub fn set_block_infos(&self, height: u64, infos: Vec<TransactionInfo>) {
        self.block_infos.lock().insert(height, infos);
    }

    pub fn set_call(&self, contract: &TronAddress, selector: &str, result: Vec<u8>) {
        self.calls.lock().insert((*contract, selector.to_string()), result);
    }

    pub fn set_decimals(&self, token: &TronAddress, decimals: u8) {
        let word = U256::from(decimals).to_be_bytes::<32>().to_vec();
        self.set_call(token, DECIMALS, word);
    }

    pub fn set_address_call(&self, contract: &TronAddress, selector: &str, value: &TronAddress) {
        self.set_call(contract, selector, value.evm().into_word().to_vec());
    }

    /// Make the next `times` calls for `key` fail.
    pub fn fail_times(&self, key: &str, times: u32) {
        self.failures.lock().insert(key.to_string(), times);
    }

    pub fn call_key(contract: &TronAddress, selector: &str) -> String {
        format!("{}:{}", contract, selector)
    }

    pub fn calls_made(&self, key: &str) -> u32 {
        self.call_counts.lock().get(key).copied().unwrap_or(0)
    }

    fn record(&self, key: &str) -> eyre::Result<()> {
        *self.call_counts.lock().entry(key.to_string()).or_default() += 1;
        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(eyre::eyre!("scripted failure for {}", key));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn endpoint(&self) -> &str {
        "http://fake-node"
    }

    async fn get_now_block_number(&self) -> eyre::Result<u64> {
        Ok(*self.now.lock())
    }

    async fn get_block_by_number(&self, height: u64) -> eyre::Result<BlockResponse> {
        self.record(&format!("block:{}", height))?;
        Ok(self.blocks.lock().get(&height).cloned().unwrap_or_default())
    }

    async fn get_transaction_info(&self, tx_id: &str) -> eyre::Result<TransactionInfo> {
        self.record(tx_id)?;
        self.tx_infos
            .lock()
            .get(tx_id)
            .cloned()
            .ok_or_else(|| eyre::eyre!("unknown transaction {}", tx_id))
    }

    async fn get_block_transaction_infos(&self, height: u64) -> eyre::Result<Vec<TransactionInfo>> {
        self.record(&format!("infos:{}", height))?;
        Ok(self.block_infos.lock().get(&height).cloned().unwrap_or_default())
    }

    async fn call_read_only(
        &self,
        contract: &TronAddress,
        function_selector: &str,
        _parameter: &str,
    ) -> eyre::Result<Vec<u8>> {
        self.record(&Self::call_key(contract, function_selector))?;
        self.calls
            .lock()
            .get(&(*contract, function_selector.to_string()))
            .cloned()
            .ok_or_else(|| eyre::eyre!("{} not scripted for {}", function_selector, contract))
    }
}
