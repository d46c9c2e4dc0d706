use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use super::types::{BlockResponse, ConstantCallResponse, TransactionInfo};
use super::ChainClient;
use crate::codec::TronAddress;
use crate::config::ChainConfig;

/// Caller used for constant calls; the node only needs a syntactically valid owner.
const CONSTANT_CALL_OWNER: &str = "410000000000000000000000000000000000000000";

/// Tron full-node HTTP API client (`/wallet/...` or `/walletsolidity/...`).
pub struct TronHttpClient {
    client: reqwest::Client,
    node_url: String,
    base: String,
}

impl TronHttpClient {
    pub fn new(config: &ChainConfig) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))?;

        let node_url = config.node_url.trim_end_matches('/').to_string();
        let base = format!("{}/{}", node_url, config.api_prefix.trim_matches('/'));

        Ok(Self { client, node_url, base })
    }

    async fn post<B, T>(&self, method: &str, body: &B) -> eyre::Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base, method);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| eyre::eyre!("{} request failed: {}", method, e))?;

        if !resp.status().is_success() {
            return Err(eyre::eyre!("{} returned HTTP {}", method, resp.status()));
        }

        resp.json::<T>()
            .await
            .map_err(|e| eyre::eyre!("{} returned an unreadable body: {}", method, e))
    }
}

#[async_trait]
impl ChainClient for TronHttpClient {
    fn endpoint(&self) -> &str {
        &self.node_url
    }

    async fn get_now_block_number(&self) -> eyre::Result<u64> {
        let block: BlockResponse = self.post("getnowblock", &json!({})).await?;
        if block.block_id.is_empty() {
            return Err(eyre::eyre!("getnowblock returned no block"));
        }
        Ok(block.block_header.raw_data.number)
    }

    async fn get_block_by_number(&self, height: u64) -> eyre::Result<BlockResponse> {
        self.post("getblockbynum", &json!({ "num": height })).await
    }

    async fn get_transaction_info(&self, tx_id: &str) -> eyre::Result<TransactionInfo> {
        self.post("gettransactioninfobyid", &json!({ "value": tx_id })).await
    }

    async fn get_block_transaction_infos(&self, height: u64) -> eyre::Result<Vec<TransactionInfo>> {
        // An empty block answers `{}` rather than `[]`.
        let value: serde_json::Value = self
            .post("gettransactioninfobyblocknum", &json!({ "num": height }))
            .await?;
        match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)
                .map_err(|e| eyre::eyre!("Invalid transaction info list for block {}: {}", height, e)),
            _ => Ok(Vec::new()),
        }
    }

    async fn call_read_only(
        &self,
        contract: &TronAddress,
        function_selector: &str,
        parameter: &str,
    ) -> eyre::Result<Vec<u8>> {
        let body = json!({
            "owner_address": CONSTANT_CALL_OWNER,
            "contract_address": contract.to_hex(),
            "function_selector": function_selector,
            "parameter": parameter,
        });
        let resp: ConstantCallResponse = self.post("triggerconstantcontract", &body).await?;

        if !resp.result.result {
            return Err(eyre::eyre!(
                "{} on {} rejected: {}",
                function_selector,
                contract,
                resp.result.message.unwrap_or_default()
            ));
        }

        let first = resp
            .constant_result
            .first()
            .ok_or_else(|| eyre::eyre!("{} on {} returned no result", function_selector, contract))?;
        hex::decode(first)
            .map_err(|e| eyre::eyre!("{} on {} returned invalid hex: {}", function_selector, contract, e))
    }
}
