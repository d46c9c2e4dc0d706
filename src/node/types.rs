use alloy::primitives::{Bytes, Log as PrimitiveLog, B256};
use serde::{Deserialize, Serialize};

use crate::codec::TronAddress;

/// Contract type of a plain native-currency transfer.
pub const TRANSFER_CONTRACT: &str = "TransferContract";
pub const SUCCESS: &str = "SUCCESS";

/// `getblockbynum` response. A block the node does not have yet comes back
/// as `{}`, i.e. with an empty `block_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockResponse {
    #[serde(rename = "blockID", default)]
    pub block_id: String,
    #[serde(default)]
    pub block_header: BlockHeader,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    #[serde(default)]
    pub raw_data: BlockHeaderRaw,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockHeaderRaw {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ret: Vec<TransactionRet>,
    #[serde(rename = "txID", default)]
    pub tx_id: String,
    #[serde(default)]
    pub raw_data: TransactionRaw,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRet {
    #[serde(rename = "contractRet", default)]
    pub contract_ret: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRaw {
    #[serde(default)]
    pub contract: Vec<ContractCall>,
    /// Milliseconds since epoch.
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractCall {
    #[serde(default)]
    pub parameter: ContractParameter,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractParameter {
    #[serde(default)]
    pub value: ContractValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractValue {
    #[serde(default)]
    pub owner_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

impl Transaction {
    pub fn is_success(&self) -> bool {
        self.ret.first().map(|r| r.contract_ret == SUCCESS).unwrap_or(false)
    }

    pub fn has_contract_calls(&self) -> bool {
        !self.raw_data.contract.is_empty()
    }

    pub fn is_native_transfer(&self) -> bool {
        self.raw_data
            .contract
            .first()
            .map(|c| c.kind == TRANSFER_CONTRACT)
            .unwrap_or(false)
    }

    /// Successful contract call that is not a plain TRX transfer: worth a log fetch.
    pub fn needs_logs(&self) -> bool {
        self.is_success() && self.has_contract_calls() && !self.is_native_transfer()
    }

    /// Address that signed the first contract call.
    pub fn owner(&self) -> Option<TronAddress> {
        let first = self.raw_data.contract.first()?;
        TronAddress::parse(&first.parameter.value.owner_address).ok()
    }

    pub fn timestamp_secs(&self) -> i64 {
        self.raw_data.timestamp / 1000
    }
}

/// `gettransactioninfobyid` / `gettransactioninfobyblocknum` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionInfo {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: u64,
    #[serde(rename = "blockTimeStamp", default)]
    pub block_timestamp: i64,
    #[serde(default)]
    pub receipt: Receipt,
    #[serde(default)]
    pub log: Vec<Log>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl TransactionInfo {
    pub fn is_success(&self) -> bool {
        self.receipt.result.as_deref() == Some(SUCCESS)
    }
}

/// Event log as the node returns it: bare hex strings, no `0x`, and a
/// 20-byte emitter address without the `41` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

impl Log {
    /// Event selector: first 8 hex digits of `topics[0]`.
    pub fn selector(&self) -> Option<u32> {
        let topic = self.topics.first()?;
        let digits = topic.trim_start_matches("0x").get(..8)?;
        u32::from_str_radix(digits, 16).ok()
    }

    pub fn contract(&self) -> eyre::Result<TronAddress> {
        TronAddress::from_hex(&self.address)
    }

    /// Convert into alloy's log so `sol!` event types can decode it.
    pub fn to_primitive(&self) -> eyre::Result<PrimitiveLog> {
        let address = self.contract()?.evm();
        let topics = self
            .topics
            .iter()
            .map(|t| {
                let bytes = hex::decode(t.trim_start_matches("0x"))
                    .map_err(|e| eyre::eyre!("Invalid topic '{}': {}", t, e))?;
                if bytes.len() != 32 {
                    return Err(eyre::eyre!("Invalid topic '{}': expected 32 bytes", t));
                }
                Ok(B256::from_slice(&bytes))
            })
            .collect::<eyre::Result<Vec<_>>>()?;
        let data = hex::decode(self.data.trim_start_matches("0x"))
            .map_err(|e| eyre::eyre!("Invalid log data: {}", e))?;
        Ok(PrimitiveLog::new_unchecked(address, topics, Bytes::from(data)))
    }
}

/// `triggerconstantcontract` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConstantCallResponse {
    #[serde(default)]
    pub constant_result: Vec<String>,
    #[serde(default)]
    pub result: ConstantCallResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConstantCallResult {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector() {
        let log = Log {
            address: String::new(),
            topics: vec!["ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef".to_string()],
            data: String::new(),
        };
        assert_eq!(log.selector(), Some(0xddf252ad));

        let log = Log {
            topics: vec!["cc7244d3535e7639366f8c5211527112e01de3ec7449ee3a6e66b007f4065a70".to_string()],
            ..Default::default()
        };
        assert_eq!(log.selector(), Some(0xcc7244d3));
    }

    #[test]
    fn test_selector_requires_topic() {
        assert_eq!(Log::default().selector(), None);
        let short = Log {
            topics: vec!["ddf2".to_string()],
            ..Default::default()
        };
        assert_eq!(short.selector(), None);
    }

    #[test]
    fn test_parse_block_response() {
        let json = r#"{
            "blockID": "0000000002faf0807a",
            "block_header": {"raw_data": {"number": 50000000, "timestamp": 1680000000000}},
            "transactions": [{
                "ret": [{"contractRet": "SUCCESS"}],
                "txID": "abc",
                "raw_data": {
                    "contract": [{
                        "parameter": {"value": {
                            "owner_address": "41a2726afbecbd8e936000ed684cef5e2f5cf43008",
                            "to_address": "41a614f803b6fd780986a42c78ec9c7f77e6ded13c",
                            "amount": 1000000
                        }},
                        "type": "TransferContract"
                    }],
                    "timestamp": 1680000000123
                }
            }]
        }"#;
        let block: BlockResponse = serde_json::from_str(json).unwrap();
        assert_eq!(block.block_header.raw_data.number, 50_000_000);
        let tx = &block.transactions[0];
        assert!(tx.is_success());
        assert!(tx.is_native_transfer());
        assert!(!tx.needs_logs());
        assert_eq!(tx.timestamp_secs(), 1_680_000_000);
        assert_eq!(tx.owner().unwrap().to_base58(), "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE");
    }

    #[test]
    fn test_missing_block_has_empty_id() {
        let block: BlockResponse = serde_json::from_str("{}").unwrap();
        assert!(block.block_id.is_empty());
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn test_failed_transaction_not_eligible() {
        let tx = Transaction {
            ret: vec![TransactionRet { contract_ret: "REVERT".to_string() }],
            raw_data: TransactionRaw {
                contract: vec![ContractCall {
                    kind: "TriggerSmartContract".to_string(),
                    ..Default::default()
                }],
                timestamp: 0,
            },
            ..Default::default()
        };
        assert!(!tx.needs_logs());
    }

    #[test]
    fn test_to_primitive() {
        let log = Log {
            address: "a614f803b6fd780986a42c78ec9c7f77e6ded13c".to_string(),
            topics: vec!["ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef".to_string()],
            data: "00000000000000000000000000000000000000000000000000000000000f4240".to_string(),
        };
        let primitive = log.to_primitive().unwrap();
        assert_eq!(primitive.data.topics().len(), 1);
        assert_eq!(primitive.data.data.len(), 32);
        assert_eq!(
            TronAddress::from_evm(primitive.address).to_base58(),
            "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t"
        );
    }
}
