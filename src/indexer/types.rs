use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::codec::TronAddress;

/// Symbol used in place of an address for the native currency.
pub const NATIVE_SYMBOL: &str = "TRX";
pub const NATIVE_DECIMALS: u8 = 6;

/// Unit of work handed to the parser. `number == 0` marks a malformed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub network: String,
    pub number: u64,
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub notify: bool,
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairKind {
    /// Exchange-per-token AMM quoted against the native currency.
    Classic,
    UniswapV2,
    UniswapV3,
}

impl PairKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairKind::Classic => "classic",
            PairKind::UniswapV2 => "uniswap_v2",
            PairKind::UniswapV3 => "uniswap_v3",
        }
    }
}

impl fmt::Display for PairKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PairKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(PairKind::Classic),
            "uniswap_v2" => Ok(PairKind::UniswapV2),
            "uniswap_v3" => Ok(PairKind::UniswapV3),
            other => Err(eyre::eyre!("Unknown pair class '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Base58 address, or `TRX` for the native currency.
    pub address: String,
    pub decimals: u8,
}

impl Token {
    pub fn native() -> Self {
        Self {
            address: NATIVE_SYMBOL.to_string(),
            decimals: NATIVE_DECIMALS,
        }
    }

    pub fn new(address: &TronAddress, decimals: u8) -> Self {
        Self {
            address: address.to_base58(),
            decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub address: String,
    pub klass: PairKind,
    pub token0: Token,
    pub token1: Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityKind {
    Mint,
    Burn,
    Sync,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSwap {
    pub tx: String,
    pub date: DateTime<Utc>,
    pub chain: String,
    #[serde(rename = "blocknumber")]
    pub block_number: u64,
    pub pair: String,
    #[serde(with = "u256_decimal")]
    pub amount0: U256,
    #[serde(with = "u256_decimal")]
    pub amount1: U256,
    pub buy: bool,
    #[serde(rename = "priceA")]
    pub price_a: BigDecimal,
    #[serde(rename = "priceAUSD")]
    pub price_a_usd: BigDecimal,
    #[serde(rename = "priceB")]
    pub price_b: BigDecimal,
    #[serde(rename = "priceBUSD")]
    pub price_b_usd: BigDecimal,
    pub bot: bool,
    pub wallet: String,
    pub order: u32,
    #[serde(rename = "valueUSD")]
    pub value_usd: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityEvent {
    #[serde(rename = "blocknumber")]
    pub block_number: u64,
    pub date: DateTime<Utc>,
    pub tx: String,
    pub pair: String,
    pub chain: String,
    pub klass: LiquidityKind,
    pub wallet: String,
    pub order: u32,
    /// Mint and burn.
    #[serde(with = "u256_decimal")]
    pub amount0: U256,
    #[serde(with = "u256_decimal")]
    pub amount1: U256,
    /// Sync.
    #[serde(with = "u256_decimal")]
    pub reserve0: U256,
    #[serde(with = "u256_decimal")]
    pub reserve1: U256,
    pub price: BigDecimal,
    #[serde(rename = "priceUSD")]
    pub price_usd: BigDecimal,
    #[serde(rename = "valueUSD")]
    pub value_usd: BigDecimal,
    #[serde(rename = "reserveUSD")]
    pub reserve_usd: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectSwap {
    pub tx: String,
    pub date: DateTime<Utc>,
    pub chain: String,
    #[serde(rename = "blocknumber")]
    pub block_number: u64,
    pub protocol: String,
    #[serde(rename = "srcToken")]
    pub src_token: String,
    #[serde(rename = "dstToken")]
    pub dst_token: String,
    #[serde(with = "u256_decimal")]
    pub amount0: U256,
    #[serde(with = "u256_decimal")]
    pub amount1: U256,
    #[serde(rename = "priceA")]
    pub price_a: BigDecimal,
    #[serde(rename = "priceAUSD")]
    pub price_a_usd: BigDecimal,
    #[serde(rename = "priceB")]
    pub price_b: BigDecimal,
    #[serde(rename = "priceBUSD")]
    pub price_b_usd: BigDecimal,
    pub wallet: String,
    pub order: u32,
    #[serde(rename = "valueUSD")]
    pub value_usd: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub chain: String,
    pub contract: String,
    #[serde(rename = "blocknumber")]
    pub block_number: u64,
    pub date: DateTime<Utc>,
    pub order: u32,
    pub tx: String,
    pub from: String,
    pub to: String,
    #[serde(with = "u256_decimal")]
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPair {
    pub factory: String,
    pub pair: String,
    pub klass: PairKind,
    pub network: String,
    pub node: String,
    pub pool_created: i64,
}

/// Coarse balance-change record; no pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub token: String,
    pub from: String,
    pub to: String,
    pub tx: String,
}

/// Per-log context passed from the parser to the decoders.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub tx: String,
    pub timestamp: i64,
    /// Signer of the enclosing transaction.
    pub owner: Option<TronAddress>,
    /// Position of the log inside its transaction.
    pub order: u32,
}

impl LogContext {
    pub fn date(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp, 0).unwrap_or_default()
    }

    pub fn wallet(&self) -> String {
        self.owner.map(|o| o.to_base58()).unwrap_or_default()
    }
}

/// Raw integer amounts travel as decimal strings.
pub mod u256_decimal {
    use alloy::primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str(&s).map_err(de::Error::custom)
    }
}
