use alloy::primitives::{Address, B256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Version byte Tron puts in front of the 20-byte account hash.
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// A Tron account or contract address.
///
/// Internally this is the 20-byte EVM-style hash; the `0x41` prefix is added
/// back when rendering the hex (`41…`) or Base58Check (`T…`) forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TronAddress(Address);

impl TronAddress {
    pub const ZERO: Self = Self(Address::ZERO);

    pub fn from_evm(address: Address) -> Self {
        Self(address)
    }

    /// Take the low 20 bytes of a 32-byte ABI word (indexed topic or return value).
    pub fn from_word(word: B256) -> Self {
        Self(Address::from_word(word))
    }

    /// Parse the hex form. Accepts an optional `0x`, the 42-char `41…` form,
    /// the bare 40-char hash, or a zero-padded 64-char word.
    pub fn from_hex(input: &str) -> eyre::Result<Self> {
        let s = input.trim_start_matches("0x");
        let bytes = hex::decode(s).map_err(|e| eyre::eyre!("Invalid hex address '{}': {}", input, e))?;
        match bytes.len() {
            20 => Ok(Self(Address::from_slice(&bytes))),
            21 if bytes[0] == TRON_ADDRESS_PREFIX => Ok(Self(Address::from_slice(&bytes[1..]))),
            32 => Ok(Self(Address::from_slice(&bytes[12..]))),
            n => Err(eyre::eyre!("Invalid hex address '{}': unexpected length {}", input, n)),
        }
    }

    pub fn from_base58(input: &str) -> eyre::Result<Self> {
        let bytes = bs58::decode(input)
            .with_check(None)
            .into_vec()
            .map_err(|e| eyre::eyre!("Invalid base58 address '{}': {}", input, e))?;
        if bytes.len() != 21 || bytes[0] != TRON_ADDRESS_PREFIX {
            return Err(eyre::eyre!("Invalid base58 address '{}': not a Tron address", input));
        }
        Ok(Self(Address::from_slice(&bytes[1..])))
    }

    /// Accept either display form.
    pub fn parse(input: &str) -> eyre::Result<Self> {
        if input.starts_with('T') {
            Self::from_base58(input)
        } else {
            Self::from_hex(input)
        }
    }

    pub fn evm(&self) -> Address {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Address::ZERO
    }

    fn prefixed_bytes(&self) -> [u8; 21] {
        let mut bytes = [0u8; 21];
        bytes[0] = TRON_ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(self.0.as_slice());
        bytes
    }

    /// `41`-prefixed lowercase hex, as the node HTTP API expects it.
    pub fn to_hex(&self) -> String {
        hex::encode(self.prefixed_bytes())
    }

    /// Canonical Base58Check display form.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.prefixed_bytes()).with_check().into_string()
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for TronAddress {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TronAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for TronAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Normalize any accepted address form to its Base58Check string.
/// Non-address identifiers (e.g. the native `TRX` symbol) pass through unchanged.
pub fn canonical(input: &str) -> String {
    TronAddress::parse(input)
        .map(|a| a.to_base58())
        .unwrap_or_else(|_| input.to_string())
}
