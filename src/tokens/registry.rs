use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;

use crate::codec::address::canonical;

/// Entry of the static token list file (`{"<address>": {...}}`).
#[derive(Debug, Deserialize, Clone)]
pub struct TokenListEntry {
    pub decimals: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

/// Token address -> decimals, loaded once at startup and grown as decimals
/// are resolved on-chain. Keys are canonical base58 addresses.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    decimals: RwLock<HashMap<String, u8>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON token list. A missing or unreadable file leaves the
    /// registry empty; every token then goes through the on-chain path.
    pub fn load(path: &str) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path, error = %e, "Token list not found, starting empty");
                return Self::new();
            }
        };
        match Self::from_json(&raw) {
            Ok(registry) => {
                tracing::info!(path, tokens = registry.len(), "Token list loaded");
                registry
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Token list unreadable, starting empty");
                Self::new()
            }
        }
    }

    pub fn from_json(raw: &str) -> eyre::Result<Self> {
        let list: HashMap<String, TokenListEntry> =
            serde_json::from_str(raw).map_err(|e| eyre::eyre!("Invalid token list: {}", e))?;
        let decimals = list
            .into_iter()
            .map(|(address, entry)| (canonical(&address), entry.decimals))
            .collect();
        Ok(Self {
            decimals: RwLock::new(decimals),
        })
    }

    pub fn get_decimals(&self, address: &str) -> Option<u8> {
        self.decimals.read().get(&canonical(address)).copied()
    }

    pub fn remember(&self, address: &str, decimals: u8) {
        self.decimals.write().insert(canonical(address), decimals);
    }

    pub fn len(&self) -> usize {
        self.decimals.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
