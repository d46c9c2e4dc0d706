use serde::Deserialize;

use crate::codec::address::canonical;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuoteKind {
    #[default]
    Normal,
    /// Pinned at exactly 1 USD.
    Stable,
}

/// One entry of the quote table.
#[derive(Debug, Deserialize, Clone)]
pub struct QuotePair {
    pub title: String,
    pub token: String,
    #[serde(default)]
    pub kind: QuoteKind,
    /// Invert the pair price before storing it as a rate.
    #[serde(default)]
    pub flipped: bool,
    /// Pair whose swaps refresh this token's rate.
    #[serde(default)]
    pub pair: Option<String>,
    /// Inactive from this height on.
    #[serde(default)]
    pub before: Option<u64>,
    /// Inactive below this height.
    #[serde(default)]
    pub after: Option<u64>,
}

impl QuotePair {
    pub fn is_active(&self, height: u64) -> bool {
        if matches!(self.after, Some(after) if height < after) {
            return false;
        }
        if matches!(self.before, Some(before) if height >= before) {
            return false;
        }
        true
    }

    pub fn token_key(&self) -> String {
        canonical(&self.token)
    }

    pub fn pair_key(&self) -> Option<String> {
        self.pair.as_deref().map(canonical)
    }
}

/// Static quote table loaded from `quotes.json` (`{"quotes": [...]}`).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct QuoteConfig {
    #[serde(default)]
    pub quotes: Vec<QuotePair>,
}

impl QuoteConfig {
    /// A missing or malformed file yields an empty table.
    pub fn load(path: &str) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path, error = %e, "Quote table not found, no fiat rates pre-seeded");
                return Self::default();
            }
        };
        match serde_json::from_str::<QuoteConfig>(&raw) {
            Ok(config) => {
                tracing::info!(path, quotes = config.quotes.len(), "Quote table loaded");
                config
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Quote table unreadable, no fiat rates pre-seeded");
                Self::default()
            }
        }
    }

    pub fn active(&self, height: u64) -> impl Iterator<Item = &QuotePair> {
        self.quotes.iter().filter(move |q| q.is_active(height))
    }
}
