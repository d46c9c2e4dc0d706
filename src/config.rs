use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub chain: ChainConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub tokens: TokensConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

// ============================================================
// Node
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    #[serde(default = "default_network")]
    pub network: String,
    pub node_url: String,
    /// `wallet` for full nodes / TronGrid, `walletsolidity` for solidity nodes.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub receipt_mode: ReceiptMode,
}

fn default_network() -> String {
    "TRON".to_string()
}

fn default_api_prefix() -> String {
    "wallet".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

/// How transaction receipts (and their logs) are fetched for a block.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptMode {
    #[default]
    PerTransaction,
    Block,
}

// ============================================================
// Cache
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub redis_url: Option<String>,
    #[serde(default = "default_pair_ttl_secs")]
    pub pair_ttl_secs: u64,
    #[serde(default = "default_price_snapshot_ttl_secs")]
    pub price_snapshot_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            pair_ttl_secs: default_pair_ttl_secs(),
            price_snapshot_ttl_secs: default_price_snapshot_ttl_secs(),
        }
    }
}

fn default_pair_ttl_secs() -> u64 {
    96 * 3600
}

fn default_price_snapshot_ttl_secs() -> u64 {
    30
}

// ============================================================
// Tokens
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct TokensConfig {
    #[serde(default = "default_token_list_path")]
    pub list_path: String,
    #[serde(default = "default_decimals_attempts")]
    pub decimals_attempts: u32,
    #[serde(default)]
    pub decimals_backoff_ms: u64,
    #[serde(default)]
    pub pair_token_overrides: Vec<PairTokenOverride>,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            list_path: default_token_list_path(),
            decimals_attempts: default_decimals_attempts(),
            decimals_backoff_ms: 0,
            pair_token_overrides: Vec::new(),
        }
    }
}

fn default_token_list_path() -> String {
    "tokens.json".to_string()
}

fn default_decimals_attempts() -> u32 {
    5
}

/// Classic pair whose `tokenAddress()` is known to answer wrongly.
///
/// ```toml
/// [[tokens.pair_token_overrides]]
/// pair = "TXk8rQSAvPvBBNtqSoY6nCfsXWCSSpTVQF"
/// token = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t"
/// ```
#[derive(Debug, Deserialize, Clone)]
pub struct PairTokenOverride {
    pub pair: String,
    pub token: String,
}

// ============================================================
// Pricing
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    #[serde(default = "default_quotes_path")]
    pub quotes_path: String,
    /// Classic pairs whose reserve snapshots also refresh the native currency price.
    #[serde(default)]
    pub reference_pairs: Vec<String>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            quotes_path: default_quotes_path(),
            reference_pairs: Vec::new(),
        }
    }
}

fn default_quotes_path() -> String {
    "quotes.json".to_string()
}

// ============================================================
// Parser / source
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ParserConfig {
    /// Upper bound on concurrently decoded logs per block; 0 means one task per log.
    #[serde(default)]
    pub max_concurrent_logs: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
    #[serde(default)]
    pub notify: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            start_block: None,
            end_block: None,
            notify: false,
            poll_interval_ms: default_poll_interval_ms(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_shutdown_grace_secs() -> u64 {
    6
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.chain.network.trim().is_empty() {
            return Err(eyre::eyre!("Network name must not be empty"));
        }
        if !self.chain.node_url.starts_with("http://") && !self.chain.node_url.starts_with("https://") {
            return Err(eyre::eyre!("Invalid node URL '{}'", self.chain.node_url));
        }
        if self.tokens.decimals_attempts == 0 {
            return Err(eyre::eyre!("tokens.decimals_attempts must be at least 1"));
        }
        if let (Some(start), Some(end)) = (self.source.start_block, self.source.end_block) {
            if start > end {
                return Err(eyre::eyre!(
                    "source.start_block ({}) is past source.end_block ({})",
                    start,
                    end
                ));
            }
        }
        if self.source.start_block == Some(0) {
            return Err(eyre::eyre!("source.start_block must be positive"));
        }
        Ok(())
    }
}
