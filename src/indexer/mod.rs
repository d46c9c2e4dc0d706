pub mod aggregator;
pub mod chain;
pub mod classic;
pub mod context;
pub mod dispatcher;
pub mod parser;
pub mod receipt_fetcher;
pub mod state;
pub mod transfer;
pub mod types;
pub mod uniswap_v2;
pub mod uniswap_v3;
pub mod valuation;
