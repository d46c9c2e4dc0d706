pub mod cache;
pub mod codec;
pub mod config;
pub mod indexer;
pub mod node;
pub mod pricing;
pub mod publish;
pub mod tokens;

#[cfg(test)]
pub(crate) mod testing;
