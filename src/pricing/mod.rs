pub mod fiat;
pub mod quotes;

pub use fiat::FiatConverter;
pub use quotes::QuoteConfig;
