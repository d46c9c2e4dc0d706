pub mod registry;
pub mod resolver;

pub use registry::TokenRegistry;
pub use resolver::PairResolver;
