pub mod address;
pub mod amount;

pub use address::TronAddress;
