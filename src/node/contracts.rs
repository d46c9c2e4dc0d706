//! Read-only contract calls used for pair and token metadata.

use alloy::primitives::{B256, U256};

use super::ChainClient;
use crate::codec::TronAddress;

pub const DECIMALS: &str = "decimals()";
pub const TOKEN_ADDRESS: &str = "tokenAddress()";
pub const TOKEN0: &str = "token0()";
pub const TOKEN1: &str = "token1()";

pub async fn token_decimals(client: &dyn ChainClient, token: &TronAddress) -> eyre::Result<u8> {
    let raw = client.call_read_only(token, DECIMALS, "").await?;
    let word = first_word(&raw, token, DECIMALS)?;
    let value = U256::from_be_bytes(word.0);
    u8::try_from(value).map_err(|_| eyre::eyre!("{} on {} is out of range: {}", DECIMALS, token, value))
}

/// Token side of a classic exchange; the other side is always the native currency.
pub async fn pair_token_address(client: &dyn ChainClient, pair: &TronAddress) -> eyre::Result<TronAddress> {
    address_call(client, pair, TOKEN_ADDRESS).await
}

pub async fn token0(client: &dyn ChainClient, pair: &TronAddress) -> eyre::Result<TronAddress> {
    address_call(client, pair, TOKEN0).await
}

pub async fn token1(client: &dyn ChainClient, pair: &TronAddress) -> eyre::Result<TronAddress> {
    address_call(client, pair, TOKEN1).await
}

async fn address_call(client: &dyn ChainClient, contract: &TronAddress, selector: &str) -> eyre::Result<TronAddress> {
    let raw = client.call_read_only(contract, selector, "").await?;
    let address = TronAddress::from_word(first_word(&raw, contract, selector)?);
    if address.is_zero() {
        return Err(eyre::eyre!("{} on {} returned the zero address", selector, contract));
    }
    Ok(address)
}

fn first_word(raw: &[u8], contract: &TronAddress, selector: &str) -> eyre::Result<B256> {
    raw.get(..32)
        .map(B256::from_slice)
        .ok_or_else(|| eyre::eyre!("{} on {} returned {} bytes", selector, contract, raw.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::fake::FakeChain;

    const PAIR: &str = "TQn9Y2khEsLJW1ChVWFMSMeRDow5KcbLSE";
    const USDT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

    #[tokio::test]
    async fn test_token_decimals() {
        let chain = FakeChain::new();
        let usdt = TronAddress::parse(USDT).unwrap();
        chain.set_decimals(&usdt, 6);
        assert_eq!(token_decimals(&chain, &usdt).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_token_address_call() {
        let chain = FakeChain::new();
        let pair = TronAddress::parse(PAIR).unwrap();
        let usdt = TronAddress::parse(USDT).unwrap();
        chain.set_address_call(&pair, TOKEN_ADDRESS, &usdt);
        assert_eq!(pair_token_address(&chain, &pair).await.unwrap(), usdt);
    }

    #[tokio::test]
    async fn test_zero_address_is_error() {
        let chain = FakeChain::new();
        let pair = TronAddress::parse(PAIR).unwrap();
        chain.set_address_call(&pair, TOKEN0, &TronAddress::ZERO);
        assert!(token0(&chain, &pair).await.is_err());
    }

    #[tokio::test]
    async fn test_short_result_is_error() {
        let chain = FakeChain::new();
        let pair = TronAddress::parse(PAIR).unwrap();
        chain.set_call(&pair, TOKEN1, vec![0u8; 4]);
        assert!(token1(&chain, &pair).await.is_err());
        // Unscripted call fails too.
        assert!(token0(&chain, &pair).await.is_err());
    }
}
