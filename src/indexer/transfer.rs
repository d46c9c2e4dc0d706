use alloy::primitives::{Log as PrimitiveLog, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;

use super::context::BlockContext;
use super::dispatcher::selector;
use super::types::{Holder, LogContext, TransferEvent, NATIVE_SYMBOL};
use crate::codec::TronAddress;
use crate::node::types::Transaction;

sol! {
    interface ITRC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

pub const TRANSFER: u32 = selector(ITRC20::Transfer::SIGNATURE_HASH);

/// TRC-20 transfer. The amount stays raw; transfers are not priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub from: TronAddress,
    pub to: TronAddress,
    pub value: U256,
}

/// Only the standard layout (from and to indexed, value in data) is decoded.
pub fn decode(log: &PrimitiveLog) -> alloy::sol_types::Result<TokenTransfer> {
    if log.topics().len() != 3 {
        tracing::debug!(
            contract = %TronAddress::from_evm(log.address),
            topics = log.topics().len(),
            "Non-standard Transfer layout, skipping"
        );
        return Err(alloy::sol_types::Error::custom("non-standard Transfer layout"));
    }
    let event = ITRC20::Transfer::decode_log(log)?;
    Ok(TokenTransfer {
        from: TronAddress::from_evm(event.from),
        to: TronAddress::from_evm(event.to),
        value: event.value,
    })
}

/// Record the transfer and its holder delta. Zero-value transfers are noise.
pub fn apply(ctx: &BlockContext, lctx: &LogContext, token: &TronAddress, transfer: TokenTransfer) {
    if transfer.value.is_zero() {
        return;
    }

    let token = token.to_base58();
    let from = transfer.from.to_base58();
    let to = transfer.to.to_base58();

    ctx.state.add_holder(Holder {
        token: token.clone(),
        from: from.clone(),
        to: to.clone(),
        tx: lctx.tx.clone(),
    });
    ctx.state.add_transfer(TransferEvent {
        chain: ctx.network().to_string(),
        contract: token,
        block_number: ctx.height(),
        date: lctx.date(),
        order: lctx.order,
        tx: lctx.tx.clone(),
        from,
        to,
        amount: transfer.value,
    });
}

/// Holder delta for a plain TRX transfer, read straight from the block body.
pub fn apply_native(ctx: &BlockContext, tx: &Transaction) {
    let Some(call) = tx.raw_data.contract.first() else {
        return;
    };
    let value = &call.parameter.value;
    if value.amount.unwrap_or(0) <= 0 {
        return;
    }

    let from = TronAddress::parse(&value.owner_address);
    let to = value.to_address.as_deref().map(TronAddress::parse);
    match (from, to) {
        (Ok(from), Some(Ok(to))) => ctx.state.add_holder(Holder {
            token: NATIVE_SYMBOL.to_string(),
            from: from.to_base58(),
            to: to.to_base58(),
            tx: tx.tx_id.clone(),
        }),
        _ => tracing::debug!(block = ctx.height(), tx = %tx.tx_id, "Unreadable transfer addresses"),
    }
}
