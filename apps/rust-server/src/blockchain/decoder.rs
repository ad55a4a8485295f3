// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Raw block transaction decoding.

use prost::Message;

use super::error::ServiceError;
use super::proto;
use super::signing::compute_hash;
use super::types::{Coin, Transaction, MSG_SEND_TYPE_URL};

/// Decode raw transaction bytes into a transfer record.
///
/// Returns `Ok(None)` when the transaction carries no `MsgSend`. Only the
/// first `MsgSend` is reported.
pub fn decode_transfer(raw: &[u8], block_number: u64) -> Result<Option<Transaction>, ServiceError> {
    let tx = proto::TxRaw::decode(raw)
        .map_err(|e| ServiceError::Decode(format!("transaction envelope: {e}")))?;
    let body = proto::TxBody::decode(tx.body_bytes.as_slice())
        .map_err(|e| ServiceError::Decode(format!("transaction body: {e}")))?;

    let Some(any) = body
        .messages
        .iter()
        .find(|msg| msg.type_url == MSG_SEND_TYPE_URL)
    else {
        return Ok(None);
    };

    let send = proto::MsgSend::decode(any.value.as_slice())
        .map_err(|e| ServiceError::Decode(format!("MsgSend: {e}")))?;

    Ok(Some(Transaction {
        tx_hash: compute_hash(raw),
        from_address: send.from_address,
        to_address: send.to_address,
        memo: body.memo,
        coins: send
            .amount
            .into_iter()
            .map(|c| Coin {
                amount: c.amount,
                denom: c.denom,
            })
            .collect(),
        block_number,
    }))
}
