// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Direct-mode signing and transaction hashing.
//!
//! Signatures are RFC 6979 deterministic, so signing the same unsigned
//! transaction twice yields the same bytes and the same hash.

use k256::ecdsa::signature::Signer;
use k256::ecdsa::Signature;
use prost::Message;
use sha2::{Digest, Sha256};

use super::builder::UnsignedTransferTx;
use super::error::ServiceError;
use super::keys::{KeyRecord, Keyring};
use super::proto;

/// Serialized transaction ready for broadcast, with its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    bytes: Vec<u8>,
    hash: String,
}

impl SignedTx {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Upper-case hex SHA-256 of [`bytes`](Self::bytes).
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.bytes, self.hash)
    }
}

/// Transaction hash as reported by the chain: upper-case hex SHA-256.
pub fn compute_hash(tx_bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(tx_bytes))
}

/// Sign `tx` with the key it names and encode it as `TxRaw`.
pub fn sign_and_serialize(
    keyring: &Keyring,
    tx: &UnsignedTransferTx,
) -> Result<SignedTx, ServiceError> {
    let key = resolve_signer(keyring, tx)?;
    let public_key = key.public_key();

    let body_bytes = tx.body_bytes();
    let auth_info_bytes = tx
        .auth_info_bytes(&public_key)
        .map_err(|e| ServiceError::Signing(e.to_string()))?;

    let sign_doc = proto::SignDoc {
        body_bytes: body_bytes.clone(),
        auth_info_bytes: auth_info_bytes.clone(),
        chain_id: tx.chain_id().to_string(),
        account_number: tx.account_number(),
    }
    .encode_to_vec();

    let signature: Signature = key
        .signing_key()
        .try_sign(&sign_doc)
        .map_err(|e| ServiceError::Signing(e.to_string()))?;
    let signature = signature.normalize_s().unwrap_or(signature);

    let bytes = proto::TxRaw {
        body_bytes,
        auth_info_bytes,
        signatures: vec![signature.to_bytes().to_vec()],
    }
    .encode_to_vec();
    let hash = compute_hash(&bytes);

    tracing::debug!(
        signer = key.name(),
        sequence = tx.sequence(),
        tx_hash = %hash,
        "Signed transfer"
    );

    Ok(SignedTx { bytes, hash })
}

/// Encode `tx` for simulation: signer public key and sequence are present,
/// the signature is empty.
pub fn simulation_bytes(keyring: &Keyring, tx: &UnsignedTransferTx) -> Result<Vec<u8>, ServiceError> {
    let key = resolve_signer(keyring, tx)?;
    let auth_info_bytes = tx
        .auth_info_bytes(&key.public_key())
        .map_err(|e| ServiceError::Signing(e.to_string()))?;

    Ok(proto::TxRaw {
        body_bytes: tx.body_bytes(),
        auth_info_bytes,
        signatures: vec![Vec::new()],
    }
    .encode_to_vec())
}

/// Use the attached key name if there is one, otherwise look the key up by
/// the sender address.
fn resolve_signer<'a>(
    keyring: &'a Keyring,
    tx: &UnsignedTransferTx,
) -> Result<&'a KeyRecord, ServiceError> {
    let key = match tx.from_name() {
        Some(name) => keyring
            .key_by_name(name)
            .ok_or_else(|| ServiceError::Signing(format!("No key named `{name}` in keyring")))?,
        None => keyring.key_by_address(tx.from_address()).ok_or_else(|| {
            ServiceError::Signing(format!(
                "No key for address {} in keyring",
                tx.from_address()
            ))
        })?,
    };

    if key.address() != tx.from_address() {
        return Err(ServiceError::Signing(format!(
            "Key `{}` does not control {}",
            key.name(),
            tx.from_address()
        )));
    }
    Ok(key)
}
