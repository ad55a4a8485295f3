// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error kinds surfaced by the transfer and scanning workflows.

use super::client::ChainError;
use crate::secrets::SecretError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("Account {address} not found on chain")]
    AccountLookup { address: String },

    #[error("Chain request `{operation}` failed: {source}")]
    Chain {
        operation: &'static str,
        #[source]
        source: ChainError,
    },

    #[error("Gas estimation failed at `{operation}`: {source}")]
    GasEstimation {
        operation: &'static str,
        #[source]
        source: ChainError,
    },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Broadcast rejected with code {code} ({codespace}): {raw_log}")]
    BroadcastRejected {
        code: u32,
        codespace: String,
        raw_log: String,
    },

    #[error("Broadcast failed: {0}")]
    Broadcast(#[source] ChainError),

    #[error("Transaction decoding failed: {0}")]
    Decode(String),

    #[error("Block {height} could not be fetched after {attempts} attempts: {source}")]
    BlockFetch {
        height: u64,
        attempts: u32,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("Range scan aborted at block {height}: {source}")]
    RangeAborted {
        height: u64,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("Invalid block range: start {start} is greater than end {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Wrap a gateway failure with the name of the call that produced it.
    pub fn chain(operation: &'static str) -> impl FnOnce(ChainError) -> Self {
        move |source| ServiceError::Chain { operation, source }
    }

    /// Stable machine-readable identifier for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::InvalidInput(_) => "INVALID_INPUT",
            ServiceError::KeyDerivation(_) => "KEY_DERIVATION_ERROR",
            ServiceError::Secret(_) => "SECRET_ERROR",
            ServiceError::AccountLookup { .. } => "ACCOUNT_NOT_FOUND",
            ServiceError::Chain { .. } => "CHAIN_ERROR",
            ServiceError::GasEstimation { .. } => "GAS_ESTIMATION_ERROR",
            ServiceError::Signing(_) => "SIGNING_ERROR",
            ServiceError::BroadcastRejected { .. } => "BROADCAST_REJECTED",
            ServiceError::Broadcast(_) => "BROADCAST_ERROR",
            ServiceError::Decode(_) => "DECODE_ERROR",
            ServiceError::BlockFetch { .. } => "BLOCK_FETCH_ERROR",
            ServiceError::RangeAborted { .. } => "RANGE_ABORTED",
            ServiceError::InvalidRange { .. } => "INVALID_RANGE",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
