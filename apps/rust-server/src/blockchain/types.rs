// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::gas::GasPrice;

/// SLIP-0044 coin type registered for Coreum.
pub const COREUM_COIN_TYPE: u32 = 990;

/// Protobuf type URL of the bank transfer message.
pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";

/// Protobuf type URL of a secp256k1 public key.
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

/// Address and the derivation path it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddressInfo {
    /// Bech32 account address
    pub address: String,
    /// BIP-44 derivation path, e.g. `m/44'/990'/0'/0/0`
    pub derivation_path: String,
}

/// On-chain account state. Read fresh for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// Gas parameters proposed for a transfer.
///
/// The triple must be passed back unchanged when broadcasting so that the
/// signed bytes (and therefore the hash) match the proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferTokenParams {
    /// Adjusted gas price, e.g. `0.068750000000000000ucore`
    #[schema(value_type = String)]
    pub gas_price: GasPrice,
    /// Gas limit taken from simulation
    pub gas_used: u64,
    /// Sender sequence at proposal time
    pub sequence_number: u64,
}

/// Gas price and gas limit pair returned by simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasQuote {
    pub gas_price: GasPrice,
    pub gas_used: u64,
}

/// What the caller wants transferred. Sender is resolved separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub recipient: String,
    pub denom: String,
    pub amount: u64,
    pub memo: String,
}

/// A single coin amount as reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Coin {
    pub amount: String,
    pub denom: String,
}

/// Normalized bank transfer found in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// SHA-256 of the raw transaction bytes, upper-case hex
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
    pub coins: Vec<Coin>,
    /// Height the transaction was included at
    pub block_number: u64,
}

/// Node sync snapshot, passed through from the Tendermint status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BlockStatus {
    pub latest_block_hash: String,
    pub latest_app_hash: String,
    pub latest_block_height: i64,
    /// Unix seconds
    pub latest_block_time: i64,
    pub earliest_block_hash: String,
    pub earliest_app_hash: String,
    pub earliest_block_height: i64,
    /// Unix seconds
    pub earliest_block_time: i64,
    pub catching_up: bool,
}

/// Chain acknowledgment of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastResult {
    pub tx_hash: String,
    pub code: u32,
    pub codespace: String,
    pub raw_log: String,
}

/// Result of looking a transaction up by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionDetail {
    pub tx_hash: String,
    pub height: u64,
    pub code: u32,
    #[serde(default)]
    pub memo: String,
}

/// Outcome of a successful broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Hash reported by the chain
    pub tx_hash: String,
    /// The parameters the transaction was signed with
    pub params: TransferTokenParams,
}

/// Lifecycle of a transfer request, used for log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Proposed,
    Built,
    Simulated,
    Signed,
    Broadcast,
    Confirmed,
    Rejected,
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransferStage::Proposed => "proposed",
            TransferStage::Built => "built",
            TransferStage::Simulated => "simulated",
            TransferStage::Signed => "signed",
            TransferStage::Broadcast => "broadcast",
            TransferStage::Confirmed => "confirmed",
            TransferStage::Rejected => "rejected",
        };
        f.write_str(name)
    }
}
