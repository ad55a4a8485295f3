// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Block and transaction lookup endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    blockchain::{BlockStatus, Transaction, TransactionDetail},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BlockStatusResponse {
    pub block_status: BlockStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BlockTransactionsRequest {
    pub block_number: u64,
}

/// Inclusive block range.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BlockRangeRequest {
    pub start_block_number: u64,
    pub end_block_number: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionsResponse {
    /// Transfers ordered by block height
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransactionByHashRequest {
    /// Hex encoded transaction hash
    pub transaction_hash: String,
}

/// Head and sync status of the node.
#[utoipa::path(
    post,
    path = "/coreumservice/get-latest-block-status",
    tag = "Blocks",
    responses(
        (status = 200, description = "Node status", body = BlockStatusResponse),
        (status = 503, description = "Node unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn get_latest_block_status(
    State(state): State<AppState>,
) -> Result<Json<BlockStatusResponse>, ApiError> {
    let block_status = state.transfers.latest_block_status().await?;
    Ok(Json(BlockStatusResponse { block_status }))
}

/// Transfers included in one block.
#[utoipa::path(
    post,
    path = "/coreumservice/get-block-transactions",
    tag = "Blocks",
    request_body = BlockTransactionsRequest,
    responses(
        (status = 200, description = "Transfers in the block", body = TransactionsResponse),
        (status = 503, description = "Block unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn get_block_transactions(
    State(state): State<AppState>,
    Json(request): Json<BlockTransactionsRequest>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let transactions = state
        .scanner
        .block_transactions(request.block_number)
        .await?;
    Ok(Json(TransactionsResponse { transactions }))
}

/// Transfers included in an inclusive block range.
///
/// Blocks are fetched concurrently and retried individually. If any block
/// still fails, the whole request fails.
#[utoipa::path(
    post,
    path = "/coreumservice/get-block-transactions-in-range",
    tag = "Blocks",
    request_body = BlockRangeRequest,
    responses(
        (status = 200, description = "Transfers in the range", body = TransactionsResponse),
        (status = 400, description = "Invalid range", body = crate::error::ErrorBody),
        (status = 503, description = "A block could not be fetched", body = crate::error::ErrorBody)
    )
)]
pub async fn get_block_transactions_in_range(
    State(state): State<AppState>,
    Json(request): Json<BlockRangeRequest>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let transactions = state
        .scanner
        .block_transactions_in_range(request.start_block_number, request.end_block_number)
        .await?;
    Ok(Json(TransactionsResponse { transactions }))
}

/// Committed transaction by hash.
#[utoipa::path(
    post,
    path = "/coreumservice/get-transaction-by-hash",
    tag = "Blocks",
    request_body = TransactionByHashRequest,
    responses(
        (status = 200, description = "Transaction found", body = TransactionDetail),
        (status = 400, description = "Malformed hash", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown or failed transaction", body = crate::error::ErrorBody)
    )
)]
pub async fn get_transaction_by_hash(
    State(state): State<AppState>,
    Json(request): Json<TransactionByHashRequest>,
) -> Result<Json<TransactionDetail>, ApiError> {
    state
        .transfers
        .transaction_by_hash(&request.transaction_hash)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "Transaction {} not found",
                request.transaction_hash
            ))
        })
}
