// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token transfer endpoints: gas proposals, hashing and broadcasting.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    blockchain::{GasPrice, GasQuote, MnemonicSource, TransferIntent, TransferTokenParams},
    error::ApiError,
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Transfer to price without a sequence.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProposeTransferRequest {
    /// Secret holding the sender mnemonic
    pub sender_secret_id: String,
    pub token_denom: String,
    /// Amount in base units
    pub token_amount: u64,
    pub recipient_address: String,
    #[serde(default)]
    pub memo: String,
}

/// Transfer to price at a caller-chosen sequence.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GasForTransferRequest {
    pub sender_secret_id: String,
    pub token_denom: String,
    pub token_amount: u64,
    pub recipient_address: String,
    pub sequence_number: u64,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GasForTransferResponse {
    /// Adjusted gas price, e.g. `0.068750000000000000ucore`
    pub gas_price: String,
    pub gas_used: u64,
}

/// Transfer from a treasury wallet.
///
/// `gas_price` and `gas_used` should come unchanged from a proposal. When
/// either is missing, empty or zero, fresh params are proposed first.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub sender_secret_id: String,
    pub token_denom: String,
    pub sequence_number: u64,
    pub token_amount: u64,
    #[serde(default)]
    pub memo: String,
    pub recipient_address: String,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub gas_used: Option<u64>,
}

/// Transfer signed with a mnemonic supplied in the request. Non-production only.
#[derive(Clone, Deserialize, ToSchema)]
pub struct TestTransferRequest {
    pub sender_mnemonic: String,
    pub recipient_address: String,
    pub token_denom: String,
    pub token_amount: u64,
    #[serde(default)]
    pub memo: String,
    pub sequence_number: u64,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub gas_used: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferResponse {
    pub tx_hash: String,
}

/// Transfer to hash without broadcasting. Gas must be given explicitly.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CalculateHashRequest {
    pub sender_secret_id: String,
    pub token_denom: String,
    pub sequence_number: u64,
    pub token_amount: u64,
    #[serde(default)]
    pub memo: String,
    pub recipient_address: String,
    pub gas_price: String,
    pub gas_used: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CalculateHashResponse {
    pub calculated_tx_hash: String,
}

// =============================================================================
// Helper Functions
// =============================================================================

fn intent(recipient: String, denom: String, amount: u64, memo: String) -> TransferIntent {
    TransferIntent {
        recipient,
        denom,
        amount,
        memo,
    }
}

fn parse_gas_price(raw: &str) -> Result<GasPrice, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid gas price {raw:?}: {e}")))
}

/// Explicit gas from the request, or `None` to have it proposed.
fn requested_gas(
    gas_price: Option<String>,
    gas_used: Option<u64>,
) -> Result<Option<GasQuote>, ApiError> {
    let gas_price = gas_price.filter(|p| !p.trim().is_empty());
    let gas_used = gas_used.filter(|g| *g > 0);
    match (gas_price, gas_used) {
        (Some(price), Some(gas_used)) => Ok(Some(GasQuote {
            gas_price: parse_gas_price(&price)?,
            gas_used,
        })),
        _ => Ok(None),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Propose gas price, gas limit and sequence for a treasury transfer.
#[utoipa::path(
    post,
    path = "/coreumservice/propose-transfer-params",
    tag = "Transfers",
    request_body = ProposeTransferRequest,
    responses(
        (status = 200, description = "Proposed params", body = TransferTokenParams),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 404, description = "Sender account unknown", body = crate::error::ErrorBody),
        (status = 422, description = "Simulation failed", body = crate::error::ErrorBody),
        (status = 500, description = "Treasury secret unusable", body = crate::error::ErrorBody),
        (status = 503, description = "Chain unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn propose_transfer_params(
    State(state): State<AppState>,
    Json(request): Json<ProposeTransferRequest>,
) -> Result<Json<TransferTokenParams>, ApiError> {
    let source = MnemonicSource::Secret(request.sender_secret_id);
    let intent = intent(
        request.recipient_address,
        request.token_denom,
        request.token_amount,
        request.memo,
    );
    let params = state.transfers.propose_params(&source, &intent).await?;
    Ok(Json(params))
}

/// Estimate gas for a treasury transfer at the given sequence.
#[utoipa::path(
    post,
    path = "/coreumservice/get-gas-for-transfer-stably-token",
    tag = "Transfers",
    request_body = GasForTransferRequest,
    responses(
        (status = 200, description = "Gas estimate", body = GasForTransferResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 404, description = "Sender account unknown", body = crate::error::ErrorBody),
        (status = 422, description = "Simulation failed", body = crate::error::ErrorBody),
        (status = 500, description = "Treasury secret unusable", body = crate::error::ErrorBody),
        (status = 503, description = "Chain unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn get_gas_for_transfer(
    State(state): State<AppState>,
    Json(request): Json<GasForTransferRequest>,
) -> Result<Json<GasForTransferResponse>, ApiError> {
    let source = MnemonicSource::Secret(request.sender_secret_id);
    let intent = intent(
        request.recipient_address,
        request.token_denom,
        request.token_amount,
        request.memo,
    );
    let quote = state
        .transfers
        .estimate_transfer_gas(&source, &intent, request.sequence_number)
        .await?;
    Ok(Json(GasForTransferResponse {
        gas_price: quote.gas_price.to_string(),
        gas_used: quote.gas_used,
    }))
}

/// Sign and broadcast a transfer from a treasury wallet.
#[utoipa::path(
    post,
    path = "/coreumservice/transfer-stably-token",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer broadcast", body = TransferResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 404, description = "Sender account unknown", body = crate::error::ErrorBody),
        (status = 422, description = "Rejected by the chain", body = crate::error::ErrorBody),
        (status = 500, description = "Treasury secret or signing failure", body = crate::error::ErrorBody),
        (status = 503, description = "Chain unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn transfer_stably_token(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let gas = requested_gas(request.gas_price, request.gas_used)?;
    let source = MnemonicSource::Secret(request.sender_secret_id);
    let intent = intent(
        request.recipient_address,
        request.token_denom,
        request.token_amount,
        request.memo,
    );
    let receipt = state
        .transfers
        .execute_transfer(&source, &intent, request.sequence_number, gas)
        .await?;
    Ok(Json(TransferResponse {
        tx_hash: receipt.tx_hash,
    }))
}

/// Sign and broadcast a transfer with a caller-supplied mnemonic.
#[utoipa::path(
    post,
    path = "/coreumservice/test-only/transfer-stably-token",
    tag = "Transfers",
    request_body = TestTransferRequest,
    responses(
        (status = 200, description = "Transfer broadcast", body = TransferResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 422, description = "Rejected by the chain", body = crate::error::ErrorBody)
    )
)]
pub async fn test_transfer_stably_token(
    State(state): State<AppState>,
    Json(request): Json<TestTransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let gas = requested_gas(request.gas_price, request.gas_used)?;
    let source = MnemonicSource::Mnemonic(request.sender_mnemonic);
    let intent = intent(
        request.recipient_address,
        request.token_denom,
        request.token_amount,
        request.memo,
    );
    let receipt = state
        .transfers
        .execute_transfer(&source, &intent, request.sequence_number, gas)
        .await?;
    Ok(Json(TransferResponse {
        tx_hash: receipt.tx_hash,
    }))
}

/// Hash a treasury transfer would get if broadcast with the given params.
#[utoipa::path(
    post,
    path = "/coreumservice/calculate-hash-of-transfer",
    tag = "Transfers",
    request_body = CalculateHashRequest,
    responses(
        (status = 200, description = "Transaction hash", body = CalculateHashResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 404, description = "Sender account unknown", body = crate::error::ErrorBody),
        (status = 500, description = "Treasury secret or signing failure", body = crate::error::ErrorBody),
        (status = 503, description = "Chain unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn calculate_hash_of_transfer(
    State(state): State<AppState>,
    Json(request): Json<CalculateHashRequest>,
) -> Result<Json<CalculateHashResponse>, ApiError> {
    let params = TransferTokenParams {
        gas_price: parse_gas_price(&request.gas_price)?,
        gas_used: request.gas_used,
        sequence_number: request.sequence_number,
    };
    let source = MnemonicSource::Secret(request.sender_secret_id);
    let intent = intent(
        request.recipient_address,
        request.token_denom,
        request.token_amount,
        request.memo,
    );
    let calculated_tx_hash = state
        .transfers
        .calculate_transfer_hash(&source, &intent, &params)
        .await?;
    Ok(Json(CalculateHashResponse { calculated_tx_hash }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_gas_is_proposed() {
        assert!(requested_gas(None, None).unwrap().is_none());
        assert!(requested_gas(Some(String::new()), Some(80_000)).unwrap().is_none());
        assert!(requested_gas(Some("0.0625ucore".to_string()), Some(0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn explicit_gas_is_parsed() {
        let quote = requested_gas(Some("0.0625ucore".to_string()), Some(80_000))
            .unwrap()
            .unwrap();
        assert_eq!(quote.gas_used, 80_000);
        assert_eq!(quote.gas_price.denom(), "ucore");

        let err = requested_gas(Some("cheap".to_string()), Some(1)).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
