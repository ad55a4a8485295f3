// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Address, account and balance endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{blockchain::AccountInfo, error::ApiError, state::AppState};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Transfer inputs to check before a transfer is requested.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ValidateTransferParamsRequest {
    /// Token denom, e.g. `microusds-testcore1...`
    pub to_token_denom: String,
    /// Recipient bech32 address
    pub to_address: String,
    /// Amount in base units as a decimal string
    pub to_amount: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidateTransferParamsResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AccountInfoRequest {
    /// Bech32 account address
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TreasuryAddressRequest {
    /// Secret holding the treasury mnemonic. Defaults to the USDS treasury.
    #[serde(default)]
    pub treasury_secret_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TreasuryAddressResponse {
    /// Bech32 address at index 0
    pub address: String,
    /// Derivation path of the address
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BalanceRequest {
    pub address: String,
    pub denom: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Balance in base units
    pub amount: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Validate transfer parameters without building anything.
#[utoipa::path(
    post,
    path = "/coreumservice/validate-transfer-params",
    tag = "Accounts",
    request_body = ValidateTransferParamsRequest,
    responses(
        (status = 200, description = "Parameters are valid", body = ValidateTransferParamsResponse),
        (status = 400, description = "Invalid parameters", body = crate::error::ErrorBody)
    )
)]
pub async fn validate_transfer_params(
    State(state): State<AppState>,
    Json(request): Json<ValidateTransferParamsRequest>,
) -> Result<Json<ValidateTransferParamsResponse>, ApiError> {
    state.transfers.validate_transfer_params(
        &request.to_token_denom,
        &request.to_address,
        &request.to_amount,
    )?;
    Ok(Json(ValidateTransferParamsResponse { valid: true }))
}

/// Account number and sequence of an address.
#[utoipa::path(
    post,
    path = "/coreumservice/get-account-info",
    tag = "Accounts",
    request_body = AccountInfoRequest,
    responses(
        (status = 200, description = "Account found", body = AccountInfo),
        (status = 400, description = "Invalid address", body = crate::error::ErrorBody),
        (status = 404, description = "Account unknown to the chain", body = crate::error::ErrorBody),
        (status = 503, description = "Chain unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn get_account_info(
    State(state): State<AppState>,
    Json(request): Json<AccountInfoRequest>,
) -> Result<Json<AccountInfo>, ApiError> {
    let info = state.transfers.account_info(&request.address).await?;
    Ok(Json(info))
}

/// Address of the treasury wallet.
#[utoipa::path(
    post,
    path = "/coreumservice/get-treasury-address",
    tag = "Accounts",
    request_body = TreasuryAddressRequest,
    responses(
        (status = 200, description = "Treasury address", body = TreasuryAddressResponse),
        (status = 500, description = "Treasury secret unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn get_treasury_address(
    State(state): State<AppState>,
    Json(request): Json<TreasuryAddressRequest>,
) -> Result<Json<TreasuryAddressResponse>, ApiError> {
    let secret_id = request
        .treasury_secret_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| state.network.usds.treasury_secret_id.clone());

    let info = state.transfers.treasury_address(&secret_id).await?;
    Ok(Json(TreasuryAddressResponse {
        address: info.address,
        path: info.derivation_path,
    }))
}

/// Balance of one denom held by an address.
#[utoipa::path(
    post,
    path = "/coreumservice/get-balance-of-address",
    tag = "Accounts",
    request_body = BalanceRequest,
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 400, description = "Invalid address or denom", body = crate::error::ErrorBody),
        (status = 503, description = "Chain unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn get_balance_of_address(
    State(state): State<AppState>,
    Json(request): Json<BalanceRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let amount = state
        .transfers
        .balance(&request.address, &request.denom)
        .await?;
    Ok(Json(BalanceResponse { amount }))
}
