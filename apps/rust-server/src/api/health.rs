// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{config::NetworkProfile, state::AppState};

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Deployment stage the service runs as.
    pub stage: String,
    /// Chain the service is configured for.
    pub chain_id: String,
    /// Network parameters the service operates with.
    pub network: NetworkSummary,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Settlement parameters of the configured network.
#[derive(Debug, Serialize, ToSchema)]
pub struct NetworkSummary {
    /// Blocks a transfer must be buried under before it counts as settled.
    pub confirmations: u32,
    pub usds: AssetSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssetSummary {
    pub denom: String,
    pub decimals: u32,
    /// Supply minted at genesis, in base units
    pub initial_token_supply: u64,
    pub issuance_enabled: bool,
    pub redemption_enabled: bool,
}

impl From<&NetworkProfile> for NetworkSummary {
    fn from(network: &NetworkProfile) -> Self {
        let usds = &network.usds;
        Self {
            confirmations: network.confirmations,
            usds: AssetSummary {
                denom: usds.denom.clone(),
                decimals: usds.decimals,
                initial_token_supply: usds.initial_token_supply,
                issuance_enabled: usds.issuance_enabled,
                redemption_enabled: usds.redemption_enabled,
            },
        }
    }
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Node reachability: "ok", "catching_up" or "unavailable".
    pub node: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint used by the tokenization backend.
#[utoipa::path(
    post,
    path = "/coreumservice/healthcheck",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn healthcheck() -> Json<HealthResponse> {
    liveness().await
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Returns 200 only if the node answers and is not catching up.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let node = match state.transfers.latest_block_status().await {
        Ok(status) if status.catching_up => "catching_up",
        Ok(_) => "ok",
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check could not reach the node");
            "unavailable"
        }
    };
    let ready = node == "ok";

    let response = ReadyResponse {
        status: if ready { "ok" } else { "degraded" }.to_string(),
        stage: state.stage.to_string(),
        chain_id: state.network.chain_id.clone(),
        network: NetworkSummary::from(state.network.as_ref()),
        checks: HealthChecks {
            service: "ok".to_string(),
            node: node.to_string(),
        },
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
