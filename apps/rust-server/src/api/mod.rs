// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{
        AccountInfo, BlockStatus, Coin, Transaction, TransactionDetail, TransferTokenParams,
    },
    error::ErrorBody,
    state::AppState,
};

pub mod account;
pub mod blocks;
pub mod health;
pub mod transfer;

pub fn router(state: AppState) -> Router {
    let mut service_routes = Router::new()
        .route("/healthcheck", post(health::healthcheck))
        .route(
            "/validate-transfer-params",
            post(account::validate_transfer_params),
        )
        .route("/get-account-info", post(account::get_account_info))
        .route("/get-treasury-address", post(account::get_treasury_address))
        .route(
            "/get-balance-of-address",
            post(account::get_balance_of_address),
        )
        .route(
            "/propose-transfer-params",
            post(transfer::propose_transfer_params),
        )
        .route(
            "/get-gas-for-transfer-stably-token",
            post(transfer::get_gas_for_transfer),
        )
        .route(
            "/transfer-stably-token",
            post(transfer::transfer_stably_token),
        )
        .route(
            "/calculate-hash-of-transfer",
            post(transfer::calculate_hash_of_transfer),
        )
        .route(
            "/get-latest-block-status",
            post(blocks::get_latest_block_status),
        )
        .route(
            "/get-block-transactions",
            post(blocks::get_block_transactions),
        )
        .route(
            "/get-block-transactions-in-range",
            post(blocks::get_block_transactions_in_range),
        )
        .route(
            "/get-transaction-by-hash",
            post(blocks::get_transaction_by_hash),
        );

    // Mnemonics in request bodies are never accepted in production.
    if !state.stage.is_prod() {
        service_routes = service_routes.route(
            "/test-only/transfer-stably-token",
            post(transfer::test_transfer_stably_token),
        );
    }

    Router::new()
        .nest("/coreumservice", service_routes)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("-");
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck,
        health::liveness,
        health::readiness,
        account::validate_transfer_params,
        account::get_account_info,
        account::get_treasury_address,
        account::get_balance_of_address,
        transfer::propose_transfer_params,
        transfer::get_gas_for_transfer,
        transfer::transfer_stably_token,
        transfer::test_transfer_stably_token,
        transfer::calculate_hash_of_transfer,
        blocks::get_latest_block_status,
        blocks::get_block_transactions,
        blocks::get_block_transactions_in_range,
        blocks::get_transaction_by_hash
    ),
    components(
        schemas(
            AccountInfo,
            BlockStatus,
            Coin,
            Transaction,
            TransactionDetail,
            TransferTokenParams,
            ErrorBody,
            health::HealthResponse,
            health::ReadyResponse,
            health::NetworkSummary,
            health::AssetSummary,
            health::HealthChecks,
            account::ValidateTransferParamsRequest,
            account::ValidateTransferParamsResponse,
            account::AccountInfoRequest,
            account::TreasuryAddressRequest,
            account::TreasuryAddressResponse,
            account::BalanceRequest,
            account::BalanceResponse,
            transfer::ProposeTransferRequest,
            transfer::GasForTransferRequest,
            transfer::GasForTransferResponse,
            transfer::TransferRequest,
            transfer::TestTransferRequest,
            transfer::TransferResponse,
            transfer::CalculateHashRequest,
            transfer::CalculateHashResponse,
            blocks::BlockStatusResponse,
            blocks::BlockTransactionsRequest,
            blocks::BlockRangeRequest,
            blocks::TransactionsResponse,
            blocks::TransactionByHashRequest
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Accounts", description = "Treasury address, account and balance lookups"),
        (name = "Transfers", description = "Gas proposals, hashing and broadcasting of token transfers"),
        (name = "Blocks", description = "Block scanning and transaction lookup")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::blockchain::decoder::tests::{msg_send, raw_tx};
    use crate::blockchain::keys::{derive_address, tests::TEST_MNEMONIC};
    use crate::blockchain::mock::MockGateway;
    use crate::blockchain::ScannerConfig;
    use crate::config::{ServiceConfig, Stage, STAGE_ENV, TREASURY_SECRET_ID};
    use crate::secrets::{JsonSecretProvider, SecretCache};

    fn test_state(gateway: Arc<MockGateway>, stage: Stage) -> AppState {
        let mut config = ServiceConfig::from_lookup(|name| {
            (name == STAGE_ENV).then(|| stage.as_str().to_string())
        })
        .unwrap();
        config.scanner = ScannerConfig {
            max_attempts: 2,
            retry_delay: Duration::from_millis(1),
            max_concurrency: 4,
            max_range_blocks: 50,
        };

        let provider = JsonSecretProvider::from_json(&format!(
            r#"{{"coreum": {{"{TREASURY_SECRET_ID}": "{TEST_MNEMONIC}"}}}}"#
        ))
        .unwrap();
        AppState::new(
            &config,
            gateway,
            Arc::new(SecretCache::new(Arc::new(provider))),
        )
    }

    fn app(gateway: Arc<MockGateway>) -> Router {
        router(test_state(gateway, Stage::Test))
    }

    fn recipient() -> String {
        derive_address(TEST_MNEMONIC, 1, "testcore").unwrap().address
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn transfer_body() -> Value {
        json!({
            "sender_secret_id": TREASURY_SECRET_ID,
            "token_denom": "utestcore",
            "token_amount": 25,
            "recipient_address": recipient(),
            "memo": "payout-17",
        })
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = app(Arc::new(MockGateway::new()));
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn healthcheck_and_readiness() {
        let gateway = Arc::new(MockGateway::new());
        let (status, body) =
            post_json(app(gateway.clone()), "/coreumservice/healthcheck", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let request = Request::builder()
            .uri("/health/ready")
            .body(Body::empty())
            .unwrap();
        let response = app(gateway).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["chain_id"], "coreum-testnet-1");
        assert_eq!(body["network"]["confirmations"], 1);
        assert_eq!(body["network"]["usds"]["decimals"], 6);
        assert_eq!(body["network"]["usds"]["issuance_enabled"], true);
    }

    #[tokio::test]
    async fn treasury_address_uses_default_secret() {
        let (status, body) = post_json(
            app(Arc::new(MockGateway::new())),
            "/coreumservice/get-treasury-address",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let expected = derive_address(TEST_MNEMONIC, 0, "testcore").unwrap();
        assert_eq!(body["address"], expected.address);
        assert_eq!(body["path"], "m/44'/990'/0'/0/0");
    }

    #[tokio::test]
    async fn proposed_params_hash_matches_broadcast() {
        let gateway = Arc::new(MockGateway::new());

        let (status, params) = post_json(
            app(gateway.clone()),
            "/coreumservice/propose-transfer-params",
            transfer_body(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(params["sequence_number"], MockGateway::SEQUENCE);
        assert_eq!(params["gas_used"], MockGateway::SIMULATED_GAS);

        let mut body = transfer_body();
        body["sequence_number"] = params["sequence_number"].clone();
        body["gas_price"] = params["gas_price"].clone();
        body["gas_used"] = params["gas_used"].clone();

        let (status, hashed) = post_json(
            app(gateway.clone()),
            "/coreumservice/calculate-hash-of-transfer",
            body.clone(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, sent) = post_json(
            app(gateway.clone()),
            "/coreumservice/transfer-stably-token",
            body,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sent["tx_hash"], hashed["calculated_tx_hash"]);
        assert_eq!(gateway.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn transfer_without_gas_is_priced_first() {
        let gateway = Arc::new(MockGateway::new());
        let mut body = transfer_body();
        body["sequence_number"] = json!(MockGateway::SEQUENCE);
        body["gas_price"] = json!("");

        let (status, sent) = post_json(
            app(gateway.clone()),
            "/coreumservice/transfer-stably-token",
            body,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(sent["tx_hash"].as_str().is_some_and(|h| !h.is_empty()));
        assert_eq!(gateway.simulate_calls(), 1);
    }

    #[tokio::test]
    async fn rejected_broadcast_is_unprocessable() {
        let gateway = Arc::new(MockGateway::new());
        gateway.reject_broadcast(5, "insufficient funds");
        let mut body = transfer_body();
        body["sequence_number"] = json!(MockGateway::SEQUENCE);

        let (status, err) = post_json(
            app(gateway),
            "/coreumservice/transfer-stably-token",
            body,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error_code"], "BROADCAST_REJECTED");
    }

    #[tokio::test]
    async fn mnemonic_transfer_is_not_mounted_in_prod() {
        let body = json!({
            "sender_mnemonic": TEST_MNEMONIC,
            "recipient_address": recipient(),
            "token_denom": "utestcore",
            "token_amount": 1,
            "sequence_number": MockGateway::SEQUENCE,
        });

        let gateway = Arc::new(MockGateway::new());
        let (status, _) = post_json(
            router(test_state(gateway.clone(), Stage::Prod)),
            "/coreumservice/test-only/transfer-stably-token",
            body.clone(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(gateway.broadcasts().is_empty());

        let (status, sent) = post_json(
            app(gateway.clone()),
            "/coreumservice/test-only/transfer-stably-token",
            body,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(sent["tx_hash"].is_string());
        assert_eq!(gateway.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let gateway = Arc::new(MockGateway::new());
        gateway.remove_account(&recipient());

        let (status, err) = post_json(
            app(gateway),
            "/coreumservice/get-account-info",
            json!({ "address": recipient() }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error_code"], "ACCOUNT_NOT_FOUND");
    }

    #[tokio::test]
    async fn transfer_params_are_validated() {
        let gateway = Arc::new(MockGateway::new());
        let (status, body) = post_json(
            app(gateway.clone()),
            "/coreumservice/validate-transfer-params",
            json!({
                "to_token_denom": "utestcore",
                "to_address": recipient(),
                "to_amount": "100",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);

        let (status, err) = post_json(
            app(gateway),
            "/coreumservice/validate-transfer-params",
            json!({
                "to_token_denom": "utestcore",
                "to_address": recipient(),
                "to_amount": "-3",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error_code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn block_range_returns_transfers_in_order() {
        let gateway = Arc::new(MockGateway::new());
        gateway.add_block(
            11,
            vec![raw_tx(vec![msg_send("testcore1from", "testcore1late", "2")], "")],
        );
        gateway.add_block(
            10,
            vec![raw_tx(vec![msg_send("testcore1from", "testcore1early", "1")], "m")],
        );
        gateway.delay_block(10, Duration::from_millis(20));

        let (status, body) = post_json(
            app(gateway),
            "/coreumservice/get-block-transactions-in-range",
            json!({ "start_block_number": 10, "end_block_number": 12 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let txs = body["transactions"].as_array().unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0]["block_number"], 10);
        assert_eq!(txs[0]["to_address"], "testcore1early");
        assert_eq!(txs[1]["block_number"], 11);
    }

    #[tokio::test]
    async fn inverted_range_is_bad_request() {
        let (status, err) = post_json(
            app(Arc::new(MockGateway::new())),
            "/coreumservice/get-block-transactions-in-range",
            json!({ "start_block_number": 5, "end_block_number": 4 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error_code"], "INVALID_RANGE");
    }

    #[tokio::test]
    async fn unfetchable_block_fails_the_range() {
        let gateway = Arc::new(MockGateway::new());
        gateway.add_block(3, vec![raw_tx(vec![], "")]);
        gateway.fail_block(3, u32::MAX);

        let (status, err) = post_json(
            app(gateway),
            "/coreumservice/get-block-transactions-in-range",
            json!({ "start_block_number": 1, "end_block_number": 4 }),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err["error_code"], "RANGE_ABORTED");
    }

    #[tokio::test]
    async fn unknown_transaction_is_not_found() {
        let gateway = Arc::new(MockGateway::new());
        gateway.add_tx(TransactionDetail {
            tx_hash: "ABCD".to_string(),
            height: 77,
            code: 0,
            memo: "payout-17".to_string(),
        });

        let (status, body) = post_json(
            app(gateway.clone()),
            "/coreumservice/get-transaction-by-hash",
            json!({ "transaction_hash": "ABCD" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["height"], 77);

        let (status, _) = post_json(
            app(gateway),
            "/coreumservice/get-transaction-by-hash",
            json!({ "transaction_hash": "EF01" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn latest_block_status_is_passed_through() {
        let (status, body) = post_json(
            app(Arc::new(MockGateway::new())),
            "/coreumservice/get-latest-block-status",
            json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["block_status"]["latest_block_height"], 100);
    }
}
