// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coreum chain gateway.
//!
//! [`ChainGateway`] is the seam between the transfer/scanning workflows and
//! the node. [`CoreumClient`] implements it over the Cosmos REST gateway and
//! the Tendermint RPC endpoint. Transaction bytes travel base64 encoded.

use std::time::Duration;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use super::gas::GasPrice;
use super::types::{AccountInfo, BlockStatus, BroadcastResult, TransactionDetail};

/// Timeout applied to every node request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors returned by chain gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Node returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid node response: {0}")]
    Decode(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Operations the service needs from a Coreum node.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Account number and sequence, or `None` if the chain has never seen
    /// the address.
    async fn account_info(&self, address: &str) -> Result<Option<AccountInfo>, ChainError>;

    /// Current minimum gas price.
    async fn gas_price(&self) -> Result<GasPrice, ChainError>;

    /// Simulate encoded transaction bytes and return gas used.
    async fn simulate_gas(&self, tx_bytes: &[u8]) -> Result<u64, ChainError>;

    /// Broadcast signed transaction bytes in sync mode.
    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResult, ChainError>;

    /// Raw transaction bytes included in the block at `height`.
    async fn block_txs(&self, height: u64) -> Result<Vec<Vec<u8>>, ChainError>;

    /// Number of transaction results recorded for the block at `height`.
    async fn block_results(&self, height: u64) -> Result<usize, ChainError>;

    /// Look a transaction up by hash. `None` if the node does not know it.
    async fn tx_by_hash(&self, hash: &str) -> Result<Option<TransactionDetail>, ChainError>;

    async fn node_status(&self) -> Result<BlockStatus, ChainError>;

    /// Bank balance of `address` in `denom`, as an integer string.
    async fn balance(&self, address: &str, denom: &str) -> Result<String, ChainError>;
}

/// HTTP client for a Coreum node.
#[derive(Clone)]
pub struct CoreumClient {
    rest_url: String,
    rpc_url: String,
    http: Client,
}

impl CoreumClient {
    pub fn new(rest_url: &str, rpc_url: &str) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            rest_url: rest_url.trim_end_matches('/').to_string(),
            rpc_url: rpc_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ChainError> {
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::Http(format!("GET {url} failed: {e}")))?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: String,
        payload: &Value,
    ) -> Result<T, ChainError> {
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ChainError::Http(format!("POST {url} failed: {e}")))?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ChainError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<NodeErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        if status == StatusCode::NOT_FOUND {
            return Err(ChainError::NotFound(message));
        }
        return Err(ChainError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ChainError::Decode(e.to_string()))
}

#[derive(Deserialize)]
struct NodeErrorBody {
    #[serde(default)]
    message: String,
}

#[async_trait]
impl ChainGateway for CoreumClient {
    async fn account_info(&self, address: &str) -> Result<Option<AccountInfo>, ChainError> {
        let url = format!("{}/cosmos/auth/v1beta1/accounts/{}", self.rest_url, address);
        match self.get_json::<AccountResponse>(url).await {
            Ok(response) => parse_account(&response.account).map(Some),
            Err(ChainError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn gas_price(&self) -> Result<GasPrice, ChainError> {
        let url = format!("{}/coreum/feemodel/v1/min_gas_price", self.rest_url);
        let response: MinGasPriceResponse = self.get_json(url).await?;
        format!(
            "{}{}",
            response.min_gas_price.amount, response.min_gas_price.denom
        )
        .parse()
        .map_err(|e| ChainError::Decode(format!("min gas price: {e}")))
    }

    async fn simulate_gas(&self, tx_bytes: &[u8]) -> Result<u64, ChainError> {
        let url = format!("{}/cosmos/tx/v1beta1/simulate", self.rest_url);
        let payload = json!({ "tx_bytes": Base64::encode_string(tx_bytes) });
        let response: SimulateResponse = self.post_json(url, &payload).await?;
        Ok(response.gas_info.gas_used)
    }

    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResult, ChainError> {
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.rest_url);
        let payload = json!({
            "tx_bytes": Base64::encode_string(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC",
        });
        let response: BroadcastResponse = self.post_json(url, &payload).await?;
        Ok(BroadcastResult {
            tx_hash: response.tx_response.txhash,
            code: response.tx_response.code,
            codespace: response.tx_response.codespace,
            raw_log: response.tx_response.raw_log,
        })
    }

    async fn block_txs(&self, height: u64) -> Result<Vec<Vec<u8>>, ChainError> {
        let url = format!("{}/cosmos/tx/v1beta1/txs/block/{}", self.rest_url, height);
        let response: BlockWithTxsResponse = self.get_json(url).await?;
        response
            .block
            .data
            .txs
            .iter()
            .map(|encoded| {
                Base64::decode_vec(encoded)
                    .map_err(|e| ChainError::Decode(format!("block {height} tx bytes: {e}")))
            })
            .collect()
    }

    async fn block_results(&self, height: u64) -> Result<usize, ChainError> {
        let url = format!("{}/block_results?height={}", self.rpc_url, height);
        let response: RpcEnvelope<BlockResultsResult> = self.get_json(url).await?;
        let result = response.into_result()?;
        Ok(result.txs_results.map(|r| r.len()).unwrap_or(0))
    }

    async fn tx_by_hash(&self, hash: &str) -> Result<Option<TransactionDetail>, ChainError> {
        let url = format!("{}/cosmos/tx/v1beta1/txs/{}", self.rest_url, hash);
        match self.get_json::<GetTxResponse>(url).await {
            Ok(response) => Ok(Some(TransactionDetail {
                tx_hash: response.tx_response.txhash,
                height: response.tx_response.height,
                code: response.tx_response.code,
                memo: response.tx.map(|tx| tx.body.memo).unwrap_or_default(),
            })),
            Err(ChainError::NotFound(_)) => Ok(None),
            Err(ChainError::Status { message, .. }) if message.contains("tx not found") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn node_status(&self) -> Result<BlockStatus, ChainError> {
        let url = format!("{}/status", self.rpc_url);
        let response: RpcEnvelope<StatusResult> = self.get_json(url).await?;
        let sync = response.into_result()?.sync_info;
        Ok(BlockStatus {
            latest_block_hash: sync.latest_block_hash,
            latest_app_hash: sync.latest_app_hash,
            latest_block_height: sync.latest_block_height,
            latest_block_time: unix_seconds(&sync.latest_block_time)?,
            earliest_block_hash: sync.earliest_block_hash,
            earliest_app_hash: sync.earliest_app_hash,
            earliest_block_height: sync.earliest_block_height,
            earliest_block_time: unix_seconds(&sync.earliest_block_time)?,
            catching_up: sync.catching_up,
        })
    }

    async fn balance(&self, address: &str, denom: &str) -> Result<String, ChainError> {
        let url = format!(
            "{}/cosmos/bank/v1beta1/balances/{}/by_denom?denom={}",
            self.rest_url, address, denom
        );
        let response: BalanceResponse = self.get_json(url).await?;
        Ok(response
            .balance
            .map(|b| b.amount)
            .unwrap_or_else(|| "0".to_string()))
    }
}

// =============================================================================
// Response shapes
// =============================================================================

#[derive(Deserialize)]
struct AccountResponse {
    account: Value,
}

/// Extract account number and sequence from any account type. Vesting and
/// module accounts nest the base account one or two levels down.
fn parse_account(account: &Value) -> Result<AccountInfo, ChainError> {
    let base = [
        Some(account),
        account.get("base_account"),
        account
            .get("base_vesting_account")
            .and_then(|v| v.get("base_account")),
    ]
    .into_iter()
    .flatten()
    .find(|v| v.get("account_number").is_some())
    .ok_or_else(|| ChainError::Decode("account has no account_number".to_string()))?;

    Ok(AccountInfo {
        account_number: json_u64(base, "account_number")?,
        sequence: json_u64(base, "sequence")?,
    })
}

fn json_u64(value: &Value, field: &str) -> Result<u64, ChainError> {
    match value.get(field) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| ChainError::Decode(format!("{field} is not a number: {s}"))),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| ChainError::Decode(format!("{field} is not a u64: {n}"))),
        None | Some(Value::Null) => Ok(0),
        Some(other) => Err(ChainError::Decode(format!("{field} has unexpected type: {other}"))),
    }
}

fn unix_seconds(rfc3339: &str) -> Result<i64, ChainError> {
    chrono::DateTime::parse_from_rfc3339(rfc3339)
        .map(|t| t.timestamp())
        .map_err(|e| ChainError::Decode(format!("invalid block time {rfc3339}: {e}")))
}

/// Cosmos JSON encodes 64-bit integers as strings.
fn u64_from_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        Raw::Number(n) => Ok(n),
    }
}

fn i64_from_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
struct MinGasPriceResponse {
    min_gas_price: DecCoin,
}

#[derive(Deserialize)]
struct DecCoin {
    denom: String,
    amount: String,
}

#[derive(Deserialize)]
struct SimulateResponse {
    gas_info: GasInfo,
}

#[derive(Deserialize)]
struct GasInfo {
    #[serde(deserialize_with = "u64_from_string")]
    gas_used: u64,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: TxResponse,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default, deserialize_with = "u64_from_string")]
    height: u64,
    txhash: String,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    codespace: String,
    #[serde(default)]
    raw_log: String,
}

#[derive(Deserialize)]
struct GetTxResponse {
    #[serde(default)]
    tx: Option<TxJson>,
    tx_response: TxResponse,
}

#[derive(Deserialize)]
struct TxJson {
    body: TxBodyJson,
}

#[derive(Deserialize)]
struct TxBodyJson {
    #[serde(default)]
    memo: String,
}

#[derive(Deserialize)]
struct BlockWithTxsResponse {
    block: BlockJson,
}

#[derive(Deserialize)]
struct BlockJson {
    data: BlockData,
}

#[derive(Deserialize)]
struct BlockData {
    #[serde(default)]
    txs: Vec<String>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Option<DecCoin>,
}

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<Value>,
}

impl<T> RpcEnvelope<T> {
    fn into_result(self) -> Result<T, ChainError> {
        if let Some(error) = self.error {
            return Err(ChainError::Rpc(error.to_string()));
        }
        self.result
            .ok_or_else(|| ChainError::Rpc("response has no result".to_string()))
    }
}

#[derive(Deserialize)]
struct BlockResultsResult {
    txs_results: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct StatusResult {
    sync_info: SyncInfo,
}

#[derive(Deserialize)]
struct SyncInfo {
    latest_block_hash: String,
    latest_app_hash: String,
    #[serde(deserialize_with = "i64_from_string")]
    latest_block_height: i64,
    latest_block_time: String,
    #[serde(default)]
    earliest_block_hash: String,
    #[serde(default)]
    earliest_app_hash: String,
    #[serde(deserialize_with = "i64_from_string")]
    earliest_block_height: i64,
    earliest_block_time: String,
    catching_up: bool,
}
