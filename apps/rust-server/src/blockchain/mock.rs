// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scriptable in-memory [`ChainGateway`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::client::{ChainError, ChainGateway};
use super::gas::GasPrice;
use super::signing::compute_hash;
use super::types::{AccountInfo, BlockStatus, BroadcastResult, TransactionDetail};

#[derive(Default)]
struct MockState {
    missing_accounts: HashSet<String>,
    sequence: u64,
    account_failure: Option<String>,
    simulation_failure: Option<String>,
    simulated_gas: u64,
    broadcast_rejection: Option<(u32, String)>,
    broadcast_failure: Option<String>,
    blocks: HashMap<u64, Vec<Vec<u8>>>,
    block_results: HashMap<u64, usize>,
    /// Remaining failing attempts per height; `u32::MAX` never recovers
    block_failures: HashMap<u64, u32>,
    block_delays: HashMap<u64, Duration>,
    txs: HashMap<String, TransactionDetail>,
    broadcasts: Vec<Vec<u8>>,
    simulations: Vec<Vec<u8>>,
    account_calls: usize,
    simulate_calls: usize,
    block_calls: HashMap<u64, usize>,
}

pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    pub const ACCOUNT_NUMBER: u64 = 42;
    pub const SEQUENCE: u64 = 3;
    pub const SIMULATED_GAS: u64 = 80_000;
    pub const GAS_PRICE: &'static str = "0.0625utestcore";
    pub const BALANCE: &'static str = "1000000";

    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                sequence: Self::SEQUENCE,
                simulated_gas: Self::SIMULATED_GAS,
                ..MockState::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn remove_account(&self, address: &str) {
        self.state().missing_accounts.insert(address.to_string());
    }

    pub fn set_sequence(&self, sequence: u64) {
        self.state().sequence = sequence;
    }

    pub fn fail_account_lookup(&self, message: &str) {
        self.state().account_failure = Some(message.to_string());
    }

    pub fn fail_simulation(&self, message: &str) {
        self.state().simulation_failure = Some(message.to_string());
    }

    pub fn set_simulated_gas(&self, gas: u64) {
        self.state().simulated_gas = gas;
    }

    pub fn reject_broadcast(&self, code: u32, raw_log: &str) {
        self.state().broadcast_rejection = Some((code, raw_log.to_string()));
    }

    pub fn fail_broadcast(&self, message: &str) {
        self.state().broadcast_failure = Some(message.to_string());
    }

    pub fn add_block(&self, height: u64, txs: Vec<Vec<u8>>) {
        let mut state = self.state();
        state.block_results.insert(height, txs.len());
        state.blocks.insert(height, txs);
    }

    /// A block whose transaction query fails but whose results are known.
    pub fn set_block_results(&self, height: u64, count: usize) {
        self.state().block_results.insert(height, count);
    }

    /// Fail the first `attempts` queries for `height`.
    pub fn fail_block(&self, height: u64, attempts: u32) {
        self.state().block_failures.insert(height, attempts);
    }

    pub fn delay_block(&self, height: u64, delay: Duration) {
        self.state().block_delays.insert(height, delay);
    }

    pub fn add_tx(&self, detail: TransactionDetail) {
        self.state().txs.insert(detail.tx_hash.clone(), detail);
    }

    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.state().broadcasts.clone()
    }

    /// Payloads passed to `simulate_gas`, oldest first.
    pub fn simulations(&self) -> Vec<Vec<u8>> {
        self.state().simulations.clone()
    }

    pub fn account_calls(&self) -> usize {
        self.state().account_calls
    }

    pub fn simulate_calls(&self) -> usize {
        self.state().simulate_calls
    }

    pub fn block_calls(&self, height: u64) -> usize {
        self.state().block_calls.get(&height).copied().unwrap_or(0)
    }

    pub fn total_block_calls(&self) -> usize {
        self.state().block_calls.values().sum()
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn account_info(&self, address: &str) -> Result<Option<AccountInfo>, ChainError> {
        let mut state = self.state();
        state.account_calls += 1;
        if let Some(message) = &state.account_failure {
            return Err(ChainError::Http(message.clone()));
        }
        if state.missing_accounts.contains(address) {
            return Ok(None);
        }
        Ok(Some(AccountInfo {
            account_number: Self::ACCOUNT_NUMBER,
            sequence: state.sequence,
        }))
    }

    async fn gas_price(&self) -> Result<GasPrice, ChainError> {
        Self::GAS_PRICE
            .parse()
            .map_err(|e: super::gas::GasPriceError| ChainError::Decode(e.to_string()))
    }

    async fn simulate_gas(&self, tx_bytes: &[u8]) -> Result<u64, ChainError> {
        let mut state = self.state();
        state.simulate_calls += 1;
        state.simulations.push(tx_bytes.to_vec());
        match &state.simulation_failure {
            Some(message) => Err(ChainError::Status {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(state.simulated_gas),
        }
    }

    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResult, ChainError> {
        let mut state = self.state();
        if let Some(message) = &state.broadcast_failure {
            return Err(ChainError::Http(message.clone()));
        }
        state.broadcasts.push(tx_bytes.to_vec());
        let (code, raw_log) = state
            .broadcast_rejection
            .clone()
            .unwrap_or((0, String::new()));
        Ok(BroadcastResult {
            tx_hash: compute_hash(tx_bytes),
            code,
            codespace: if code == 0 { String::new() } else { "sdk".to_string() },
            raw_log,
        })
    }

    async fn block_txs(&self, height: u64) -> Result<Vec<Vec<u8>>, ChainError> {
        let delay = {
            let mut state = self.state();
            *state.block_calls.entry(height).or_default() += 1;
            state.block_delays.get(&height).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if let Some(remaining) = state.block_failures.get_mut(&height) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(ChainError::Http(format!("block {height} unavailable")));
            }
        }
        state
            .blocks
            .get(&height)
            .filter(|txs| !txs.is_empty())
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("block {height} has no txs")))
    }

    async fn block_results(&self, height: u64) -> Result<usize, ChainError> {
        let state = self.state();
        if state.block_failures.get(&height).is_some_and(|r| *r > 0) {
            return Err(ChainError::Rpc(format!("block {height} results unavailable")));
        }
        Ok(state.block_results.get(&height).copied().unwrap_or(0))
    }

    async fn tx_by_hash(&self, hash: &str) -> Result<Option<TransactionDetail>, ChainError> {
        Ok(self.state().txs.get(hash).cloned())
    }

    async fn node_status(&self) -> Result<BlockStatus, ChainError> {
        Ok(BlockStatus {
            latest_block_hash: "LATEST".to_string(),
            latest_app_hash: "APP".to_string(),
            latest_block_height: 100,
            latest_block_time: 1_700_000_000,
            earliest_block_hash: "EARLIEST".to_string(),
            earliest_app_hash: "APP0".to_string(),
            earliest_block_height: 1,
            earliest_block_time: 1_600_000_000,
            catching_up: false,
        })
    }

    async fn balance(&self, _address: &str, _denom: &str) -> Result<String, ChainError> {
        Ok(Self::BALANCE.to_string())
    }
}
