// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Block transfer scanner.
//!
//! A range scan spawns one task per height. Fetch attempts are bounded by a
//! semaphore; retry delays are not. Each task retries its block a fixed
//! number of times with a fixed delay. The first
//! block that exhausts its attempts aborts the scan; tasks still in flight
//! are detached rather than cancelled. Results are reassembled in height
//! order after the join.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::client::ChainGateway;
use super::decoder::decode_transfer;
use super::error::ServiceError;
use super::types::Transaction;

/// Attempts per block before a range scan gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Pause between attempts for the same block.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Blocks fetched at the same time.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Widest range accepted in one call.
pub const DEFAULT_MAX_RANGE_BLOCKS: u64 = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct ScannerConfig {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub max_concurrency: usize,
    pub max_range_blocks: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_range_blocks: DEFAULT_MAX_RANGE_BLOCKS,
        }
    }
}

#[derive(Clone)]
pub struct BlockScanner {
    gateway: Arc<dyn ChainGateway>,
    config: ScannerConfig,
}

impl BlockScanner {
    pub fn new(gateway: Arc<dyn ChainGateway>, config: ScannerConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> ScannerConfig {
        self.config
    }

    /// Transfers in the block at `height`, without retries.
    ///
    /// The node fails the block query for blocks without transactions, so a
    /// failure is checked against the block results: zero results means an
    /// empty block, anything else is a real error.
    pub async fn block_transactions(&self, height: u64) -> Result<Vec<Transaction>, ServiceError> {
        let raw_txs = match self.gateway.block_txs(height).await {
            Ok(raw_txs) => raw_txs,
            Err(err) => {
                let results = self
                    .gateway
                    .block_results(height)
                    .await
                    .map_err(ServiceError::chain("block_results"))?;
                if results == 0 {
                    tracing::debug!(height, "Block has no transactions");
                    return Ok(Vec::new());
                }
                return Err(ServiceError::Chain {
                    operation: "block_txs",
                    source: err,
                });
            }
        };

        let mut transfers = Vec::new();
        for raw in &raw_txs {
            if let Some(tx) = decode_transfer(raw, height)? {
                transfers.push(tx);
            }
        }

        tracing::debug!(
            height,
            txs = raw_txs.len(),
            transfers = transfers.len(),
            "Scanned block"
        );
        Ok(transfers)
    }

    /// Transfers in `[start, end]`, ordered by height. All or nothing.
    pub async fn block_transactions_in_range(
        &self,
        start: u64,
        end: u64,
    ) -> Result<Vec<Transaction>, ServiceError> {
        if start > end {
            return Err(ServiceError::InvalidRange { start, end });
        }
        if end - start >= self.config.max_range_blocks {
            return Err(ServiceError::InvalidInput(format!(
                "Range {start}..={end} exceeds {} blocks",
                self.config.max_range_blocks
            )));
        }

        let permits = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for height in start..=end {
            let scanner = self.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let result = scanner.fetch_with_retry(height, &permits).await;
                (height, result)
            });
        }

        let mut by_height = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (height, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tasks.detach_all();
                    return Err(ServiceError::Internal(format!("block task failed: {e}")));
                }
            };
            match result {
                Ok(txs) => {
                    by_height.insert(height, txs);
                }
                Err(err) => {
                    tasks.detach_all();
                    tracing::error!(start, end, height, error = %err, "Range scan aborted");
                    return Err(ServiceError::RangeAborted {
                        height,
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(by_height.into_values().flatten().collect())
    }

    /// A permit is held per attempt only, so a block waiting out its retry
    /// delay does not hold back other heights.
    async fn fetch_with_retry(
        &self,
        height: u64,
        permits: &Semaphore,
    ) -> Result<Vec<Transaction>, ServiceError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let fetched = {
                let _permit = permits.acquire().await.map_err(|_| {
                    ServiceError::Internal("scanner semaphore closed".to_string())
                })?;
                self.block_transactions(height).await
            };
            match fetched {
                Ok(txs) => return Ok(txs),
                Err(err) if attempt >= max_attempts => {
                    return Err(ServiceError::BlockFetch {
                        height,
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    tracing::warn!(height, attempt, error = %err, "Block fetch failed, retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }
}
