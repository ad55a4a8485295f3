// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer workflow: propose params, build, estimate, sign, broadcast.
//!
//! Nothing here retries. A failed broadcast usually means the sequence moved
//! on, and the caller has to propose fresh params before trying again.

use std::sync::Arc;

use super::builder::{validate_denom, TxBuilder};
use super::client::ChainGateway;
use super::error::ServiceError;
use super::gas::{GasEstimator, GasSettings};
use super::keys::{derive_address, validate_address, Keyring};
use super::signing::{sign_and_serialize, SignedTx};
use super::types::{
    AccountInfo, AddressInfo, BlockStatus, GasQuote, TransactionDetail, TransferIntent,
    TransferReceipt, TransferStage, TransferTokenParams,
};
use crate::secrets::SecretCache;

/// Where the sender mnemonic comes from.
#[derive(Clone)]
pub enum MnemonicSource {
    /// Identifier resolved through the secret cache
    Secret(String),
    /// Mnemonic supplied directly by the caller
    Mnemonic(String),
}

impl std::fmt::Debug for MnemonicSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MnemonicSource::Secret(id) => f.debug_tuple("Secret").field(id).finish(),
            MnemonicSource::Mnemonic(_) => f.write_str("Mnemonic(<redacted>)"),
        }
    }
}

pub struct TransferService {
    gateway: Arc<dyn ChainGateway>,
    secrets: Arc<SecretCache>,
    builder: TxBuilder,
    estimator: GasEstimator,
}

impl TransferService {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        secrets: Arc<SecretCache>,
        chain_id: &str,
        address_prefix: &str,
        gas_settings: GasSettings,
    ) -> Self {
        Self {
            builder: TxBuilder::new(gateway.clone(), chain_id, address_prefix),
            estimator: GasEstimator::new(gateway.clone(), gas_settings),
            gateway,
            secrets,
        }
    }

    pub fn address_prefix(&self) -> &str {
        self.builder.address_prefix()
    }

    pub fn chain_id(&self) -> &str {
        self.builder.chain_id()
    }

    async fn keyring(&self, source: &MnemonicSource) -> Result<Keyring, ServiceError> {
        match source {
            MnemonicSource::Secret(id) => {
                let mnemonic = self.secrets.mnemonic(id).await?;
                Keyring::from_mnemonic(&mnemonic, self.address_prefix())
                    .map_err(stored_mnemonic_error(id))
            }
            MnemonicSource::Mnemonic(mnemonic) => {
                Keyring::from_mnemonic(mnemonic, self.address_prefix())
            }
        }
    }

    pub fn derive_address(&self, mnemonic: &str, index: u32) -> Result<AddressInfo, ServiceError> {
        derive_address(mnemonic, index, self.address_prefix())
    }

    /// Index 0 address of the treasury mnemonic behind `secret_id`.
    pub async fn treasury_address(&self, secret_id: &str) -> Result<AddressInfo, ServiceError> {
        let mnemonic = self.secrets.mnemonic(secret_id).await?;
        derive_address(&mnemonic, 0, self.address_prefix())
            .map_err(stored_mnemonic_error(secret_id))
    }

    pub async fn account_info(&self, address: &str) -> Result<AccountInfo, ServiceError> {
        validate_address(address, self.address_prefix())?;
        self.gateway
            .account_info(address)
            .await
            .map_err(ServiceError::chain("account_info"))?
            .ok_or_else(|| ServiceError::AccountLookup {
                address: address.to_string(),
            })
    }

    /// Propose gas and sequence for a transfer without broadcasting.
    pub async fn propose_params(
        &self,
        source: &MnemonicSource,
        intent: &TransferIntent,
    ) -> Result<TransferTokenParams, ServiceError> {
        let keyring = self.keyring(source).await?;
        self.propose_with(&keyring, intent).await
    }

    async fn propose_with(
        &self,
        keyring: &Keyring,
        intent: &TransferIntent,
    ) -> Result<TransferTokenParams, ServiceError> {
        let sender = keyring.primary().address();
        let account = self.account_info(sender).await?;

        let tx = self
            .builder
            .prepare_transfer(keyring, intent, account.sequence, None)
            .await?;
        let quote = self.estimator.estimate(keyring, &tx).await?;

        tracing::info!(
            stage = %TransferStage::Proposed,
            sender,
            sequence = account.sequence,
            gas_used = quote.gas_used,
            gas_price = %quote.gas_price,
            "Proposed transfer params"
        );

        Ok(TransferTokenParams {
            gas_price: quote.gas_price,
            gas_used: quote.gas_used,
            sequence_number: account.sequence,
        })
    }

    /// Gas for a transfer at a caller-chosen sequence.
    pub async fn estimate_transfer_gas(
        &self,
        source: &MnemonicSource,
        intent: &TransferIntent,
        sequence: u64,
    ) -> Result<GasQuote, ServiceError> {
        let keyring = self.keyring(source).await?;
        let tx = self
            .builder
            .prepare_transfer(&keyring, intent, sequence, None)
            .await?;
        self.estimator.estimate(&keyring, &tx).await
    }

    async fn sign(
        &self,
        keyring: &Keyring,
        intent: &TransferIntent,
        params: &TransferTokenParams,
    ) -> Result<SignedTx, ServiceError> {
        let quote = GasQuote {
            gas_price: params.gas_price.clone(),
            gas_used: params.gas_used,
        };
        let tx = self
            .builder
            .prepare_transfer(keyring, intent, params.sequence_number, Some(quote))
            .await?;
        tracing::debug!(stage = %TransferStage::Built, sequence = tx.sequence(), "Built transfer");

        let signed = sign_and_serialize(keyring, &tx)?;
        tracing::debug!(stage = %TransferStage::Signed, tx_hash = signed.hash(), "Signed transfer");
        Ok(signed)
    }

    /// Hash the transfer would have if broadcast with `params`.
    pub async fn calculate_transfer_hash(
        &self,
        source: &MnemonicSource,
        intent: &TransferIntent,
        params: &TransferTokenParams,
    ) -> Result<String, ServiceError> {
        let keyring = self.keyring(source).await?;
        let signed = self.sign(&keyring, intent, params).await?;
        Ok(signed.into_parts().1)
    }

    /// Sign and broadcast a transfer.
    ///
    /// With `gas` unset the params are proposed first and the proposal is
    /// signed as-is, including its fresh on-chain sequence. A caller
    /// `sequence` that disagrees is ignored.
    pub async fn execute_transfer(
        &self,
        source: &MnemonicSource,
        intent: &TransferIntent,
        sequence: u64,
        gas: Option<GasQuote>,
    ) -> Result<TransferReceipt, ServiceError> {
        let keyring = self.keyring(source).await?;

        let params = match gas {
            Some(quote) => TransferTokenParams {
                gas_price: quote.gas_price,
                gas_used: quote.gas_used,
                sequence_number: sequence,
            },
            None => {
                let proposed = self.propose_with(&keyring, intent).await?;
                tracing::debug!(stage = %TransferStage::Simulated, "Gas suggested for transfer");
                if proposed.sequence_number != sequence {
                    tracing::warn!(
                        requested = sequence,
                        on_chain = proposed.sequence_number,
                        "Ignoring caller sequence, signing with the proposed one"
                    );
                }
                proposed
            }
        };

        let signed = self.sign(&keyring, intent, &params).await?;

        let result = self
            .gateway
            .broadcast_tx(signed.bytes())
            .await
            .map_err(|e| {
                tracing::warn!(stage = %TransferStage::Rejected, error = %e, "Broadcast failed");
                ServiceError::Broadcast(e)
            })?;
        tracing::debug!(stage = %TransferStage::Broadcast, tx_hash = %result.tx_hash, "Broadcast acknowledged");

        if result.code != 0 {
            tracing::warn!(
                stage = %TransferStage::Rejected,
                code = result.code,
                codespace = %result.codespace,
                raw_log = %result.raw_log,
                sequence = params.sequence_number,
                "Transfer rejected"
            );
            return Err(ServiceError::BroadcastRejected {
                code: result.code,
                codespace: result.codespace,
                raw_log: result.raw_log,
            });
        }

        if !result.tx_hash.eq_ignore_ascii_case(signed.hash()) {
            tracing::warn!(
                chain_hash = %result.tx_hash,
                local_hash = signed.hash(),
                "Chain reported a different transaction hash"
            );
        }

        tracing::info!(
            stage = %TransferStage::Confirmed,
            tx_hash = %result.tx_hash,
            sequence = params.sequence_number,
            "Transfer broadcast"
        );

        Ok(TransferReceipt {
            tx_hash: result.tx_hash,
            params,
        })
    }

    /// Committed transaction by hash. `None` if unknown or failed on chain.
    pub async fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionDetail>, ServiceError> {
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ServiceError::InvalidInput(format!(
                "Invalid transaction hash: {hash:?}"
            )));
        }
        let detail = self
            .gateway
            .tx_by_hash(hash)
            .await
            .map_err(ServiceError::chain("tx_by_hash"))?;
        Ok(detail.filter(|d| d.code == 0))
    }

    pub async fn latest_block_status(&self) -> Result<BlockStatus, ServiceError> {
        self.gateway
            .node_status()
            .await
            .map_err(ServiceError::chain("node_status"))
    }

    pub async fn balance(&self, address: &str, denom: &str) -> Result<String, ServiceError> {
        validate_address(address, self.address_prefix())?;
        validate_denom(denom)?;
        self.gateway
            .balance(address, denom)
            .await
            .map_err(ServiceError::chain("balance"))
    }

    /// Check transfer inputs before anything is built. `amount` must be a
    /// positive integer in base units.
    pub fn validate_transfer_params(
        &self,
        denom: &str,
        address: &str,
        amount: &str,
    ) -> Result<(), ServiceError> {
        validate_denom(denom)?;
        validate_address(address, self.address_prefix())?;
        match amount.parse::<u64>() {
            Ok(value) if value > 0 => Ok(()),
            _ => Err(ServiceError::InvalidInput(format!(
                "Amount must be a positive integer, got {amount:?}"
            ))),
        }
    }
}

/// A stored mnemonic that does not derive is a deployment fault, not a bad request.
fn stored_mnemonic_error(secret_id: &str) -> impl FnOnce(ServiceError) -> ServiceError + '_ {
    move |err| match err {
        ServiceError::KeyDerivation(reason) => ServiceError::Internal(format!(
            "Secret {secret_id} holds an unusable mnemonic: {reason}"
        )),
        other => other,
    }
}
