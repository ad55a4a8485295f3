// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unsigned bank transfer construction.
//!
//! An [`UnsignedTransferTx`] fully determines the signed bytes: two builds
//! with identical fields encode to identical body and auth-info bytes.

use std::sync::Arc;

use prost::Message;

use super::client::ChainGateway;
use super::error::ServiceError;
use super::gas::GasPrice;
use super::keys::{validate_address, Keyring};
use super::proto;
use super::types::{GasQuote, TransferIntent, MSG_SEND_TYPE_URL, SECP256K1_PUBKEY_TYPE_URL};

/// A transfer with all signing inputs resolved, not yet signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransferTx {
    chain_id: String,
    from_address: String,
    from_name: Option<String>,
    to_address: String,
    denom: String,
    amount: u64,
    memo: String,
    account_number: u64,
    sequence: u64,
    gas_price: Option<GasPrice>,
    gas_limit: u64,
}

impl UnsignedTransferTx {
    /// Replace the gas values. Everything else is kept.
    pub fn with_gas(mut self, gas_price: GasPrice, gas_limit: u64) -> Self {
        self.gas_price = Some(gas_price);
        self.gas_limit = gas_limit;
        self
    }

    /// Attach the keyring name the signer should use.
    pub fn with_signer_name(mut self, name: impl Into<String>) -> Self {
        self.from_name = Some(name.into());
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub fn from_name(&self) -> Option<&str> {
        self.from_name.as_deref()
    }

    pub fn to_address(&self) -> &str {
        &self.to_address
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn account_number(&self) -> u64 {
        self.account_number
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn gas_price(&self) -> Option<&GasPrice> {
        self.gas_price.as_ref()
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Encoded `TxBody` holding the single `MsgSend`.
    pub fn body_bytes(&self) -> Vec<u8> {
        let msg = proto::MsgSend {
            from_address: self.from_address.clone(),
            to_address: self.to_address.clone(),
            amount: vec![proto::Coin {
                denom: self.denom.clone(),
                amount: self.amount.to_string(),
            }],
        };
        proto::TxBody {
            messages: vec![proto::Any {
                type_url: MSG_SEND_TYPE_URL.to_string(),
                value: msg.encode_to_vec(),
            }],
            memo: self.memo.clone(),
            timeout_height: 0,
        }
        .encode_to_vec()
    }

    /// Encoded `AuthInfo` for a single direct-mode signer.
    ///
    /// The fee is `ceil(gas_price * gas_limit)`; without a gas price the fee
    /// carries no coins.
    pub fn auth_info_bytes(&self, public_key: &[u8]) -> Result<Vec<u8>, ServiceError> {
        let amount = match &self.gas_price {
            Some(price) => {
                let fee = price
                    .fee_for(self.gas_limit)
                    .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
                vec![proto::Coin {
                    denom: price.denom().to_string(),
                    amount: fee.to_string(),
                }]
            }
            None => Vec::new(),
        };

        let signer = proto::SignerInfo {
            public_key: Some(proto::Any {
                type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
                value: proto::Secp256k1PubKey {
                    key: public_key.to_vec(),
                }
                .encode_to_vec(),
            }),
            mode_info: Some(proto::ModeInfo {
                single: Some(proto::ModeInfoSingle {
                    mode: proto::SignMode::Direct as i32,
                }),
            }),
            sequence: self.sequence,
        };

        Ok(proto::AuthInfo {
            signer_infos: vec![signer],
            fee: Some(proto::Fee {
                amount,
                gas_limit: self.gas_limit,
                payer: String::new(),
                granter: String::new(),
            }),
        }
        .encode_to_vec())
    }
}

/// Assembles unsigned transfers for one chain.
#[derive(Clone)]
pub struct TxBuilder {
    gateway: Arc<dyn ChainGateway>,
    chain_id: String,
    address_prefix: String,
}

impl TxBuilder {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        chain_id: impl Into<String>,
        address_prefix: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            chain_id: chain_id.into(),
            address_prefix: address_prefix.into(),
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn address_prefix(&self) -> &str {
        &self.address_prefix
    }

    /// Build a transfer from the keyring's primary key.
    ///
    /// The account number is read from the chain on every call. Pass `None`
    /// for `gas` to build the simulation variant.
    pub async fn prepare_transfer(
        &self,
        keyring: &Keyring,
        intent: &TransferIntent,
        sequence: u64,
        gas: Option<GasQuote>,
    ) -> Result<UnsignedTransferTx, ServiceError> {
        let from_address = keyring.primary().address().to_string();
        validate_address(&intent.recipient, &self.address_prefix)?;
        validate_denom(&intent.denom)?;
        if intent.amount == 0 {
            return Err(ServiceError::InvalidInput(
                "Transfer amount must be positive".to_string(),
            ));
        }

        let account = self
            .gateway
            .account_info(&from_address)
            .await
            .map_err(ServiceError::chain("account_info"))?
            .ok_or_else(|| ServiceError::AccountLookup {
                address: from_address.clone(),
            })?;

        let (gas_price, gas_limit) = match gas {
            Some(quote) => (Some(quote.gas_price), quote.gas_used),
            None => (None, 0),
        };

        tracing::debug!(
            from = %from_address,
            to = %intent.recipient,
            account_number = account.account_number,
            sequence,
            "Prepared transfer"
        );

        Ok(UnsignedTransferTx {
            chain_id: self.chain_id.clone(),
            from_address,
            from_name: None,
            to_address: intent.recipient.clone(),
            denom: intent.denom.clone(),
            amount: intent.amount,
            memo: intent.memo.clone(),
            account_number: account.account_number,
            sequence,
            gas_price,
            gas_limit,
        })
    }
}

/// Bank denoms: 3 to 128 characters, leading letter, then letters, digits
/// and `/:._-`.
pub fn validate_denom(denom: &str) -> Result<(), ServiceError> {
    let valid = (3..=128).contains(&denom.len())
        && denom.starts_with(|c: char| c.is_ascii_alphabetic())
        && denom
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(format!("Invalid denom: {denom:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::keys::tests::TEST_MNEMONIC;
    use crate::blockchain::keys::derive_address;
    use crate::blockchain::mock::MockGateway;

    fn intent(recipient: &str) -> TransferIntent {
        TransferIntent {
            recipient: recipient.to_string(),
            denom: "utestcore".to_string(),
            amount: 1,
            memo: "testing".to_string(),
        }
    }

    fn setup() -> (Arc<MockGateway>, TxBuilder, Keyring, String) {
        let gateway = Arc::new(MockGateway::new());
        let builder = TxBuilder::new(gateway.clone(), "coreum-testnet-1", "testcore");
        let keyring = Keyring::from_mnemonic(TEST_MNEMONIC, "testcore").unwrap();
        let recipient = derive_address(TEST_MNEMONIC, 1, "testcore").unwrap().address;
        (gateway, builder, keyring, recipient)
    }

    #[tokio::test]
    async fn identical_inputs_encode_identically() {
        let (_gateway, builder, keyring, recipient) = setup();
        let quote = GasQuote {
            gas_price: "0.0625utestcore".parse().unwrap(),
            gas_used: 90_000,
        };

        let a = builder
            .prepare_transfer(&keyring, &intent(&recipient), 5, Some(quote.clone()))
            .await
            .unwrap();
        let b = builder
            .prepare_transfer(&keyring, &intent(&recipient), 5, Some(quote))
            .await
            .unwrap();

        assert_eq!(a, b);
        let pk = keyring.primary().public_key();
        assert_eq!(a.body_bytes(), b.body_bytes());
        assert_eq!(a.auth_info_bytes(&pk).unwrap(), b.auth_info_bytes(&pk).unwrap());
        assert_eq!(a.account_number(), MockGateway::ACCOUNT_NUMBER);
        assert_eq!(a.sequence(), 5);
    }

    #[tokio::test]
    async fn account_number_is_read_every_time() {
        let (gateway, builder, keyring, recipient) = setup();
        for _ in 0..3 {
            builder
                .prepare_transfer(&keyring, &intent(&recipient), 0, None)
                .await
                .unwrap();
        }
        assert_eq!(gateway.account_calls(), 3);
    }

    #[tokio::test]
    async fn unknown_sender_is_an_account_lookup_error() {
        let (gateway, builder, keyring, recipient) = setup();
        gateway.remove_account(keyring.primary().address());

        let err = builder
            .prepare_transfer(&keyring, &intent(&recipient), 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AccountLookup { .. }));
    }

    #[tokio::test]
    async fn gateway_failure_is_not_an_account_lookup_error() {
        let (gateway, builder, keyring, recipient) = setup();
        gateway.fail_account_lookup("connection refused");

        let err = builder
            .prepare_transfer(&keyring, &intent(&recipient), 0, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Chain {
                operation: "account_info",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rejects_bad_transfer_inputs() {
        let (_gateway, builder, keyring, recipient) = setup();

        let mut zero = intent(&recipient);
        zero.amount = 0;
        assert!(matches!(
            builder.prepare_transfer(&keyring, &zero, 0, None).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mainnet = derive_address(TEST_MNEMONIC, 1, "core").unwrap().address;
        assert!(matches!(
            builder.prepare_transfer(&keyring, &intent(&mainnet), 0, None).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mut bad_denom = intent(&recipient);
        bad_denom.denom = "1x".to_string();
        assert!(matches!(
            builder.prepare_transfer(&keyring, &bad_denom, 0, None).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn fee_is_rounded_up_in_auth_info() {
        let (_gateway, builder, keyring, recipient) = setup();
        let tx = builder
            .prepare_transfer(&keyring, &intent(&recipient), 0, None)
            .await
            .unwrap()
            .with_gas("0.0625utestcore".parse().unwrap(), 100_001);

        let pk = keyring.primary().public_key();
        let auth = proto::AuthInfo::decode(tx.auth_info_bytes(&pk).unwrap().as_slice()).unwrap();
        let fee = auth.fee.unwrap();
        assert_eq!(fee.gas_limit, 100_001);
        assert_eq!(fee.amount[0].amount, "6251");
        assert_eq!(fee.amount[0].denom, "utestcore");
        assert_eq!(auth.signer_infos[0].sequence, 0);
    }

    #[tokio::test]
    async fn body_carries_a_single_msg_send() {
        let (_gateway, builder, keyring, recipient) = setup();
        let tx = builder
            .prepare_transfer(&keyring, &intent(&recipient), 0, None)
            .await
            .unwrap();

        let body = proto::TxBody::decode(tx.body_bytes().as_slice()).unwrap();
        assert_eq!(body.memo, "testing");
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].type_url, MSG_SEND_TYPE_URL);
        let msg = proto::MsgSend::decode(body.messages[0].value.as_slice()).unwrap();
        assert_eq!(msg.from_address, keyring.primary().address());
        assert_eq!(msg.to_address, recipient);
        assert_eq!(msg.amount[0].amount, "1");
    }
}
