// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas pricing and estimation.
//!
//! Estimation is a two-phase build: the transfer is first built with no gas
//! values and simulated at the adjusted chain price, then rebuilt with the
//! simulated gas limit for signing. Price adjustment works on a local copy of
//! the unsigned transaction, so concurrent estimations never observe each
//! other's temporary price.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::builder::UnsignedTransferTx;
use super::client::{ChainError, ChainGateway};
use super::error::ServiceError;
use super::keys::Keyring;
use super::signing::simulation_bytes;
use super::types::GasQuote;

/// Fractional digits the chain prints decimal coins with.
const DEC_COIN_PRECISION: u32 = 18;

/// Default multiplier applied to the chain's minimum gas price.
pub const DEFAULT_GAS_PRICE_ADJUSTMENT: &str = "1.1";

/// Default multiplier applied to simulated gas usage.
pub const DEFAULT_GAS_ADJUSTMENT: &str = "1.0";

/// A decimal gas price in a given denom, e.g. `0.0625ucore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    amount: Decimal,
    denom: String,
}

impl GasPrice {
    pub fn new(amount: Decimal, denom: impl Into<String>) -> Result<Self, GasPriceError> {
        let denom = denom.into();
        if amount.is_sign_negative() {
            return Err(GasPriceError::Negative);
        }
        validate_denom(&denom)?;
        Ok(Self { amount, denom })
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }

    /// Multiply the price by `factor`.
    pub fn scaled(&self, factor: Decimal) -> Result<Self, GasPriceError> {
        let amount = self
            .amount
            .checked_mul(factor)
            .ok_or(GasPriceError::Overflow)?;
        Self::new(amount, self.denom.clone())
    }

    /// Fee owed for `gas_limit` units: `ceil(price * gas_limit)`.
    pub fn fee_for(&self, gas_limit: u64) -> Result<u128, GasPriceError> {
        self.amount
            .checked_mul(Decimal::from(gas_limit))
            .map(|total| total.ceil())
            .and_then(|total| total.to_u128())
            .ok_or(GasPriceError::Overflow)
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut amount = self.amount;
        amount.rescale(DEC_COIN_PRECISION);
        write!(f, "{}{}", amount, self.denom)
    }
}

impl FromStr for GasPrice {
    type Err = GasPriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| GasPriceError::Malformed(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(GasPriceError::Malformed(s.to_string()));
        }
        let amount =
            Decimal::from_str(amount).map_err(|_| GasPriceError::Malformed(s.to_string()))?;
        Self::new(amount, denom)
    }
}

impl Serialize for GasPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GasPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn validate_denom(denom: &str) -> Result<(), GasPriceError> {
    let valid = denom.len() >= 3
        && denom.starts_with(|c: char| c.is_ascii_alphabetic())
        && denom
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(GasPriceError::InvalidDenom(denom.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GasPriceError {
    #[error("Malformed gas price: {0}")]
    Malformed(String),

    #[error("Invalid denom: {0}")]
    InvalidDenom(String),

    #[error("Gas price must not be negative")]
    Negative,

    #[error("Gas arithmetic overflow")]
    Overflow,
}

/// Adjustment factors applied during estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    /// Multiplier on the chain's minimum gas price
    pub price_adjustment: Decimal,
    /// Multiplier on simulated gas usage
    pub gas_adjustment: Decimal,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            price_adjustment: Decimal::from_str(DEFAULT_GAS_PRICE_ADJUSTMENT)
                .unwrap_or(Decimal::ONE),
            gas_adjustment: Decimal::ONE,
        }
    }
}

/// Computes gas price and gas limit for a prospective transfer.
#[derive(Clone)]
pub struct GasEstimator {
    gateway: Arc<dyn ChainGateway>,
    settings: GasSettings,
}

impl GasEstimator {
    pub fn new(gateway: Arc<dyn ChainGateway>, settings: GasSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn settings(&self) -> GasSettings {
        self.settings
    }

    /// Estimate gas for `tx`, which must have been built without gas values.
    ///
    /// Simulation failures are reported, not retried: an insufficient
    /// balance or invalid message will not change between attempts.
    pub async fn estimate(
        &self,
        keyring: &Keyring,
        tx: &UnsignedTransferTx,
    ) -> Result<GasQuote, ServiceError> {
        let chain_price = self
            .gateway
            .gas_price()
            .await
            .map_err(|source| ServiceError::GasEstimation {
                operation: "gas_price",
                source,
            })?;
        let gas_price = chain_price
            .scaled(self.settings.price_adjustment)
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        // The override lives only in this local copy.
        let priced = tx.clone().with_gas(gas_price.clone(), 0);
        let sim_bytes = simulation_bytes(keyring, &priced)?;

        let simulated = self
            .gateway
            .simulate_gas(&sim_bytes)
            .await
            .map_err(|source| ServiceError::GasEstimation {
                operation: "simulate",
                source,
            })?;

        let gas_used = Decimal::from(simulated)
            .checked_mul(self.settings.gas_adjustment)
            .and_then(|adjusted| adjusted.trunc().to_u64())
            .ok_or_else(|| {
                ServiceError::Internal(format!(
                    "gas adjustment {} overflows simulated gas {simulated}",
                    self.settings.gas_adjustment
                ))
            })?;
        // Zero gas reads as "unset" to callers, so it must never be proposed.
        if gas_used == 0 {
            return Err(ServiceError::GasEstimation {
                operation: "simulate",
                source: ChainError::Decode(format!(
                    "simulated gas {simulated} adjusts to zero"
                )),
            });
        }

        tracing::debug!(
            chain_price = %chain_price,
            gas_price = %gas_price,
            simulated,
            gas_used,
            "Estimated transfer gas"
        );

        Ok(GasQuote { gas_price, gas_used })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::builder::TxBuilder;
    use crate::blockchain::keys::tests::TEST_MNEMONIC;
    use crate::blockchain::mock::MockGateway;
    use crate::blockchain::proto;
    use crate::blockchain::types::TransferIntent;
    use prost::Message;

    #[test]
    fn parses_and_prints_with_chain_precision() {
        let price: GasPrice = "0.0625ucore".parse().unwrap();
        assert_eq!(price.denom(), "ucore");
        assert_eq!(price.to_string(), "0.062500000000000000ucore");

        let reparsed: GasPrice = price.to_string().parse().unwrap();
        assert_eq!(reparsed, price);
    }

    #[test]
    fn rejects_malformed_prices() {
        assert!("".parse::<GasPrice>().is_err());
        assert!("ucore".parse::<GasPrice>().is_err());
        assert!("0.5".parse::<GasPrice>().is_err());
        assert!("-1ucore".parse::<GasPrice>().is_err());
        assert!("1.2.3ucore".parse::<GasPrice>().is_err());
    }

    #[test]
    fn fee_rounds_up() {
        let price: GasPrice = "0.0625ucore".parse().unwrap();
        assert_eq!(price.fee_for(100_000).unwrap(), 6_250);
        assert_eq!(price.fee_for(100_001).unwrap(), 6_251);
        assert_eq!(price.fee_for(0).unwrap(), 0);
    }

    #[test]
    fn scaled_applies_adjustment() {
        let price: GasPrice = "0.0625ucore".parse().unwrap();
        let adjusted = price.scaled(Decimal::from_str("1.1").unwrap()).unwrap();
        assert_eq!(adjusted.to_string(), "0.068750000000000000ucore");
    }

    #[test]
    fn serde_uses_text_form() {
        let price: GasPrice = "0.1utestcore".parse().unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"0.100000000000000000utestcore\"");
        let back: GasPrice = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }

    async fn unpriced_tx(gateway: Arc<MockGateway>) -> (Keyring, UnsignedTransferTx) {
        let keyring = Keyring::from_mnemonic(TEST_MNEMONIC, "testcore").unwrap();
        let builder = TxBuilder::new(gateway, "coreum-testnet-1", "testcore");
        let intent = TransferIntent {
            recipient: keyring.primary().address().to_string(),
            denom: "utestcore".to_string(),
            amount: 1,
            memo: "testing".to_string(),
        };
        let tx = builder
            .prepare_transfer(&keyring, &intent, 3, None)
            .await
            .unwrap();
        (keyring, tx)
    }

    #[tokio::test]
    async fn estimate_adjusts_price_and_leaves_input_untouched() {
        let gateway = Arc::new(MockGateway::new());
        let (keyring, tx) = unpriced_tx(gateway.clone()).await;
        let estimator = GasEstimator::new(gateway.clone(), GasSettings::default());

        let quote = estimator.estimate(&keyring, &tx).await.unwrap();

        assert_eq!(quote.gas_price.to_string(), "0.068750000000000000utestcore");
        assert_eq!(quote.gas_used, MockGateway::SIMULATED_GAS);
        assert!(tx.gas_price().is_none());
        assert_eq!(tx.gas_limit(), 0);
    }

    #[tokio::test]
    async fn back_to_back_estimations_do_not_leak_prices() {
        let gateway = Arc::new(MockGateway::new());
        let (keyring, tx) = unpriced_tx(gateway.clone()).await;

        let generous = GasEstimator::new(
            gateway.clone(),
            GasSettings {
                price_adjustment: Decimal::from(2),
                gas_adjustment: Decimal::ONE,
            },
        );
        let plain = GasEstimator::new(
            gateway.clone(),
            GasSettings {
                price_adjustment: Decimal::ONE,
                gas_adjustment: Decimal::ONE,
            },
        );

        let (a, b) = tokio::join!(generous.estimate(&keyring, &tx), plain.estimate(&keyring, &tx));
        assert_eq!(a.unwrap().gas_price.to_string(), "0.125000000000000000utestcore");
        assert_eq!(b.unwrap().gas_price.to_string(), "0.062500000000000000utestcore");

        let again = plain.estimate(&keyring, &tx).await.unwrap();
        assert_eq!(again.gas_price.to_string(), "0.062500000000000000utestcore");
    }

    #[tokio::test]
    async fn gas_adjustment_scales_simulated_usage() {
        let gateway = Arc::new(MockGateway::new());
        let (keyring, tx) = unpriced_tx(gateway.clone()).await;
        let estimator = GasEstimator::new(
            gateway,
            GasSettings {
                price_adjustment: Decimal::ONE,
                gas_adjustment: Decimal::from_str("1.5").unwrap(),
            },
        );

        let quote = estimator.estimate(&keyring, &tx).await.unwrap();
        assert_eq!(quote.gas_used, MockGateway::SIMULATED_GAS * 3 / 2);
    }

    #[tokio::test]
    async fn simulation_failure_is_a_gas_estimation_error() {
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_simulation("insufficient funds");
        let (keyring, tx) = unpriced_tx(gateway.clone()).await;
        let estimator = GasEstimator::new(gateway.clone(), GasSettings::default());

        let err = estimator.estimate(&keyring, &tx).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::GasEstimation {
                operation: "simulate",
                ..
            }
        ));
        assert_eq!(gateway.simulate_calls(), 1);
    }

    #[tokio::test]
    async fn simulation_carries_adjusted_denom_and_current_sequence() {
        let gateway = Arc::new(MockGateway::new());
        let (keyring, tx) = unpriced_tx(gateway.clone()).await;
        let estimator = GasEstimator::new(gateway.clone(), GasSettings::default());

        estimator.estimate(&keyring, &tx).await.unwrap();

        let simulations = gateway.simulations();
        assert_eq!(simulations.len(), 1);
        let raw = proto::TxRaw::decode(simulations[0].as_slice()).unwrap();
        assert_eq!(raw.signatures, vec![Vec::<u8>::new()]);
        assert_eq!(raw.body_bytes, tx.body_bytes());

        let auth_info = proto::AuthInfo::decode(raw.auth_info_bytes.as_slice()).unwrap();
        assert_eq!(auth_info.signer_infos.len(), 1);
        assert_eq!(auth_info.signer_infos[0].sequence, MockGateway::SEQUENCE);
        let fee = auth_info.fee.unwrap();
        assert_eq!(fee.gas_limit, 0);
        assert_eq!(fee.amount.len(), 1);
        assert_eq!(fee.amount[0].denom, "utestcore");
        assert_eq!(fee.amount[0].amount, "0");
    }

    #[tokio::test]
    async fn zero_simulated_gas_is_rejected() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_simulated_gas(0);
        let (keyring, tx) = unpriced_tx(gateway.clone()).await;
        let estimator = GasEstimator::new(gateway, GasSettings::default());

        let err = estimator.estimate(&keyring, &tx).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::GasEstimation {
                operation: "simulate",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn adjustment_truncating_to_zero_is_rejected() {
        let gateway = Arc::new(MockGateway::new());
        let (keyring, tx) = unpriced_tx(gateway.clone()).await;
        let estimator = GasEstimator::new(
            gateway,
            GasSettings {
                price_adjustment: Decimal::ONE,
                gas_adjustment: Decimal::from_str("0.00001").unwrap(),
            },
        );

        let err = estimator.estimate(&keyring, &tx).await.unwrap_err();
        assert_eq!(err.error_code(), "GAS_ESTIMATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_adjustment_is_an_error_not_a_panic() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_simulated_gas(u64::MAX);
        let (keyring, tx) = unpriced_tx(gateway.clone()).await;
        let estimator = GasEstimator::new(
            gateway,
            GasSettings {
                price_adjustment: Decimal::ONE,
                gas_adjustment: Decimal::from(10_000_000_000u64),
            },
        );

        let err = estimator.estimate(&keyring, &tx).await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
