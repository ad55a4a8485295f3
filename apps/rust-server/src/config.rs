// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! The deployment stage selects a network profile. Endpoints and gas
//! factors can be overridden from the environment. Configuration is loaded
//! once at startup; every failure is returned as a [`ConfigError`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `STAGE` | `prod`, `beta`, `local` or `test` | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5011` |
//! | `COREUM_REST_URL` | Cosmos REST gateway | Stage profile |
//! | `COREUM_RPC_URL` | Tendermint RPC endpoint | Stage profile |
//! | `GAS_PRICE_ADJUSTMENT` | Multiplier on the chain minimum gas price | `1.1` |
//! | `GAS_ADJUSTMENT` | Multiplier on simulated gas | `1.0` |
//! | `SCAN_MAX_CONCURRENCY` | Blocks fetched in parallel by range scans | `16` |
//! | `TOKENIZATION_SECRETS` | Inline secrets JSON | - |
//! | `TOKENIZATION_SECRETS_FILE` | Path to the secrets JSON | - |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::blockchain::gas::{GasSettings, DEFAULT_GAS_ADJUSTMENT, DEFAULT_GAS_PRICE_ADJUSTMENT};
use crate::blockchain::scanner::{ScannerConfig, DEFAULT_MAX_CONCURRENCY};

pub const STAGE_ENV: &str = "STAGE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const REST_URL_ENV: &str = "COREUM_REST_URL";
pub const RPC_URL_ENV: &str = "COREUM_RPC_URL";
pub const GAS_PRICE_ADJUSTMENT_ENV: &str = "GAS_PRICE_ADJUSTMENT";
pub const GAS_ADJUSTMENT_ENV: &str = "GAS_ADJUSTMENT";
pub const SCAN_MAX_CONCURRENCY_ENV: &str = "SCAN_MAX_CONCURRENCY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5011;

/// Secret identifier of the USDS treasury mnemonic.
pub const TREASURY_SECRET_ID: &str = "usds_treasury_wallet_mnemonic";

/// Decimals of the USDS token.
pub const USDS_DECIMALS: u32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Unknown stage `{0}`, expected prod, beta, local or test")]
    UnknownStage(String),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Deployment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prod,
    Beta,
    Local,
    Test,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Prod => "prod",
            Stage::Beta => "beta",
            Stage::Local => "local",
            Stage::Test => "test",
        }
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Stage::Prod)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" => Ok(Stage::Prod),
            "beta" => Ok(Stage::Beta),
            "local" => Ok(Stage::Local),
            "test" => Ok(Stage::Test),
            other => Err(ConfigError::UnknownStage(other.to_string())),
        }
    }
}

/// The USDS asset on a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    pub denom: String,
    pub decimals: u32,
    pub treasury_secret_id: String,
    /// Supply minted at genesis, in base units
    pub initial_token_supply: u64,
    pub issuance_enabled: bool,
    pub redemption_enabled: bool,
}

/// Chain endpoints and parameters for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub chain_id: String,
    pub address_prefix: String,
    pub rest_url: String,
    pub rpc_url: String,
    pub confirmations: u32,
    pub usds: AssetConfig,
}

impl NetworkProfile {
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Prod => Self {
                chain_id: "coreum-mainnet-1".to_string(),
                address_prefix: "core".to_string(),
                rest_url: "https://full-node.mainnet-1.coreum.dev:1317".to_string(),
                rpc_url: "https://full-node.mainnet-1.coreum.dev:26657".to_string(),
                confirmations: 2,
                usds: AssetConfig {
                    denom: "microusds-core17z02cx2xxz2rehq6qay3rc06g5ksa9nxjwh5uv".to_string(),
                    decimals: USDS_DECIMALS,
                    treasury_secret_id: TREASURY_SECRET_ID.to_string(),
                    initial_token_supply: 10_000_000_000_000,
                    issuance_enabled: true,
                    redemption_enabled: true,
                },
            },
            Stage::Beta | Stage::Local | Stage::Test => Self {
                chain_id: "coreum-testnet-1".to_string(),
                address_prefix: "testcore".to_string(),
                rest_url: "https://full-node.testnet-1.coreum.dev:1317".to_string(),
                rpc_url: "https://full-node.testnet-1.coreum.dev:26657".to_string(),
                confirmations: 1,
                usds: AssetConfig {
                    denom: "microusds-testcore162rs3klx73exmyupxlqjju0u7aggcp0fswetn2"
                        .to_string(),
                    decimals: USDS_DECIMALS,
                    treasury_secret_id: TREASURY_SECRET_ID.to_string(),
                    initial_token_supply: 9_000_000_000_000_000,
                    issuance_enabled: true,
                    redemption_enabled: true,
                },
            },
        }
    }
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub stage: Stage,
    pub host: String,
    pub port: u16,
    pub network: NetworkProfile,
    pub gas: GasSettings,
    pub scanner: ScannerConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let stage: Stage = lookup(STAGE_ENV)
            .ok_or(ConfigError::Missing(STAGE_ENV))?
            .parse()?;

        let mut network = NetworkProfile::for_stage(stage);
        if let Some(url) = lookup(REST_URL_ENV) {
            network.rest_url = url;
        }
        if let Some(url) = lookup(RPC_URL_ENV) {
            network.rpc_url = url;
        }
        validate_url(REST_URL_ENV, &network.rest_url)?;
        validate_url(RPC_URL_ENV, &network.rpc_url)?;

        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let gas = GasSettings {
            price_adjustment: decimal_var(
                &lookup,
                GAS_PRICE_ADJUSTMENT_ENV,
                DEFAULT_GAS_PRICE_ADJUSTMENT,
            )?,
            gas_adjustment: decimal_var(&lookup, GAS_ADJUSTMENT_ENV, DEFAULT_GAS_ADJUSTMENT)?,
        };

        let max_concurrency = match lookup(SCAN_MAX_CONCURRENCY_ENV) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: SCAN_MAX_CONCURRENCY_ENV,
                        reason: format!("expected a positive integer, got {raw:?}"),
                    })
                }
            },
            None => DEFAULT_MAX_CONCURRENCY,
        };
        let scanner = ScannerConfig {
            max_concurrency,
            ..ScannerConfig::default()
        };

        Ok(Self {
            stage,
            host,
            port,
            network,
            gas,
            scanner,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    Ok(())
}

fn decimal_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<Decimal, ConfigError> {
    let raw = lookup(name).unwrap_or_else(|| default.to_string());
    let value = Decimal::from_str(raw.trim()).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    if value <= Decimal::ZERO {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be positive".to_string(),
        });
    }
    Ok(value)
}
