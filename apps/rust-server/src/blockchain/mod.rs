// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coreum chain integration.
//!
//! This module provides functionality for:
//! - Deriving treasury keys and addresses from mnemonics
//! - Building, pricing, signing and broadcasting bank transfers
//! - Scanning blocks for transfer activity

pub mod builder;
pub mod client;
pub mod decoder;
pub mod error;
pub mod gas;
pub mod keys;
#[cfg(test)]
pub(crate) mod mock;
pub mod proto;
pub mod scanner;
pub mod signing;
pub mod transfer;
pub mod types;

pub use client::{ChainError, ChainGateway, CoreumClient};
pub use error::ServiceError;
pub use gas::{GasPrice, GasSettings};
pub use scanner::{BlockScanner, ScannerConfig};
pub use transfer::{MnemonicSource, TransferService};
pub use types::*;
