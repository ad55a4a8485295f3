// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coreum Server - Custodial Treasury Transfer Service
//!
//! This crate signs and broadcasts token transfers from treasury wallets on
//! the Coreum chain, and scans blocks for the transfers that land there.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Key derivation, transaction building, signing and block scanning
//! - `config` - Stage selection and environment overrides
//! - `secrets` - Treasury mnemonic lookup and caching

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod secrets;
pub mod state;
