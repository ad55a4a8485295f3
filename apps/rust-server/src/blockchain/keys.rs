// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mnemonic to address and signing key derivation.
//!
//! Keys follow BIP-39 / BIP-32 with the path `m/44'/990'/<index>'/0/0`.
//! Account addresses are `bech32(prefix, ripemd160(sha256(compressed_pubkey)))`.
//! Signing keys stay inside [`Keyring`] and are never serialized.

use bech32::{Bech32, Hrp};
use bip39::{Language, Mnemonic};
use coins_bip32::path::DerivationPath;
use coins_bip32::prelude::*;
use k256::ecdsa::SigningKey;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use super::error::ServiceError;
use super::types::{AddressInfo, COREUM_COIN_TYPE};

/// Largest account index usable in a hardened path segment.
const MAX_HARDENED_INDEX: u32 = (1 << 31) - 1;

/// Name given to the key a keyring is created with.
pub const DEFAULT_KEY_NAME: &str = "default";

/// Derivation path for the given account index.
pub fn derivation_path(index: u32) -> String {
    format!("m/44'/{}'/{}'/0/0", COREUM_COIN_TYPE, index)
}

/// Derive the address for `(mnemonic, index)`.
pub fn derive_address(mnemonic: &str, index: u32, prefix: &str) -> Result<AddressInfo, ServiceError> {
    let path = derivation_path(index);
    let record = KeyRecord::derive(DEFAULT_KEY_NAME, mnemonic, index, prefix)?;
    Ok(AddressInfo {
        address: record.address,
        derivation_path: path,
    })
}

/// Encode a compressed secp256k1 public key as a bech32 account address.
pub fn address_from_public_key(public_key: &[u8], prefix: &str) -> Result<String, ServiceError> {
    let hrp = Hrp::parse(prefix)
        .map_err(|e| ServiceError::KeyDerivation(format!("Invalid address prefix: {e}")))?;
    let account_id = Ripemd160::digest(Sha256::digest(public_key));
    bech32::encode::<Bech32>(hrp, &account_id)
        .map_err(|e| ServiceError::KeyDerivation(format!("Bech32 encoding failed: {e}")))
}

/// Check that `address` is a bech32 account address with `prefix`.
pub fn validate_address(address: &str, prefix: &str) -> Result<(), ServiceError> {
    let (hrp, data) = bech32::decode(address)
        .map_err(|e| ServiceError::InvalidInput(format!("Invalid address {address}: {e}")))?;
    if hrp.as_str() != prefix {
        return Err(ServiceError::InvalidInput(format!(
            "Address {address} does not use the `{prefix}` prefix"
        )));
    }
    if data.len() != 20 && data.len() != 32 {
        return Err(ServiceError::InvalidInput(format!(
            "Address {address} has an unexpected length"
        )));
    }
    Ok(())
}

/// One derived key.
pub struct KeyRecord {
    name: String,
    address: String,
    path: String,
    signing_key: SigningKey,
}

impl KeyRecord {
    fn derive(name: &str, mnemonic: &str, index: u32, prefix: &str) -> Result<Self, ServiceError> {
        if index > MAX_HARDENED_INDEX {
            return Err(ServiceError::KeyDerivation(format!(
                "Account index {index} is out of range"
            )));
        }

        let normalized: String = mnemonic.trim().nfkd().collect();
        let mnemonic = Mnemonic::parse_in(Language::English, normalized.as_str())
            .map_err(|e| ServiceError::KeyDerivation(format!("Invalid mnemonic: {e}")))?;
        let seed = mnemonic.to_seed("");

        let path = derivation_path(index);
        let derivation_path = path
            .parse::<DerivationPath>()
            .map_err(|e| ServiceError::KeyDerivation(format!("Invalid derivation path: {e}")))?;

        let master_key = XPriv::root_from_seed(&seed, None)
            .map_err(|e| ServiceError::KeyDerivation(format!("Failed to derive master key: {e}")))?;
        let derived_key = master_key
            .derive_path(&derivation_path)
            .map_err(|e| ServiceError::KeyDerivation(format!("Failed to derive key: {e}")))?;

        let signing_key: &SigningKey = derived_key.as_ref();
        let signing_key = signing_key.clone();
        let public_key = signing_key.verifying_key().to_encoded_point(true);
        let address = address_from_public_key(public_key.as_bytes(), prefix)?;

        Ok(Self {
            name: name.to_string(),
            address,
            path,
            signing_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn derivation_path(&self) -> &str {
        &self.path
    }

    /// Compressed 33-byte public key.
    pub fn public_key(&self) -> Vec<u8> {
        self.signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRecord")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// In-memory keyring holding the signing capability for a mnemonic.
#[derive(Debug)]
pub struct Keyring {
    records: Vec<KeyRecord>,
}

impl Keyring {
    /// Derive the signing keyring for a mnemonic (account index 0).
    pub fn from_mnemonic(mnemonic: &str, prefix: &str) -> Result<Self, ServiceError> {
        let record = KeyRecord::derive(DEFAULT_KEY_NAME, mnemonic, 0, prefix)?;
        Ok(Self {
            records: vec![record],
        })
    }

    /// Add another account index of the same mnemonic under `name`.
    pub fn add_account(
        &mut self,
        name: &str,
        mnemonic: &str,
        index: u32,
        prefix: &str,
    ) -> Result<&KeyRecord, ServiceError> {
        if self.key_by_name(name).is_some() {
            return Err(ServiceError::KeyDerivation(format!(
                "Key `{name}` already exists"
            )));
        }
        self.records
            .push(KeyRecord::derive(name, mnemonic, index, prefix)?);
        Ok(&self.records[self.records.len() - 1])
    }

    /// The key the keyring was created with.
    pub fn primary(&self) -> &KeyRecord {
        &self.records[0]
    }

    pub fn key_by_name(&self, name: &str) -> Option<&KeyRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn key_by_address(&self, address: &str) -> Option<&KeyRecord> {
        self.records.iter().find(|r| r.address == address)
    }
}
