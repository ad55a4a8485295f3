// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Treasury mnemonic lookup.
//!
//! [`SecretProvider`] fetches a mnemonic by secret identifier. [`SecretCache`]
//! memoizes successful fetches for the lifetime of the process. Each
//! identifier is fetched at most once at a time; a failed fetch leaves the
//! slot empty so the next caller tries again.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

/// Environment variable holding the secrets document inline.
pub const SECRETS_ENV: &str = "TOKENIZATION_SECRETS";

/// Environment variable naming a file that holds the secrets document.
pub const SECRETS_FILE_ENV: &str = "TOKENIZATION_SECRETS_FILE";

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret `{0}` not found")]
    NotFound(String),

    #[error("Secret `{0}` is empty")]
    Empty(String),

    #[error("Secret provider error: {0}")]
    Provider(String),
}

/// Source of mnemonics keyed by secret identifier.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn mnemonic(&self, secret_id: &str) -> Result<String, SecretError>;
}

/// Shape of the tokenization secrets document.
#[derive(Default, Deserialize)]
struct SecretsDocument {
    #[serde(default)]
    coreum: HashMap<String, String>,
}

/// Reads mnemonics from a JSON document of the form
/// `{"coreum": {"<secret_id>": "<mnemonic>"}}`.
pub struct JsonSecretProvider {
    secrets: HashMap<String, String>,
}

impl JsonSecretProvider {
    pub fn from_json(json: &str) -> Result<Self, SecretError> {
        let document: SecretsDocument = serde_json::from_str(json)
            .map_err(|e| SecretError::Provider(format!("invalid secrets document: {e}")))?;
        Ok(Self {
            secrets: document.coreum,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SecretError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SecretError::Provider(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Load from `TOKENIZATION_SECRETS`, falling back to the file named by
    /// `TOKENIZATION_SECRETS_FILE`. With neither set the provider is empty
    /// and every lookup fails with `NotFound`.
    pub fn from_env() -> Result<Self, SecretError> {
        if let Ok(json) = std::env::var(SECRETS_ENV) {
            return Self::from_json(&json);
        }
        if let Ok(path) = std::env::var(SECRETS_FILE_ENV) {
            return Self::from_file(path);
        }
        tracing::warn!("No tokenization secrets configured");
        Ok(Self {
            secrets: HashMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[async_trait]
impl SecretProvider for JsonSecretProvider {
    async fn mnemonic(&self, secret_id: &str) -> Result<String, SecretError> {
        let value = self
            .secrets
            .get(secret_id)
            .ok_or_else(|| SecretError::NotFound(secret_id.to_string()))?;
        if value.trim().is_empty() {
            return Err(SecretError::Empty(secret_id.to_string()));
        }
        Ok(value.clone())
    }
}

/// Process-wide memo of mnemonics by secret identifier.
pub struct SecretCache {
    provider: Arc<dyn SecretProvider>,
    slots: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl SecretCache {
    pub fn new(provider: Arc<dyn SecretProvider>) -> Self {
        Self {
            provider,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Mnemonic for `secret_id`, fetched on first use.
    pub async fn mnemonic(&self, secret_id: &str) -> Result<String, SecretError> {
        let slot = self.slot(secret_id)?;
        let value = slot
            .get_or_try_init(|| async {
                tracing::info!(secret_id, "Fetching secret");
                self.provider.mnemonic(secret_id).await
            })
            .await?;
        Ok(value.clone())
    }

    fn slot(&self, secret_id: &str) -> Result<Arc<OnceCell<String>>, SecretError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| SecretError::Provider("secret cache lock poisoned".to_string()))?;
        Ok(slots
            .entry(secret_id.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone())
    }
}
