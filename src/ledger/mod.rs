// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Database Client
//!
//! The database gateway forwards allow-listed operations to a key/value
//! contract. Two clients implement [`LedgerClient`]:
//!
//! - [`SentinelLedger`] signs each call with the admin key and submits it to
//!   the sentinel endpoint of the deployed contract.
//! - [`InMemoryLedger`] keeps the same tables in process memory, for local
//!   development and tests.
//!
//! [`LedgerHandle`] owns the process-wide client. It is built lazily on the
//! first request so missing credentials fail that request rather than
//! startup, and it is torn down explicitly on shutdown.

pub mod memory;
pub mod method;
pub mod sentinel;
pub mod signing;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::{LedgerBackend, LedgerConfig};

pub use memory::InMemoryLedger;
pub use method::{DbMethod, DbOperation};
pub use sentinel::SentinelLedger;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Missing admin credentials: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("Missing contract address")]
    MissingContractAddress,

    #[error("Invalid admin key: {0}")]
    InvalidAdminKey(String),

    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("record '{key}' not found in table '{table}'")]
    RecordNotFound { table: String, key: String },

    #[error("field '{field}' not found in record '{key}'")]
    FieldNotFound { key: String, field: String },

    #[error("field '{field}' already exists in record '{key}'")]
    FieldExists { key: String, field: String },

    #[error("duplicate key '{0}' in batch")]
    DuplicateKey(String),

    #[error("Sentinel request failed: {0}")]
    Transport(String),

    #[error("Contract call rejected: {0}")]
    Rejected(String),

    #[error("Sentinel response was invalid: {0}")]
    InvalidResponse(String),
}

/// A client able to run database operations against the contract.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Human-readable backend name for logs and health checks.
    fn backend(&self) -> &'static str;

    /// Whether this backend exposes `method`. Every backend shipped here
    /// exposes the full allow-list.
    fn supports(&self, _method: DbMethod) -> bool {
        true
    }

    /// Run one operation and return its JSON result.
    async fn execute(&self, op: &DbOperation) -> Result<Value, LedgerError>;

    /// Release resources held by the client.
    async fn close(&self) {}
}

/// Lazily initialised, process-wide ledger client.
#[derive(Clone)]
pub struct LedgerHandle {
    config: Arc<LedgerConfig>,
    slot: Arc<RwLock<Option<Arc<dyn LedgerClient>>>>,
}

impl LedgerHandle {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config: Arc::new(config),
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Handle with an already constructed client.
    pub fn with_client(client: Arc<dyn LedgerClient>) -> Self {
        Self {
            config: Arc::new(LedgerConfig::default()),
            slot: Arc::new(RwLock::new(Some(client))),
        }
    }

    /// Return the shared client, building it on first use.
    ///
    /// Construction failures are returned to the caller and not cached.
    pub async fn client(&self) -> Result<Arc<dyn LedgerClient>, LedgerError> {
        if let Some(client) = self.slot.read().await.as_ref() {
            return Ok(Arc::clone(client));
        }

        let mut slot = self.slot.write().await;
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = connect(&self.config)?;
        info!(backend = client.backend(), "Ledger client initialised");
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Whether the handle has everything it needs to build a client.
    pub fn is_configured(&self) -> bool {
        match self.config.backend {
            LedgerBackend::Memory => true,
            LedgerBackend::Sentinel => {
                self.config.admin_private_key.is_some()
                    && self.config.sentinel_url.is_some()
                    && self.config.contract_address.is_some()
            }
        }
    }

    pub async fn is_initialised(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// Drop the shared client after letting it release its resources.
    pub async fn shutdown(&self) {
        let client = self.slot.write().await.take();
        if let Some(client) = client {
            client.close().await;
            info!(backend = client.backend(), "Ledger client closed");
        }
    }
}

fn connect(config: &LedgerConfig) -> Result<Arc<dyn LedgerClient>, LedgerError> {
    match config.backend {
        LedgerBackend::Memory => Ok(Arc::new(InMemoryLedger::new())),
        LedgerBackend::Sentinel => Ok(Arc::new(SentinelLedger::from_config(config)?)),
    }
}
