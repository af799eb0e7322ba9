// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Connection
//!
//! Tracks the user's Weil wallet address through an injected wallet
//! provider. The provider answers two requests:
//!
//! - `weil_accounts`: accounts already authorised for this site (no prompt)
//! - `weil_requestAccounts`: asks the user to connect (prompts)
//!
//! Providers return accounts in several shapes (plain strings or objects with
//! `address`, `account` or `id`), normalised by [`parse_address`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::{debug, warn};

pub const ACCOUNTS_METHOD: &str = "weil_accounts";
pub const REQUEST_ACCOUNTS_METHOD: &str = "weil_requestAccounts";

/// Provider error code for a user rejecting the connection prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

const REJECTED_MESSAGE: &str = "Connection rejected by user.";
const FAILED_MESSAGE: &str = "Failed to connect wallet.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct WalletError {
    pub code: Option<i64>,
    pub message: String,
}

impl WalletError {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE) || self.message.contains("rejected")
    }
}

/// The injected wallet object.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str) -> Result<Value, WalletError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    Initializing,
    Idle,
    Connecting,
    Connected,
}

/// Extract an address from one provider account entry.
pub fn parse_address(account: &Value) -> Option<String> {
    match account {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => ["address", "account", "id"]
            .iter()
            .filter_map(|k| map.get(*k))
            .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
            .map(str::to_string),
        _ => None,
    }
}

/// Connection state for one page session.
pub struct WalletConnection<P> {
    provider: Option<P>,
    address: Option<String>,
    status: ConnectionStatus,
    error: Option<String>,
}

impl<P: WalletProvider> WalletConnection<P> {
    /// `provider` is `None` when no wallet extension was injected.
    pub fn new(provider: Option<P>) -> Self {
        Self {
            provider,
            address: None,
            status: ConnectionStatus::Initializing,
            error: None,
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_installed(&self) -> bool {
        self.provider.is_some()
    }

    /// Restore an existing authorisation without prompting the user.
    pub async fn init(&mut self) {
        let Some(provider) = &self.provider else {
            self.status = ConnectionStatus::Idle;
            return;
        };

        match provider.request(ACCOUNTS_METHOD).await {
            Ok(accounts) => self.accounts_changed(&accounts),
            Err(e) => {
                warn!(error = %e, "Silent wallet check failed");
                self.status = ConnectionStatus::Idle;
            }
        }
    }

    /// Prompt the user to connect. Does nothing without a provider.
    pub async fn connect(&mut self) {
        let Some(provider) = &self.provider else {
            return;
        };
        self.status = ConnectionStatus::Connecting;
        self.error = None;

        match provider.request(REQUEST_ACCOUNTS_METHOD).await {
            Ok(accounts) => self.accounts_changed(&accounts),
            Err(e) => {
                warn!(error = %e, code = ?e.code, "Wallet connection failed");
                self.status = ConnectionStatus::Idle;
                self.error = Some(
                    if e.is_user_rejection() {
                        REJECTED_MESSAGE
                    } else {
                        FAILED_MESSAGE
                    }
                    .to_string(),
                );
            }
        }
    }

    /// Apply an account list pushed by the provider or returned by a request.
    pub fn accounts_changed(&mut self, accounts: &Value) {
        let address = accounts
            .as_array()
            .and_then(|list| list.first())
            .and_then(parse_address);

        match address {
            Some(address) => {
                debug!(%address, "Wallet connected");
                self.address = Some(address);
                self.status = ConnectionStatus::Connected;
                self.error = None;
            }
            None => {
                self.address = None;
                self.status = ConnectionStatus::Idle;
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.address = None;
        self.status = ConnectionStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Provider that replays canned answers and records requested methods.
    struct ScriptedProvider {
        accounts: Result<Value, WalletError>,
        request_accounts: Result<Value, WalletError>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(
            accounts: Result<Value, WalletError>,
            request_accounts: Result<Value, WalletError>,
        ) -> Self {
            Self {
                accounts,
                request_accounts,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl WalletProvider for ScriptedProvider {
        async fn request(&self, method: &str) -> Result<Value, WalletError> {
            self.calls.lock().unwrap().push(method.to_string());
            match method {
                ACCOUNTS_METHOD => self.accounts.clone(),
                REQUEST_ACCOUNTS_METHOD => self.request_accounts.clone(),
                other => Err(WalletError::new(None, format!("unsupported {other}"))),
            }
        }
    }

    #[test]
    fn parses_address_shapes() {
        assert_eq!(parse_address(&json!("0xabc")).as_deref(), Some("0xabc"));
        assert_eq!(parse_address(&json!({ "address": "0x1" })).as_deref(), Some("0x1"));
        assert_eq!(parse_address(&json!({ "account": "0x2" })).as_deref(), Some("0x2"));
        assert_eq!(parse_address(&json!({ "id": "0x3" })).as_deref(), Some("0x3"));
        assert_eq!(
            parse_address(&json!({ "address": "", "account": "0x4" })).as_deref(),
            Some("0x4")
        );
        assert_eq!(parse_address(&json!({ "name": "x" })), None);
        assert_eq!(parse_address(&Value::Null), None);
        assert_eq!(parse_address(&json!(42)), None);
    }

    #[tokio::test]
    async fn missing_provider_goes_idle_and_ignores_connect() {
        let mut conn: WalletConnection<ScriptedProvider> = WalletConnection::new(None);
        assert_eq!(conn.status(), ConnectionStatus::Initializing);

        conn.init().await;
        assert!(!conn.is_installed());
        assert_eq!(conn.status(), ConnectionStatus::Idle);

        conn.connect().await;
        assert_eq!(conn.status(), ConnectionStatus::Idle);
        assert!(conn.error().is_none());
    }

    #[tokio::test]
    async fn init_restores_existing_session() {
        let provider = ScriptedProvider::new(Ok(json!([{ "address": "0xabc" }])), Ok(json!([])));
        let mut conn = WalletConnection::new(Some(provider));

        conn.init().await;
        assert_eq!(conn.status(), ConnectionStatus::Connected);
        assert_eq!(conn.address(), Some("0xabc"));
    }

    #[tokio::test]
    async fn silent_check_failure_goes_idle() {
        let provider = ScriptedProvider::new(
            Err(WalletError::new(None, "locked")),
            Ok(json!(["0xabc"])),
        );
        let mut conn = WalletConnection::new(Some(provider));

        conn.init().await;
        assert_eq!(conn.status(), ConnectionStatus::Idle);
        assert!(conn.error().is_none());
    }

    #[tokio::test]
    async fn connect_prompts_and_connects() {
        let provider = ScriptedProvider::new(Ok(json!([])), Ok(json!(["0xdef"])));
        let mut conn = WalletConnection::new(Some(provider));

        conn.init().await;
        assert_eq!(conn.status(), ConnectionStatus::Idle);

        conn.connect().await;
        assert_eq!(conn.status(), ConnectionStatus::Connected);
        assert_eq!(conn.address(), Some("0xdef"));

        let calls = conn.provider.as_ref().unwrap().calls.lock().unwrap().clone();
        assert_eq!(calls, vec![ACCOUNTS_METHOD, REQUEST_ACCOUNTS_METHOD]);
    }

    #[tokio::test]
    async fn rejection_and_failure_messages() {
        let provider = ScriptedProvider::new(
            Ok(json!([])),
            Err(WalletError::new(Some(USER_REJECTED_CODE), "User denied")),
        );
        let mut conn = WalletConnection::new(Some(provider));
        conn.connect().await;
        assert_eq!(conn.status(), ConnectionStatus::Idle);
        assert_eq!(conn.error(), Some("Connection rejected by user."));

        let provider = ScriptedProvider::new(
            Ok(json!([])),
            Err(WalletError::new(None, "request rejected")),
        );
        let mut conn = WalletConnection::new(Some(provider));
        conn.connect().await;
        assert_eq!(conn.error(), Some("Connection rejected by user."));

        let provider =
            ScriptedProvider::new(Ok(json!([])), Err(WalletError::new(Some(-32603), "internal")));
        let mut conn = WalletConnection::new(Some(provider));
        conn.connect().await;
        assert_eq!(conn.error(), Some("Failed to connect wallet."));
    }

    #[tokio::test]
    async fn account_switch_and_disconnect() {
        let provider = ScriptedProvider::new(Ok(json!(["0x1"])), Ok(json!(["0x1"])));
        let mut conn = WalletConnection::new(Some(provider));
        conn.init().await;

        conn.accounts_changed(&json!(["0x2"]));
        assert_eq!(conn.address(), Some("0x2"));

        conn.accounts_changed(&json!([]));
        assert_eq!(conn.status(), ConnectionStatus::Idle);
        assert_eq!(conn.address(), None);

        conn.accounts_changed(&json!(["0x3"]));
        conn.disconnect();
        assert_eq!(conn.status(), ConnectionStatus::Idle);
        assert_eq!(conn.address(), None);
        assert_eq!(conn.status().to_string(), "idle");
    }
}
