// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed contract calls through the Weil sentinel.
//!
//! Each call is a JSON document `{ contract, method, args, nonce, issued_at }`.
//! The exact bytes sent are signed with EIP-191 personal-sign by the admin key;
//! the signer address and signature travel in the `x-weil-signer` and
//! `x-weil-signature` headers.

use std::time::Duration;

use alloy::signers::{local::PrivateKeySigner, Signer};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::method::DbOperation;
use super::signing::admin_signer;
use super::{LedgerClient, LedgerError};
use crate::config::{LedgerConfig, ADMIN_PRIVATE_KEY_ENV, SENTINEL_URL_ENV};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub const SIGNER_HEADER: &str = "x-weil-signer";
pub const SIGNATURE_HEADER: &str = "x-weil-signature";

#[derive(Debug, Serialize)]
pub struct ContractCall<'a> {
    pub contract: &'a str,
    pub method: &'a str,
    pub args: Value,
    pub nonce: Uuid,
    pub issued_at: i64,
}

#[derive(Debug, Deserialize)]
struct SentinelResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct SentinelLedger {
    http: Client,
    execute_url: Url,
    contract: String,
    signer: PrivateKeySigner,
}

impl std::fmt::Debug for SentinelLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentinelLedger")
            .field("execute_url", &self.execute_url.as_str())
            .field("contract", &self.contract)
            .field("signer", &self.signer.address())
            .finish()
    }
}

impl SentinelLedger {
    /// Build the client, failing fast when a credential is absent.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let key = config
            .admin_private_key
            .as_ref()
            .ok_or(LedgerError::MissingCredentials(ADMIN_PRIVATE_KEY_ENV))?;
        let sentinel = config
            .sentinel_url
            .as_ref()
            .ok_or(LedgerError::MissingCredentials(SENTINEL_URL_ENV))?;
        let contract = config
            .contract_address
            .as_deref()
            .ok_or(LedgerError::MissingContractAddress)?;

        let signer = admin_signer(key)?;
        Self::new(sentinel, contract, signer)
    }

    pub fn new(sentinel: &Url, contract: &str, signer: PrivateKeySigner) -> Result<Self, LedgerError> {
        let execute_url = execute_url(sentinel, contract)?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            execute_url,
            contract: contract.to_string(),
            signer,
        })
    }

    pub fn execute_url(&self) -> &Url {
        &self.execute_url
    }

    /// Serialize and sign a call. Returns the body bytes and the 0x-hex signature.
    pub async fn sign_call(&self, op: &DbOperation) -> Result<(Vec<u8>, String), LedgerError> {
        let call = ContractCall {
            contract: &self.contract,
            method: op.method().into(),
            args: op.positional_args(),
            nonce: Uuid::new_v4(),
            issued_at: chrono::Utc::now().timestamp(),
        };
        let body = serde_json::to_vec(&call)
            .map_err(|e| LedgerError::Transport(format!("failed to encode call: {e}")))?;

        let signature = self
            .signer
            .sign_message(&body)
            .await
            .map_err(|e| LedgerError::InvalidAdminKey(format!("signing failed: {e}")))?;

        Ok((body, format!("0x{}", alloy::hex::encode(signature.as_bytes()))))
    }
}

/// `{sentinel}/contracts/{contract}/execute`, keeping any base path.
fn execute_url(sentinel: &Url, contract: &str) -> Result<Url, LedgerError> {
    let mut url = sentinel.clone();
    url.path_segments_mut()
        .map_err(|_| LedgerError::Transport(format!("sentinel URL `{sentinel}` cannot be a base")))?
        .pop_if_empty()
        .extend(["contracts", contract, "execute"]);
    Ok(url)
}

fn decode_response(status: reqwest::StatusCode, bytes: &[u8]) -> Result<Value, LedgerError> {
    let parsed: Option<SentinelResponse> = serde_json::from_slice(bytes).ok();

    if !status.is_success() {
        let detail = parsed
            .and_then(|r| r.error)
            .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned());
        return Err(LedgerError::Transport(format!("HTTP {status}: {detail}")));
    }

    let response = parsed.ok_or_else(|| {
        LedgerError::InvalidResponse(String::from_utf8_lossy(bytes).into_owned())
    })?;

    if response.ok {
        Ok(response.result.unwrap_or(Value::Null))
    } else {
        Err(LedgerError::Rejected(
            response.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}

#[async_trait]
impl LedgerClient for SentinelLedger {
    fn backend(&self) -> &'static str {
        "sentinel"
    }

    async fn execute(&self, op: &DbOperation) -> Result<Value, LedgerError> {
        let (body, signature) = self.sign_call(op).await?;
        debug!(method = %op.method(), contract = %self.contract, "Submitting contract call");

        let response = self
            .http
            .post(self.execute_url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNER_HEADER, self.signer.address().to_string())
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        decode_response(status, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::method::DbMethod;
    use alloy::primitives::Signature;
    use secrecy::SecretString;
    use serde_json::json;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config() -> LedgerConfig {
        LedgerConfig {
            backend: crate::config::LedgerBackend::Sentinel,
            admin_private_key: Some(SecretString::from(DEV_KEY)),
            sentinel_url: Some(Url::parse("https://sentinel.example.com/v1/").unwrap()),
            contract_address: Some("aaaabbbbcccc".to_string()),
        }
    }

    #[test]
    fn missing_values_fail_fast() {
        let mut cfg = config();
        cfg.admin_private_key = None;
        let err = SentinelLedger::from_config(&cfg).unwrap_err();
        assert_eq!(err.to_string(), "Missing admin credentials: ADMIN_PRIVATE_KEY is not set");

        let mut cfg = config();
        cfg.sentinel_url = None;
        assert!(matches!(
            SentinelLedger::from_config(&cfg).unwrap_err(),
            LedgerError::MissingCredentials(SENTINEL_URL_ENV)
        ));

        let mut cfg = config();
        cfg.contract_address = None;
        assert!(matches!(
            SentinelLedger::from_config(&cfg).unwrap_err(),
            LedgerError::MissingContractAddress
        ));
    }

    #[test]
    fn execute_url_keeps_base_path() {
        let ledger = SentinelLedger::from_config(&config()).unwrap();
        assert_eq!(
            ledger.execute_url().as_str(),
            "https://sentinel.example.com/v1/contracts/aaaabbbbcccc/execute"
        );
    }

    #[tokio::test]
    async fn signed_call_recovers_to_admin() {
        let ledger = SentinelLedger::from_config(&config()).unwrap();
        let op = DbOperation::from_body(
            DbMethod::GetValue,
            json!({ "table": "users", "key": "0xabc", "field": "role" }),
        )
        .unwrap();

        let (body, signature) = ledger.sign_call(&op).await.unwrap();
        let call: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(call["method"], "get_value");
        assert_eq!(call["contract"], "aaaabbbbcccc");
        assert_eq!(call["args"], json!(["users", "0xabc", "role"]));

        let raw = alloy::hex::decode(&signature).unwrap();
        let signature = Signature::from_raw(&raw).unwrap();
        let recovered = signature.recover_address_from_msg(&body).unwrap();
        assert_eq!(recovered, ledger.signer.address());
    }

    #[test]
    fn decodes_sentinel_envelopes() {
        let ok = decode_response(reqwest::StatusCode::OK, br#"{"ok":true,"result":["users"]}"#);
        assert_eq!(ok.unwrap(), json!(["users"]));

        let rejected =
            decode_response(reqwest::StatusCode::OK, br#"{"ok":false,"error":"no such table"}"#);
        assert!(matches!(rejected, Err(LedgerError::Rejected(ref m)) if m == "no such table"));

        let failed = decode_response(reqwest::StatusCode::BAD_GATEWAY, b"upstream down");
        assert!(matches!(failed, Err(LedgerError::Transport(ref m)) if m.contains("upstream down")));

        let garbage = decode_response(reqwest::StatusCode::OK, b"<html>");
        assert!(matches!(garbage, Err(LedgerError::InvalidResponse(_))));
    }
}
