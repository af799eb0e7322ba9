// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into
//! [`AppConfig`]. Values that are only needed by one endpoint (admin key,
//! contract address, Reclaim credentials) are kept optional here and checked
//! when the endpoint first needs them, so a missing value fails that request
//! instead of the whole process.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `LEDGER_BACKEND` | `sentinel` (remote contract) or `memory` | `sentinel` |
//! | `ADMIN_PRIVATE_KEY` | Admin signing key (hex or PEM) | Required for `sentinel` |
//! | `WEIL_SENTINEL_URL` | Sentinel endpoint accepting signed calls | Required for `sentinel` |
//! | `CONTRACT_ADDRESS` | Deployed database contract address | Required for `sentinel` |
//! | `RECLAIM_APP_ID` | Reclaim application id | Optional |
//! | `RECLAIM_WITNESSES` | Comma-separated trusted witness addresses | Empty |
//! | `RECLAIM_MIN_WITNESSES` | Witness signatures required per proof | `1` |
//! | `CLERK_JWKS_URL` | Clerk JWKS endpoint for session verification | Development mode when unset |
//! | `CLERK_ISSUER` | Expected session token issuer | Optional |
//! | `CLERK_AUDIENCE` | Expected session token audience | Optional |

use std::net::SocketAddr;

use alloy::primitives::Address;
use secrecy::SecretString;
use strum::{Display, EnumString};
use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const LEDGER_BACKEND_ENV: &str = "LEDGER_BACKEND";

/// Hex or PEM encoded secp256k1 key that signs every database call.
///
/// Never logged and never serialized; see [`crate::ledger::signing`].
pub const ADMIN_PRIVATE_KEY_ENV: &str = "ADMIN_PRIVATE_KEY";
pub const SENTINEL_URL_ENV: &str = "WEIL_SENTINEL_URL";
pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";

pub const RECLAIM_APP_ID_ENV: &str = "RECLAIM_APP_ID";
pub const RECLAIM_WITNESSES_ENV: &str = "RECLAIM_WITNESSES";
pub const RECLAIM_MIN_WITNESSES_ENV: &str = "RECLAIM_MIN_WITNESSES";

pub const CLERK_JWKS_URL_ENV: &str = "CLERK_JWKS_URL";
pub const CLERK_ISSUER_ENV: &str = "CLERK_ISSUER";
pub const CLERK_AUDIENCE_ENV: &str = "CLERK_AUDIENCE";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Errors for values that are present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl ToString) -> Self {
        Self::Invalid {
            name,
            reason: reason.to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Which implementation backs the database gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LedgerBackend {
    /// Signed calls to the remote contract through the sentinel.
    #[default]
    Sentinel,
    /// Process-local tables, for development and tests.
    Memory,
}

/// Settings for the admin-signed ledger client.
///
/// All three values are optional at load time; the ledger handle reports
/// which one is missing on first use.
#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    pub admin_private_key: Option<SecretString>,
    pub sentinel_url: Option<Url>,
    pub contract_address: Option<String>,
}

/// Reclaim proof protocol settings.
#[derive(Debug, Clone)]
pub struct ReclaimConfig {
    pub app_id: Option<String>,
    /// Attestors whose signatures are accepted on a claim.
    pub witnesses: Vec<Address>,
    pub min_witnesses: usize,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            witnesses: Vec::new(),
            min_witnesses: 1,
        }
    }
}

/// Clerk session verification settings.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub jwks_url: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub ledger: LedgerConfig,
    pub reclaim: ReclaimConfig,
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            log_format: LogFormat::default(),
            ledger: LedgerConfig::default(),
            reclaim: ReclaimConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    ///
    /// Empty and whitespace-only values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(PORT_ENV, e))?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, e))?;

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::invalid(LOG_FORMAT_ENV, format!("unknown format `{raw}`")))?,
            None => LogFormat::default(),
        };

        let backend = match get(LEDGER_BACKEND_ENV) {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::invalid(LEDGER_BACKEND_ENV, format!("unknown backend `{raw}`"))
            })?,
            None => LedgerBackend::default(),
        };
        let sentinel_url = get(SENTINEL_URL_ENV)
            .map(|raw| Url::parse(&raw).map_err(|e| ConfigError::invalid(SENTINEL_URL_ENV, e)))
            .transpose()?;

        let ledger = LedgerConfig {
            backend,
            admin_private_key: get(ADMIN_PRIVATE_KEY_ENV).map(SecretString::from),
            sentinel_url,
            contract_address: get(CONTRACT_ADDRESS_ENV),
        };

        let witnesses = get(RECLAIM_WITNESSES_ENV)
            .map(|raw| parse_witnesses(&raw))
            .transpose()?
            .unwrap_or_default();
        let min_witnesses = match get(RECLAIM_MIN_WITNESSES_ENV) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) => return Err(ConfigError::invalid(RECLAIM_MIN_WITNESSES_ENV, "must be at least 1")),
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid(RECLAIM_MIN_WITNESSES_ENV, e)),
            },
            None => 1,
        };

        let reclaim = ReclaimConfig {
            app_id: get(RECLAIM_APP_ID_ENV),
            witnesses,
            min_witnesses,
        };

        let session = SessionConfig {
            jwks_url: get(CLERK_JWKS_URL_ENV),
            issuer: get(CLERK_ISSUER_ENV),
            audience: get(CLERK_AUDIENCE_ENV),
        };

        Ok(Self {
            bind_addr,
            log_format,
            ledger,
            reclaim,
            session,
        })
    }
}

fn parse_witnesses(raw: &str) -> Result<Vec<Address>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| ConfigError::invalid(RECLAIM_WITNESSES_ENV, format!("`{s}`: {e}")))
        })
        .collect()
}
