// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    auth::{AuthError, ClerkSessions, SessionAuthenticator},
    config::AppConfig,
    ledger::{LedgerClient, LedgerHandle},
    proof::{ProofVerifier, ReclaimVerifier},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: LedgerHandle,
    pub proofs: Arc<dyn ProofVerifier>,
    pub sessions: Arc<dyn SessionAuthenticator>,
}

impl AppState {
    /// Wire the production capabilities from configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, AuthError> {
        let sessions = ClerkSessions::from_config(&config.session)?;
        let proofs = ReclaimVerifier::from_config(&config.reclaim);
        let ledger = LedgerHandle::new(config.ledger.clone());

        Ok(Self {
            config: Arc::new(config),
            ledger,
            proofs: Arc::new(proofs),
            sessions: Arc::new(sessions),
        })
    }

    pub fn with_ledger_client(mut self, client: Arc<dyn LedgerClient>) -> Self {
        self.ledger = LedgerHandle::with_client(client);
        self
    }

    pub fn with_proof_verifier(mut self, verifier: Arc<dyn ProofVerifier>) -> Self {
        self.proofs = verifier;
        self
    }

    pub fn with_sessions(mut self, sessions: Arc<dyn SessionAuthenticator>) -> Self {
        self.sessions = sessions;
        self
    }
}

impl Default for AppState {
    /// Default configuration with development-mode sessions.
    fn default() -> Self {
        let config = AppConfig::default();
        Self {
            ledger: LedgerHandle::new(config.ledger.clone()),
            proofs: Arc::new(ReclaimVerifier::from_config(&config.reclaim)),
            sessions: Arc::new(ClerkSessions::development()),
            config: Arc::new(config),
        }
    }
}
