// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Proof of Income Verification
//!
//! Income claims arrive as Reclaim proofs: a claim about a provider response
//! (e.g. an Upwork earnings page) signed by one or more attestor witnesses.
//! The relay only needs two capabilities, captured by [`ProofVerifier`]:
//! decide whether a proof is correctly signed, and hand back the extracted
//! parameter values untouched.

pub mod providers;
pub mod reclaim;

use async_trait::async_trait;

pub use providers::{ReclaimProvider, PROVIDERS};
pub use reclaim::{ReclaimProof, ReclaimVerifier};

#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("No trusted Reclaim witnesses configured")]
    NoTrustedWitnesses,

    #[error("Malformed proof: {0}")]
    Malformed(String),
}

/// Checks the cryptographic correctness of a proof.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// `Ok(false)` means the proof is well formed but not correctly attested.
    async fn verify_correctness(&self, proof: &ReclaimProof) -> Result<bool, ProofError>;
}
