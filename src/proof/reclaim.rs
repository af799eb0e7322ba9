// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reclaim proof structure and witness signature checking.
//!
//! A proof is correct when:
//!
//! 1. `claimData.identifier` equals
//!    `keccak256(provider "\n" parameters "\n" canonical(context))`, and so
//!    does the top-level `identifier` when present. A non-empty context must be
//!    JSON and is hashed in canonical form (sorted keys, no whitespace);
//! 2. every signature is an EIP-191 signature over
//!    `identifier "\n" owner "\n" timestampS "\n" epoch` by a distinct trusted
//!    witness;
//! 3. at least `min_witnesses` signatures are present.

use std::collections::HashSet;

use alloy::primitives::{keccak256, Address, Signature};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ProofError, ProofVerifier};
use crate::config::ReclaimConfig;

/// Claim attested by the witnesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimData {
    pub provider: String,
    pub parameters: String,
    pub owner: String,
    pub timestamp_s: u64,
    #[serde(default)]
    pub context: String,
    pub identifier: String,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessInfo {
    pub id: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReclaimProof {
    #[serde(default)]
    pub identifier: Option<String>,
    pub claim_data: ClaimData,
    pub signatures: Vec<String>,
    #[serde(default)]
    pub witnesses: Vec<WitnessInfo>,
    #[serde(default)]
    pub extracted_parameter_values: Value,
    #[serde(default)]
    pub public_data: Option<Value>,
}

impl ReclaimProof {
    pub fn from_value(value: Value) -> Result<Self, ProofError> {
        serde_json::from_value(value).map_err(|e| ProofError::Malformed(e.to_string()))
    }
}

impl ClaimData {
    /// Identifier derived from the claim's content.
    pub fn computed_identifier(&self) -> Result<String, ProofError> {
        let context = canonical_context(&self.context)?;
        let preimage = format!("{}\n{}\n{}", self.provider, self.parameters, context);
        Ok(format!("0x{}", alloy::hex::encode(keccak256(preimage.as_bytes()))))
    }

    /// Message the witnesses sign.
    pub fn signed_message(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}",
            self.identifier.to_lowercase(),
            self.owner.to_lowercase(),
            self.timestamp_s,
            self.epoch
        )
    }
}

fn canonical_context(context: &str) -> Result<String, ProofError> {
    if context.is_empty() {
        return Ok(String::new());
    }
    let value: Value = serde_json::from_str(context)
        .map_err(|e| ProofError::Malformed(format!("claim context is not JSON: {e}")))?;
    let mut out = String::with_capacity(context.len());
    write_canonical(&value, &mut out);
    Ok(out)
}

/// Compact JSON with object keys in sorted order, independent of how
/// `serde_json` maps are ordered in this build.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Verifies proofs against a fixed set of trusted witnesses.
#[derive(Debug, Clone)]
pub struct ReclaimVerifier {
    witnesses: HashSet<Address>,
    min_witnesses: usize,
}

impl ReclaimVerifier {
    pub fn new(witnesses: impl IntoIterator<Item = Address>, min_witnesses: usize) -> Self {
        Self {
            witnesses: witnesses.into_iter().collect(),
            min_witnesses: min_witnesses.max(1),
        }
    }

    pub fn from_config(config: &ReclaimConfig) -> Self {
        Self::new(config.witnesses.iter().copied(), config.min_witnesses)
    }

    /// Synchronous core of [`ProofVerifier::verify_correctness`].
    pub fn check(&self, proof: &ReclaimProof) -> Result<bool, ProofError> {
        if self.witnesses.is_empty() {
            return Err(ProofError::NoTrustedWitnesses);
        }

        let claim = &proof.claim_data;
        let expected = claim.computed_identifier()?;
        if !claim.identifier.eq_ignore_ascii_case(&expected) {
            debug!(claimed = %claim.identifier, %expected, "Claim identifier mismatch");
            return Ok(false);
        }
        if let Some(top) = &proof.identifier {
            if !top.eq_ignore_ascii_case(&expected) {
                debug!(claimed = %top, %expected, "Proof identifier mismatch");
                return Ok(false);
            }
        }

        if proof.signatures.len() < self.min_witnesses {
            debug!(
                signatures = proof.signatures.len(),
                required = self.min_witnesses,
                "Not enough witness signatures"
            );
            return Ok(false);
        }

        let message = claim.signed_message();
        let mut signers = HashSet::new();
        for raw in &proof.signatures {
            let Some(signer) = recover_signer(raw, &message) else {
                return Ok(false);
            };
            if !self.witnesses.contains(&signer) {
                warn!(%signer, "Proof signed by untrusted witness");
                return Ok(false);
            }
            if !signers.insert(signer) {
                warn!(%signer, "Duplicate witness signature");
                return Ok(false);
            }
        }

        Ok(true)
    }
}

fn recover_signer(signature_hex: &str, message: &str) -> Option<Address> {
    let bytes = alloy::hex::decode(signature_hex.trim()).ok()?;
    let signature = Signature::from_raw(&bytes).ok()?;
    signature.recover_address_from_msg(message.as_bytes()).ok()
}

#[async_trait]
impl ProofVerifier for ReclaimVerifier {
    async fn verify_correctness(&self, proof: &ReclaimProof) -> Result<bool, ProofError> {
        self.check(proof)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_proof_from_trusted_witness() {
        let witness = witness(1);
        let verifier = ReclaimVerifier::new([witness.address()], 1);
        assert!(verifier.check(&signed_proof(&[&witness])).unwrap());
    }

    #[test]
    fn context_is_hashed_in_canonical_form() {
        let canonical = claim("0x2a0f2bd6a5c8d9b4c2e0c36e52c4b7e1e2c8b9d1");
        let mut reordered = canonical.clone();
        reordered.context =
            r#"{ "providerHash": "0x01", "extractedParameters": { "earnings": "4200" } }"#.to_string();
        assert_eq!(
            reordered.computed_identifier().unwrap(),
            canonical.computed_identifier().unwrap()
        );

        let witness = witness(1);
        let verifier = ReclaimVerifier::new([witness.address()], 1);
        reordered.identifier = reordered.computed_identifier().unwrap();
        let mut proof = signed_proof(&[&witness]);
        proof.signatures = vec![sign(&reordered, &witness)];
        proof.claim_data = reordered;
        assert!(verifier.check(&proof).unwrap());
    }

    #[test]
    fn empty_context_hashes_as_empty_string() {
        let mut claim = claim("0xabc");
        claim.context = String::new();
        let expected = format!(
            "0x{}",
            alloy::hex::encode(keccak256(format!("{}\n{}\n", claim.provider, claim.parameters)))
        );
        assert_eq!(claim.computed_identifier().unwrap(), expected);
    }

    #[test]
    fn non_json_context_is_malformed() {
        let witness = witness(1);
        let verifier = ReclaimVerifier::new([witness.address()], 1);
        let mut proof = signed_proof(&[&witness]);
        proof.claim_data.context = "not json".to_string();
        let err = verifier.check(&proof).unwrap_err();
        assert!(matches!(err, ProofError::Malformed(ref m) if m.contains("context")));
    }

    #[test]
    fn rejects_untrusted_witness() {
        let trusted = witness(1);
        let rogue = witness(2);
        let verifier = ReclaimVerifier::new([trusted.address()], 1);
        assert!(!verifier.check(&signed_proof(&[&rogue])).unwrap());
    }

    #[test]
    fn rejects_tampered_claim() {
        let witness = witness(1);
        let verifier = ReclaimVerifier::new([witness.address()], 1);

        let mut proof = signed_proof(&[&witness]);
        proof.claim_data.owner = "0x0000000000000000000000000000000000000bad".to_string();
        assert!(!verifier.check(&proof).unwrap());

        let mut proof = signed_proof(&[&witness]);
        proof.claim_data.parameters.push(' ');
        assert!(!verifier.check(&proof).unwrap());
    }

    #[test]
    fn rejects_mismatched_top_level_identifier() {
        let witness = witness(1);
        let verifier = ReclaimVerifier::new([witness.address()], 1);
        let mut proof = signed_proof(&[&witness]);
        proof.identifier = Some(format!("0x{}", "00".repeat(32)));
        assert!(!verifier.check(&proof).unwrap());
    }

    #[test]
    fn duplicate_signatures_do_not_count_twice() {
        let a = witness(1);
        let b = witness(2);
        let verifier = ReclaimVerifier::new([a.address(), b.address()], 2);

        assert!(verifier.check(&signed_proof(&[&a, &b])).unwrap());
        assert!(!verifier.check(&signed_proof(&[&a, &a])).unwrap());
        assert!(!verifier.check(&signed_proof(&[&a])).unwrap());
    }

    #[test]
    fn garbage_signature_is_invalid_not_an_error() {
        let witness = witness(1);
        let verifier = ReclaimVerifier::new([witness.address()], 1);
        let mut proof = signed_proof(&[&witness]);
        proof.signatures = vec!["0xdeadbeef".to_string()];
        assert!(!verifier.check(&proof).unwrap());
    }

    #[test]
    fn no_witnesses_is_a_configuration_error() {
        let witness = witness(1);
        let verifier = ReclaimVerifier::new(Vec::<Address>::new(), 1);
        let err = verifier.check(&signed_proof(&[&witness])).unwrap_err();
        assert!(matches!(err, ProofError::NoTrustedWitnesses));
    }

    #[test]
    fn parses_sdk_shaped_json() {
        let witness = witness(1);
        let proof = signed_proof(&[&witness]);
        let value = serde_json::to_value(&proof).unwrap();
        assert!(value["claimData"]["timestampS"].is_u64());
        assert_eq!(value["extractedParameterValues"]["earnings"], "4200");

        let parsed = ReclaimProof::from_value(value).unwrap();
        assert_eq!(parsed, proof);

        let err = ReclaimProof::from_value(json!({ "signatures": [] })).unwrap_err();
        assert!(err.to_string().starts_with("Malformed proof"));
    }
}
