// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    error::ApiError,
    models::{ErrorResponse, ProvidersResponse, VerifyProofRequest, VerifyProofResponse},
    proof::{providers, ProofError, ReclaimProof, PROVIDERS},
    state::AppState,
};

pub const MISSING_PROOF: &str = "Missing Proof or Provider Key";
pub const INVALID_PROOF: &str = "Invalid Proof Signature";

/// JavaScript-style truthiness of the submitted proof.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn proof_failure(err: ProofError) -> ApiError {
    match err {
        ProofError::Malformed(_) => ApiError::bad_request(err.to_string()),
        ProofError::NoTrustedWitnesses => {
            error!(error = %err, "Proof verification unavailable");
            ApiError::internal(err.to_string())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/reclaim/verify",
    request_body = VerifyProofRequest,
    tag = "Reclaim",
    responses(
        (status = 200, description = "Proof verified; extracted values returned", body = VerifyProofResponse),
        (status = 400, description = "Missing input, malformed proof or invalid signature", body = ErrorResponse),
        (status = 401, description = "No valid session"),
        (status = 500, description = "Verification could not run", body = ErrorResponse)
    )
)]
pub async fn verify_proof(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<VerifyProofResponse>, ApiError> {
    let request: VerifyProofRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?;

    let provider_key = request.provider_key.as_deref().unwrap_or_default();
    if provider_key.is_empty() || !is_present(&request.proof) {
        return Err(ApiError::bad_request(MISSING_PROOF));
    }

    info!(%provider_key, "Verifying Reclaim proof");
    if providers::find(provider_key).is_none() {
        warn!(%provider_key, "Proof submitted for unknown provider");
    }

    let proof = ReclaimProof::from_value(request.proof).map_err(proof_failure)?;
    let valid = state
        .proofs
        .verify_correctness(&proof)
        .await
        .map_err(proof_failure)?;

    if !valid {
        warn!(%provider_key, "Rejected proof with invalid signature");
        return Err(ApiError::bad_request(INVALID_PROOF));
    }

    info!(%provider_key, owner = %proof.claim_data.owner, "Proof verified");
    Ok(Json(VerifyProofResponse {
        success: true,
        data: proof.extracted_parameter_values,
    }))
}

/// Providers the web app may start a Reclaim session for.
#[utoipa::path(
    get,
    path = "/api/reclaim/providers",
    tag = "Reclaim",
    responses(
        (status = 200, description = "Application id and known providers", body = ProvidersResponse)
    )
)]
pub async fn list_providers(State(state): State<AppState>) -> (StatusCode, Json<ProvidersResponse>) {
    let response = ProvidersResponse {
        app_id: state.config.reclaim.app_id.clone(),
        providers: PROVIDERS.to_vec(),
    };
    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn proof_presence_follows_truthiness() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!(false)));
        assert!(is_present(&json!({})));
        assert!(is_present(&json!("proof")));
    }

    #[test]
    fn malformed_is_client_error_and_missing_witnesses_is_server_error() {
        let malformed = proof_failure(ProofError::Malformed("missing field `claimData`".into()));
        assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
        assert_eq!(malformed.message, "Malformed proof: missing field `claimData`");

        let unavailable = proof_failure(ProofError::NoTrustedWitnesses);
        assert_eq!(unavailable.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(unavailable.envelope);
    }
}
