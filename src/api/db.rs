// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Database gateway: `POST /api/db/{method}`.
//!
//! The path segment is matched against the closed [`DbMethod`] allow-list
//! before anything else happens, so unlisted names never reach the ledger.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::{
    auth::Principal,
    error::ApiError,
    ledger::{DbMethod, DbOperation, LedgerError},
    models::{ErrorResponse, GatewayRequest, GatewayResponse},
    state::AppState,
};

pub const METHOD_NOT_MAPPED: &str = "Method mapping not implemented";

/// Empty bodies are treated as `{}`.
fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))
}

fn ledger_failure(method: DbMethod, err: LedgerError) -> ApiError {
    error!(%method, error = %err, "Database method failed");
    ApiError::internal(err.to_string())
}

#[utoipa::path(
    post,
    path = "/api/db/{method}",
    params(
        ("method" = String, Path, description = "Allow-listed database method, e.g. `create_table`")
    ),
    request_body = GatewayRequest,
    tag = "Database",
    responses(
        (status = 200, description = "Contract call result", body = GatewayResponse),
        (status = 400, description = "Invalid arguments or method not exposed by the backend", body = ErrorResponse),
        (status = 401, description = "No valid session"),
        (status = 500, description = "Missing credentials or contract failure", body = ErrorResponse),
        (status = 501, description = "Method is not on the allow-list", body = ErrorResponse)
    )
)]
pub async fn call_method(
    State(state): State<AppState>,
    Path(method): Path<String>,
    principal: Option<Extension<Principal>>,
    body: Bytes,
) -> Result<Json<GatewayResponse>, ApiError> {
    let Ok(db_method) = method.parse::<DbMethod>() else {
        warn!(%method, "Rejected unmapped database method");
        return Err(ApiError::not_implemented(METHOD_NOT_MAPPED));
    };

    let body = parse_body(&body)?;
    let op = DbOperation::from_body(db_method, body)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let client = state
        .ledger
        .client()
        .await
        .map_err(|e| ledger_failure(db_method, e))?;

    if !client.supports(db_method) {
        warn!(%method, backend = client.backend(), "Database method not exposed by backend");
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Method '{method}' not found"),
        ));
    }

    let user = principal.map(|Extension(p)| p.user_id);
    info!(%db_method, backend = client.backend(), user = ?user, "Calling database method");
    let result = client
        .execute(&op)
        .await
        .map_err(|e| ledger_failure(db_method, e))?;

    Ok(Json(GatewayResponse {
        success: true,
        result,
    }))
}
