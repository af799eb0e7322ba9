// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the HTTP API. All types derive `ToSchema`
//! for the OpenAPI document served at `/api-doc/openapi.json`.
//!
//! ## Envelopes
//!
//! Every successful call answers `{ "success": true, ... }`. Failures answer
//! [`ErrorResponse`], where `success` is omitted only for the gateway's two
//! fixed-message rejections.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::proof::ReclaimProvider;

// =============================================================================
// Shared
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
}

/// Public root route.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
}

// =============================================================================
// Database Gateway
// =============================================================================

/// Union of the body fields read by the database methods.
///
/// Which fields are required depends on the method in the path:
///
/// | method | fields |
/// |---|---|
/// | `create_table`, `drop_table`, `table_size` | `table_name` or `table` |
/// | `list_tables` | none |
/// | `insert`, `update` | `table`, `key`, `field`, `value` |
/// | `get_value`, `remove_field` | `table`, `key`, `field` |
/// | `remove_record`, `get_all_fields` | `table`, `key` |
/// | `insert_record` | `table`, `key`, `fields` (object or `[[name, value], ...]`) |
/// | `insert_records` | `table`, `records` (array of `{ key, fields }`) |
/// | `get_fields` | `table`, `key`, `fields` (array of names) |
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GatewayRequest {
    pub table_name: Option<String>,
    pub table: Option<String>,
    /// Record key, usually the user's wallet address.
    pub key: Option<String>,
    pub field: Option<String>,
    pub value: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub fields: Option<Value>,
    #[schema(value_type = Option<Vec<Object>>)]
    pub records: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub result: Value,
}

// =============================================================================
// Reclaim
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyProofRequest {
    /// Proof object as produced by the Reclaim SDK.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub proof: Value,
    /// Provider the proof was generated for (e.g. `UPWORK`).
    #[serde(default)]
    pub provider_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyProofResponse {
    pub success: bool,
    /// `extractedParameterValues` of the proof, unmodified.
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    pub providers: Vec<ReclaimProvider>,
}
