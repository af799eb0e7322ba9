// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Income data sources a user can prove against.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReclaimProvider {
    /// Key the web app sends as `providerKey`.
    pub key: &'static str,
    /// Provider id registered in the Reclaim dashboard.
    pub provider_id: &'static str,
    pub label: &'static str,
    pub context: &'static str,
}

pub const PROVIDERS: &[ReclaimProvider] = &[
    ReclaimProvider {
        key: "UPWORK",
        provider_id: "61bddce0-fb71-45fc-8309-e2f447c12d5a",
        label: "Verify Upwork Income",
        context: "Gig Economy Verification",
    },
    ReclaimProvider {
        key: "UBER",
        provider_id: "uber-driver",
        label: "Verify Uber Earnings",
        context: "Gig Economy Verification",
    },
];

/// Look a provider up by the key the web app sends, ignoring case.
pub fn find(key: &str) -> Option<&'static ReclaimProvider> {
    PROVIDERS.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}
