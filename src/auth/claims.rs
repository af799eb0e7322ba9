// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the authenticated principal.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by a Clerk session token.
///
/// Only the fields the gate reads are declared; `aud` is checked by
/// `jsonwebtoken` when an audience is configured.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionClaims {
    /// Subject (Clerk user ID)
    pub sub: String,
    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,
    /// Issuer (Clerk frontend API URL)
    #[serde(default)]
    pub iss: String,
    /// Clerk session ID
    #[serde(default)]
    pub sid: Option<String>,
}

/// The user a request is acting for.
///
/// Inserted into request extensions by the session gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Canonical user ID (Clerk `sub` claim)
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Token expiration (Unix timestamp)
    #[serde(skip)]
    pub expires_at: i64,
}

impl From<SessionClaims> for Principal {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            session_id: claims.sid,
            expires_at: claims.exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_from_claims() {
        let claims: SessionClaims = serde_json::from_str(
            r#"{"sub":"user_123","exp":1700003600,"iss":"https://clerk.example.com","sid":"sess_abc","azp":"http://localhost:3000"}"#,
        )
        .unwrap();
        let principal = Principal::from(claims);
        assert_eq!(principal.user_id, "user_123");
        assert_eq!(principal.session_id.as_deref(), Some("sess_abc"));
        assert_eq!(principal.expires_at, 1700003600);
    }

    #[test]
    fn serialization_hides_expiry() {
        let principal = Principal {
            user_id: "user_1".into(),
            session_id: None,
            expires_at: 42,
        };
        let json = serde_json::to_string(&principal).unwrap();
        assert_eq!(json, r#"{"user_id":"user_1"}"#);
    }
}
