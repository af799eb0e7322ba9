// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session gate applied to the whole router.
//!
//! | Request | Session | Outcome |
//! |---------|---------|---------|
//! | public route | any | pass |
//! | `/authn*` | valid | redirect to `/dashboard` |
//! | `/api/*` | none/invalid | `401` with the auth error body |
//! | other private route | none/invalid | redirect to `/authn` |
//! | private route | valid | pass, principal in extensions |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::state::AppState;

pub const SIGN_IN_PATH: &str = "/authn";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Prefixes reachable without a session, besides the exact root `/`.
const PUBLIC_PREFIXES: &[&str] = &[SIGN_IN_PATH, "/health", "/docs", "/api-doc"];

/// Whether `path` may be served without a session.
pub fn is_public_route(path: &str) -> bool {
    path == "/"
        || PUBLIC_PREFIXES.iter().any(|prefix| {
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
}

fn is_sign_in_route(path: &str) -> bool {
    path.strip_prefix(SIGN_IN_PATH)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn is_api_route(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let session = state.sessions.authenticate(request.headers()).await;

    match session {
        Ok(principal) => {
            if is_sign_in_route(&path) {
                return Redirect::temporary(DASHBOARD_PATH).into_response();
            }
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(_) if is_public_route(&path) => next.run(request).await,
        Err(error) => {
            debug!(%path, %error, "Rejecting request without session");
            if is_api_route(&path) {
                error.into_response()
            } else {
                Redirect::temporary(SIGN_IN_PATH).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_route_matching() {
        assert!(is_public_route("/"));
        assert!(is_public_route("/authn"));
        assert!(is_public_route("/authn/sso-callback"));
        assert!(is_public_route("/health/live"));
        assert!(is_public_route("/docs/"));
        assert!(is_public_route("/api-doc/openapi.json"));

        assert!(!is_public_route("/authnx"));
        assert!(!is_public_route("/improve"));
        assert!(!is_public_route("/api/db/list_tables"));
        assert!(!is_public_route("/dashboard"));
    }

    #[test]
    fn api_and_sign_in_matching() {
        assert!(is_api_route("/api/reclaim/verify"));
        assert!(!is_api_route("/apis"));
        assert!(is_sign_in_route("/authn/sso-callback"));
        assert!(!is_sign_in_route("/"));
    }
}
