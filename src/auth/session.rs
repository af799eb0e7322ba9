// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clerk session verification.
//!
//! The web app sends its Clerk session either as `Authorization: Bearer <jwt>`
//! (API calls from client code) or as the `__session` cookie (same-site page
//! navigation). Both carry the same short-lived session JWT.
//!
//! ## Modes
//!
//! - **Production** (`CLERK_JWKS_URL` set): signature, expiry, issuer and
//!   audience are verified against the Clerk JWKS.
//! - **Development** (no JWKS URL): the token is decoded without signature
//!   verification and only its expiry is checked.

use async_trait::async_trait;
use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use jsonwebtoken::{decode, decode_header, Validation};
use tracing::warn;

use super::{AuthError, JwksCache, Principal, SessionClaims};
use crate::config::SessionConfig;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Name of the cookie Clerk stores the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Resolves the request's session to a principal.
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError>;

    /// JWKS cache, when this authenticator verifies signatures.
    fn jwks(&self) -> Option<&JwksCache> {
        None
    }
}

/// Pull the session token from the bearer header or the session cookie.
///
/// A malformed Authorization header is an error even if a cookie is present.
pub fn session_token(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;
        return Ok(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
        .ok_or(AuthError::MissingSession)
}

pub struct ClerkSessions {
    jwks: Option<JwksCache>,
    issuer: Option<String>,
    audience: Option<String>,
}

impl ClerkSessions {
    pub fn from_config(config: &SessionConfig) -> Result<Self, AuthError> {
        let jwks = config.jwks_url.as_deref().map(JwksCache::new).transpose()?;
        if jwks.is_none() {
            warn!("CLERK_JWKS_URL not set: session tokens are NOT signature-verified (development mode)");
        }
        Ok(Self {
            jwks,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Development-mode authenticator that skips signature checks.
    pub fn development() -> Self {
        Self {
            jwks: None,
            issuer: None,
            audience: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.jwks.is_some()
    }

    async fn verify(&self, token: &str, jwks: &JwksCache) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let (decoding_key, algorithm) = jwks.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<SessionClaims>(token, &decoding_key, &validation)
            .map_err(|e| AuthError::from_jwt(&e))?;
        Ok(data.claims.into())
    }

    fn decode_unverified(&self, token: &str) -> Result<Principal, AuthError> {
        let data = jsonwebtoken::dangerous::insecure_decode::<SessionClaims>(token)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims = data.claims;

        let now = chrono::Utc::now().timestamp();
        if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
            return Err(AuthError::TokenExpired);
        }
        if let Some(issuer) = &self.issuer {
            if &claims.iss != issuer {
                return Err(AuthError::InvalidIssuer);
            }
        }
        Ok(claims.into())
    }
}

#[async_trait]
impl SessionAuthenticator for ClerkSessions {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = session_token(headers)?;
        match &self.jwks {
            Some(jwks) => self.verify(&token, jwks).await,
            None => self.decode_unverified(&token),
        }
    }

    fn jwks(&self) -> Option<&JwksCache> {
        self.jwks.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    /// Unsigned session JWT accepted in development mode.
    pub fn unsigned_token(user_id: &str, exp: i64) -> String {
        let header = r#"{"alg":"RS256","typ":"JWT"}"#;
        let claims = format!(
            r#"{{"sub":"{user_id}","iat":1609459200,"exp":{exp},"iss":"https://clerk.test","sid":"sess_123"}}"#
        );
        format!(
            "{}.{}.fake_signature",
            URL_SAFE_NO_PAD.encode(header.as_bytes()),
            URL_SAFE_NO_PAD.encode(claims.as_bytes())
        )
    }
}
