// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session gating for the EqualFi server, backed by Clerk.
//!
//! ## Auth Flow
//!
//! 1. The web app signs the user in with Clerk (`/authn`)
//! 2. Requests carry the Clerk session JWT as a bearer token or the
//!    `__session` cookie
//! 3. The session gate:
//!    - verifies the JWT against the cached Clerk JWKS
//!    - lets public routes through regardless
//!    - redirects or rejects private routes without a session
//!    - attaches the [`Principal`] to request extensions
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS and cached with a TTL
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod jwks;
pub mod middleware;
pub mod session;

pub use claims::{Principal, SessionClaims};
pub use error::AuthError;
pub use jwks::JwksCache;
pub use session::{ClerkSessions, SessionAuthenticator};
