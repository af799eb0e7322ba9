// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EqualFi Server - gig-worker credit backend
//!
//! Backs the EqualFi web application: a session-gated HTTP service that
//! forwards allow-listed key/value operations to an on-chain database
//! contract and verifies Reclaim proofs of income.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session gating (Clerk JWT)
//! - `config` - Environment configuration
//! - `ledger` - Database contract clients (sentinel and in-memory)
//! - `proof` - Reclaim proof verification
//! - `wallet` - Browser wallet connection state machine

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod proof;
pub mod state;
pub mod wallet;
