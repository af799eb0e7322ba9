// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{middleware::session_gate, Principal},
    models::{
        ErrorResponse, GatewayRequest, GatewayResponse, ProvidersResponse, ServiceInfo,
        VerifyProofRequest, VerifyProofResponse,
    },
    proof::ReclaimProvider,
    state::AppState,
};

pub mod db;
pub mod health;
pub mod reclaim;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/db/{method}", post(db::call_method))
        .route("/reclaim/verify", post(reclaim::verify_proof))
        .route("/reclaim/providers", get(reclaim::list_providers));

    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        db::call_method,
        reclaim::verify_proof,
        reclaim::list_providers,
        health::service_info,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            GatewayRequest,
            GatewayResponse,
            VerifyProofRequest,
            VerifyProofResponse,
            ProvidersResponse,
            ReclaimProvider,
            ErrorResponse,
            ServiceInfo,
            Principal,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Database", description = "Allow-listed key/value contract methods"),
        (name = "Reclaim", description = "Proof of income verification"),
        (name = "Health", description = "Service status")
    )
)]
struct ApiDoc;
