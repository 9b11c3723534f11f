//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::constants::{API_PREFIX, OPENAPI_JSON_PATH};
use crate::handlers::{health, organizations, subscriber_groups};
use crate::middleware::client_ip_middleware;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, patch},
    Json, Router,
};
use ospm_db::Store;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Request bodies are small JSON documents
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes<S: Store>(state: AppState<S>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(&state.cors_origins)?;
    let trusted_proxy_count = state.trusted_proxy_count;
    let state = Arc::new(state);

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = Router::new()
        .nest(API_PREFIX, api_routes::<S>())
        .route("/health", get(health::health_check::<S>))
        .route(OPENAPI_JSON_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_JSON_PATH).path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            trusted_proxy_count,
            client_ip_middleware,
        ))
        .with_state(state);

    Ok(app)
}

/// Versioned resource routes, nested under [`API_PREFIX`]
fn api_routes<S: Store>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route(
            "/organizations",
            get(organizations::list_organizations::<S>)
                .post(organizations::create_organization::<S>)
                .delete(organizations::delete_organization::<S>),
        )
        .route(
            "/organizations/profile",
            get(organizations::get_organization_profile::<S>),
        )
        .route(
            "/organizations/recover",
            patch(organizations::recover_organization::<S>),
        )
        .route(
            "/organizations/{organization_id}/subscriber-groups",
            get(subscriber_groups::list_subscriber_groups::<S>)
                .post(subscriber_groups::create_subscriber_group::<S>),
        )
        .route(
            "/subscriber-groups/{id}",
            get(subscriber_groups::get_subscriber_group::<S>)
                .patch(subscriber_groups::update_subscriber_group::<S>)
                .delete(subscriber_groups::delete_subscriber_group::<S>),
        )
}

/// Setup CORS configuration
fn setup_cors(cors_origins: &[String]) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
