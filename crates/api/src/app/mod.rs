//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, token service, password hasher, pipeline services
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `extract.rs`: extractors with envelope-style rejections
//! - `errors.rs`: the error envelope

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config)?;
    let auth_state = middleware::AuthState {
        resolver: services.resolver.clone(),
    };

    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::principal_middleware,
    ));
    let api = routes::public_router()
        .merge(protected)
        .layer(Extension(Arc::new(services)));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(errors::error_envelope))))
}
