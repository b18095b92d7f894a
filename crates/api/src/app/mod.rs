//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: storage wiring and the operations handlers call
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping
//! - `errors.rs`: consistent `{"detail": …}` error responses

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};
use tower::ServiceBuilder;

use siphon_auth::TokenCodec;
use siphon_infra::Store;

use crate::config::Config;
use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &Config) -> anyhow::Result<Router> {
    let store = services::build_store(config).await?;
    Ok(build_app_with_store(store, &config.jwt_secret))
}

/// Assemble the router around an existing store. Tests use this to seed
/// records before the first request.
pub fn build_app_with_store(store: Arc<dyn Store>, jwt_secret: &str) -> Router {
    let codec = Arc::new(TokenCodec::new(jwt_secret.as_bytes()));
    let app_services = Arc::new(services::AppServices::new(store.clone(), codec.clone()));
    let auth_state = AuthState { codec, store };

    let protected = routes::protected_router().route_layer(
        axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .route("/customers", post(routes::customers::register_customer))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(app_services)))
}
