//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend selection and the inventory engine
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, InMemoryHandles};

/// Build the full HTTP router from configuration (used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> Result<Router, sqlx::Error> {
    let services = services::build_services(config).await?;
    Ok(router(services, &config.jwt_secret))
}

/// Router over already-built services.
pub fn router(services: AppServices, jwt_secret: &str) -> Router {
    let jwt = Arc::new(stockroom_auth::Hs256JwtValidator::new(
        jwt_secret.as_bytes().to_vec(),
    ));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require a valid bearer token.
    let protected = routes::router()
        .layer(Extension(Arc::new(services)))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
