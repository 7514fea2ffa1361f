use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no bearer token: health checks and the login gateway that
/// issues tokens in the first place.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /login
        // Exchanges an email/password pair for a bearer token.
        .route("/login", post(handlers::login))
}
