use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod sink;

// Routing segregated by access level (public, records).
pub mod routes;
use routes::{public, records};

// --- Public Re-exports ---

pub use auth::TokenIssuer;
pub use config::AppConfig;
pub use credentials::{CredentialVerifier, StaticAccounts};
pub use error::ApiError;
pub use repository::{InMemoryRepository, RepositoryState};
pub use sink::{NoopSink, SinkState};

/// ApiDoc
///
/// OpenAPI document for every endpoint and schema, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::list_records, handlers::get_record,
        handlers::create_record, handlers::update_record, handlers::delete_record
    ),
    components(
        schemas(
            models::Record, models::RecordInput, models::LoginRequest,
            models::LoginResponse, models::DeleteResponse, error::ErrorBody,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "records-api", description = "Token-guarded record management API")
    )
)]
struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Unified, cheaply cloneable container for every service the handlers and middleware
/// need. Components are injected as handles; nothing reaches into global state.
#[derive(Clone)]
pub struct AppState {
    /// Record store.
    pub repo: RepositoryState,
    /// Optional durable-storage collaborator fed by the create handler.
    pub sink: SinkState,
    /// Login credential checks.
    pub credentials: CredentialVerifier,
    /// Token signing and validation, sharing one secret.
    pub tokens: TokenIssuer,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires the credential verifier and token issuer from `config`.
    pub fn new(config: AppConfig, repo: RepositoryState, sink: SinkState) -> Self {
        let credentials =
            CredentialVerifier::new(std::sync::Arc::new(StaticAccounts::from_config(&config)));
        Self {
            repo,
            sink,
            credentials,
            tokens: TokenIssuer::from_config(&config),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(app_state: &AppState) -> TokenIssuer {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, the two-stage access-control pipeline and the
/// observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Record routes: the last `route_layer` runs first, so the token validator
        // always precedes the authorization gate.
        .merge(
            records::record_routes()
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth::require_role,
                ))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth::auth_middleware,
                )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by `SetRequestIdLayer`
/// so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
