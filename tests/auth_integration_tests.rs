use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use chrono::{Duration, Utc};
use records_api::{
    ApiError, AppConfig, AppState, InMemoryRepository, NoopSink, TokenIssuer, auth::AuthUser,
};
use std::sync::Arc;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn create_app_state() -> AppState {
    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(
        config,
        Arc::new(InMemoryRepository::seeded()),
        Arc::new(NoopSink),
    )
}

fn get_request_parts(authorization: Option<&str>) -> Parts {
    let mut builder = Request::builder()
        .method(Method::GET)
        .uri("/records".parse::<Uri>().unwrap());
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let state = create_app_state();
    let token = state.tokens.issue("test@example.com", "admin").unwrap();

    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));
    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(user.subject, "test@example.com");
    assert_eq!(user.role, "admin");
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let state = create_app_state();
    let mut parts = get_request_parts(None);

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_auth_failure_without_bearer_prefix() {
    let state = create_app_state();
    let token = state.tokens.issue("test@example.com", "admin").unwrap();

    for value in [token.clone(), format!("Basic {token}"), "Bearer ".to_string()] {
        let mut parts = get_request_parts(Some(&value));
        let result = AuthUser::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap_err(), ApiError::Unauthorized);
    }
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let state = create_app_state();
    let token = state
        .tokens
        .issue_at("test@example.com", "admin", Utc::now() - Duration::hours(73))
        .unwrap();

    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let state = create_app_state();
    let forged = TokenIssuer::new("some-other-secret", 72)
        .issue("test@example.com", "admin")
        .unwrap();

    let mut parts = get_request_parts(Some(&format!("Bearer {forged}")));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_validator_accepts_any_role() {
    // Role enforcement belongs to the gate, not the validator.
    let state = create_app_state();
    let token = state.tokens.issue("reader@example.com", "viewer").unwrap();

    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));
    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.role, "viewer");
}
