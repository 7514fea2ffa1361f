use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError};

/// Claims
///
/// Payload signed into every bearer token. Never mutated after issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the email of the account that logged in.
    pub sub: String,
    /// The account's role, checked by the authorization gate.
    pub role: String,
    /// Issued At (iat), seconds since the Unix epoch.
    pub iat: i64,
    /// Expiration Time (exp), seconds since the Unix epoch.
    pub exp: i64,
}

/// TokenIssuer
///
/// Signs and verifies HS256 tokens with the configured symmetric secret. The same
/// instance backs both `/login` and the token validator, so both sides always agree on
/// the key.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_hours)
    }

    /// Mints a token for `subject` expiring `ttl` from now.
    pub fn issue(&self, subject: &str, role: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(subject, role, Utc::now())
    }

    /// Mints a token as if issued at `issued_at`.
    pub fn issue_at(
        &self,
        subject: &str,
        role: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Verifies signature and expiry. Expiry is checked against the current clock on
    /// every call; nothing is cached.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// AuthUser
///
/// The resolved identity of a request whose bearer token passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub subject: String,
    pub role: String,
}

/// AuthUser Extractor Implementation
///
/// 1. Token Extraction: `Authorization: Bearer <token>`.
/// 2. Token Validation: signature and expiry through the shared `TokenIssuer`.
///
/// Rejection: `ApiError::Unauthorized` on any failure. The cause is logged only.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenIssuer: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenIssuer::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::debug!("missing bearer token");
                ApiError::Unauthorized
            })?;

        let claims = tokens.validate(token).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("token expired"),
                kind => tracing::debug!(?kind, "token rejected"),
            }
            ApiError::Unauthorized
        })?;

        Ok(AuthUser {
            subject: claims.sub,
            role: claims.role,
        })
    }
}

/// auth_middleware
///
/// Token validator stage. Runs the `AuthUser` extractor (rejecting with 401 before the
/// handler is reached) and stores the identity in the request extensions for the stages
/// that follow.
pub async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// require_role
///
/// Authorization gate. Must run after `auth_middleware`; if no identity is attached the
/// request is treated as unauthenticated rather than trusted.
pub async fn require_role(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let admitted = match request.extensions().get::<AuthUser>() {
        Some(user) if user.role == config.required_role => true,
        Some(user) => {
            tracing::warn!(subject = %user.subject, role = %user.role, "role not permitted");
            false
        }
        None => {
            tracing::warn!("authorization gate reached without an identity");
            false
        }
    };

    if !admitted {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}
