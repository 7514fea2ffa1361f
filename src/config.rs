use std::env;

use thiserror::Error;

/// Default signing secret used only by `AppConfig::default()` for test scaffolding.
const TEST_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// immutable afterwards; handlers pull it out of the unified `AppState` via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the log output format.
    pub env: Env,
    // Symmetric secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Socket address the HTTP listener binds to.
    pub bind_addr: String,
    // Lifetime of issued tokens, in hours.
    pub token_ttl_hours: i64,
    // The single role the authorization gate admits to the record routes.
    pub required_role: String,
    // The account seeded into the credential directory.
    pub account_email: String,
    pub account_password: String,
    pub account_role: String,
    // Optional Postgres connection string for the persistence sink.
    pub database_url: Option<String>,
}

/// Env
///
/// Defines the runtime context: human-readable logs locally, JSON logs in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// ConfigError
///
/// Startup configuration failures. The binary refuses to start on any of these.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Default for AppConfig {
    /// Deterministic configuration for tests; never reads the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: TEST_JWT_SECRET.to_string(),
            bind_addr: "127.0.0.1:8080".to_string(),
            token_ttl_hours: 72,
            required_role: "admin".to_string(),
            account_email: "test@example.com".to_string(),
            account_password: "1234".to_string(),
            account_role: "admin".to_string(),
            database_url: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from process environment. A missing or empty `JWT_SECRET`
    /// is an error in every environment: tokens signed with an empty key are forgeable.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }

        let token_ttl_hours = match env::var("TOKEN_TTL_HOURS") {
            Ok(raw) => parse_ttl(&raw)?,
            Err(_) => 72,
        };

        let required_role = non_empty_or("REQUIRED_ROLE", "admin")?;

        Ok(Self {
            env,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            token_ttl_hours,
            account_role: non_empty_or("ACCOUNT_ROLE", &required_role)?,
            required_role,
            account_email: non_empty_or("ACCOUNT_EMAIL", "test@example.com")?,
            account_password: non_empty_or("ACCOUNT_PASSWORD", "1234")?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
        })
    }
}

fn non_empty_or(name: &'static str, fallback: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
        Ok(value) => Ok(value),
        Err(_) => Ok(fallback.to_string()),
    }
}

fn parse_ttl(raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(hours) if hours > 0 => Ok(hours),
        _ => Err(ConfigError::Invalid {
            name: "TOKEN_TTL_HOURS",
            value: raw.to_string(),
        }),
    }
}
