use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

use crate::{config::AppConfig, error::ApiError, models::LoginRequest};

/// Account
///
/// A known login identity. The role is stored per account and copied into the token
/// claims on successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// AccountDirectory
///
/// Lookup of accounts by email. The verifier, token validator and gate never depend on
/// where accounts come from, only on this contract.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find(&self, email: &str) -> Option<Account>;
}

/// StaticAccounts
///
/// Fixed set of accounts built at startup. Email matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct StaticAccounts {
    accounts: HashMap<String, Account>,
}

impl StaticAccounts {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.email.clone(), account))
                .collect(),
        }
    }

    /// The single account described by configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new([Account {
            email: config.account_email.clone(),
            password: config.account_password.clone(),
            role: config.account_role.clone(),
        }])
    }
}

#[async_trait]
impl AccountDirectory for StaticAccounts {
    async fn find(&self, email: &str) -> Option<Account> {
        self.accounts.get(email).cloned()
    }
}

/// Authorized
///
/// Successful verification outcome: the identity and role to embed in a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub subject: String,
    pub role: String,
}

/// CredentialVerifier
///
/// Decides whether a login request matches a known account.
#[derive(Clone)]
pub struct CredentialVerifier {
    directory: Arc<dyn AccountDirectory>,
}

impl CredentialVerifier {
    pub fn new(directory: Arc<dyn AccountDirectory>) -> Self {
        Self { directory }
    }

    /// verify
    ///
    /// Empty email or password is a `BadRequest`; an unknown email or wrong password is
    /// `Unauthorized`. No lockout or rate limiting.
    pub async fn verify(&self, request: &LoginRequest) -> Result<Authorized, ApiError> {
        if request.email.is_empty() || request.password.is_empty() {
            return Err(ApiError::BadRequest(
                "Email and Password are required".to_string(),
            ));
        }

        match self.directory.find(&request.email).await {
            Some(account) if account.password == request.password => Ok(Authorized {
                subject: account.email,
                role: account.role,
            }),
            _ => {
                tracing::warn!(email = %request.email, "login rejected: bad credentials");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
