//! Request authentication and the input gate
//!
//! [`AuthGuard`] turns the session cookie into an [`Identity`]. The
//! validation helpers reject malformed credentials before any statement is
//! issued.

use std::time::Duration;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};

use crate::config::ServerConfig;
use crate::error::{GatewayError, InvalidInput};
use crate::session::{Identity, SessionCodec};

/// Account names: 5-15 of `[A-Za-z0-9_]`, same rule as the game client.
pub fn is_valid_account(account: &str) -> bool {
    (5..=15).contains(&account.len())
        && account.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Passwords: 6-15 of `[A-Za-z0-9]`.
pub fn is_valid_password(password: &str) -> bool {
    (6..=15).contains(&password.len()) && password.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn validate_login(account: &str, password: &str) -> Result<(), InvalidInput> {
    if account.is_empty() || password.is_empty() {
        return Err(InvalidInput::MissingCredentials);
    }
    if !is_valid_account(account) {
        return Err(InvalidInput::Account);
    }
    if !is_valid_password(password) {
        return Err(InvalidInput::Password);
    }
    Ok(())
}

pub fn validate_password_change(old_password: &str, new_password: &str) -> Result<(), InvalidInput> {
    if old_password.is_empty() || new_password.is_empty() {
        return Err(InvalidInput::MissingPasswords);
    }
    if !is_valid_password(new_password) {
        return Err(InvalidInput::NewPassword);
    }
    // Stored passwords follow the same rule, so a malformed old password can never match.
    if !is_valid_password(old_password) {
        return Err(InvalidInput::Password);
    }
    Ok(())
}

/// Reads the session cookie and yields the caller's identity.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    codec: SessionCodec,
    cookie_name: String,
    max_age: Duration,
}

impl AuthGuard {
    pub fn new(cookie_name: impl Into<String>, max_age: Duration) -> Self {
        Self {
            codec: SessionCodec::new(),
            cookie_name: cookie_name.into(),
            max_age,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.session_cookie.clone(), config.session_max_age())
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Identity carried by the request's session cookie.
    pub fn current_identity(&self, jar: &CookieJar) -> Result<Identity, GatewayError> {
        let token = jar.get(&self.cookie_name).map(|c| c.value());
        self.current_identity_at(token, Utc::now())
    }

    /// Decode `token` and check it has not outlived the session lifetime at `now`.
    pub fn current_identity_at(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Identity, GatewayError> {
        let token = token.ok_or(GatewayError::Unauthenticated)?;
        let identity = self.codec.decode(token).ok_or_else(|| {
            tracing::debug!("[auth] [bad_token]");
            GatewayError::Unauthenticated
        })?;

        let age = now.signed_duration_since(identity.issued_at());
        let expired = match age.to_std() {
            Ok(age) => age > self.max_age,
            // Issued in the future: clock skew, accept.
            Err(_) => false,
        };
        if expired {
            tracing::debug!("[auth] [expired] account={}", identity.account());
            return Err(GatewayError::Unauthenticated);
        }

        Ok(identity)
    }
}

/// Extractor for handlers that require a logged-in caller.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    AuthGuard: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = AuthGuard::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        guard.current_identity(&jar).map(CurrentIdentity)
    }
}
