//! Signed session tokens.
//!
//! Sessions are stateless: an HS256 JWT carries the account id, role and
//! display details. The same token is handed to API clients in the login
//! response and to browsers as an `HttpOnly` cookie.

use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::{Email, Role, UserId};

use crate::models::CurrentUser;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "bazaar_session";

/// Errors from issuing or verifying session tokens.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token expired")]
    Expired,
    #[error("invalid session token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("failed to sign session token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub sub: UserId,
    pub role: Role,
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// The account this token was issued to.
    #[must_use]
    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.sub,
            role: self.role,
            name: self.name.clone(),
            email: self.email.clone(),
            store_name: self.store_name.clone(),
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Signing and verification keys for session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    max_age: Duration,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("keys", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl SessionKeys {
    #[must_use]
    pub fn new(secret: &SecretString, max_age: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            max_age,
        }
    }

    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Sign a token for `user`, valid for the configured lifetime from now.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Signing` if encoding fails.
    pub fn issue(&self, user: &CurrentUser) -> Result<IssuedToken, SessionError> {
        self.issue_at(user, Utc::now())
    }

    /// Sign a token for `user` as if issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Signing` if encoding fails.
    pub fn issue_at(
        &self,
        user: &CurrentUser,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, SessionError> {
        let claims = SessionClaims {
            sub: user.id,
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
            store_name: user.store_name.clone(),
            iat: now.timestamp(),
            exp: (now + self.max_age).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(SessionError::Signing)?;

        Ok(IssuedToken { token, claims })
    }

    /// Check a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Expired` for expired tokens and
    /// `SessionError::Invalid` for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e),
            })
    }

    /// Cookie carrying `token` for the configured lifetime.
    #[must_use]
    pub fn session_cookie(&self, token: String, secure: bool) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(secure)
            .max_age(cookie::time::Duration::seconds(self.max_age.num_seconds()))
            .build()
    }
}

/// Cookie that clears the session cookie.
#[must_use]
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(cookie::time::Duration::ZERO)
        .build()
}
