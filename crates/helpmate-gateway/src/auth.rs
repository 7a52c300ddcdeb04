// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller identity from a signed cookie.
//!
//! The auth service issues `<cookie_name>=<user_id>.<hex mac>`, where the MAC
//! is HMAC-SHA256 over the user id with the shared secret. When no secret is
//! configured, every request is rejected (fail-closed).

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Cookie, HeaderMapExt};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use helpmate_core::{HelpmateError, UserId};

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Authentication settings for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    pub cookie_name: String,
    /// Shared HMAC secret. `None` disables authentication entirely.
    pub secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// The authenticated user of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(ApiError(HelpmateError::Unauthorized))
    }
}

fn mac_for(secret: &str, user_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(user_id.as_bytes());
    Some(mac)
}

/// Produces the cookie value the auth service would issue for `user_id`.
pub fn sign_caller_cookie(secret: &str, user_id: &UserId) -> String {
    let signature = mac_for(secret, user_id.as_str())
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{}.{signature}", user_id.as_str())
}

/// Returns the user id of a correctly signed cookie value.
///
/// The signature follows the last `.`, so user ids may contain dots.
pub fn verify_caller_cookie(secret: &str, value: &str) -> Option<UserId> {
    let (user_id, signature) = value.rsplit_once('.')?;
    if user_id.is_empty() {
        return None;
    }
    let signature = hex::decode(signature).ok()?;
    mac_for(secret, user_id)?.verify_slice(&signature).ok()?;
    Some(UserId::from(user_id))
}

/// Middleware that resolves the [`Caller`] or answers 401.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(secret) = auth.secret.as_deref() else {
        tracing::error!("gateway has no auth secret configured -- rejecting request");
        return Err(ApiError(HelpmateError::Unauthorized));
    };

    let caller = request
        .headers()
        .typed_get::<Cookie>()
        .and_then(|cookies| {
            cookies
                .get(&auth.cookie_name)
                .and_then(|value| verify_caller_cookie(secret, value))
        });

    match caller {
        Some(user_id) => {
            request.extensions_mut().insert(Caller(user_id));
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("request without a valid caller cookie");
            Err(ApiError(HelpmateError::Unauthorized))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn signed_cookie_verifies() {
        let value = sign_caller_cookie(SECRET, &UserId::from("alice"));
        assert_eq!(
            verify_caller_cookie(SECRET, &value),
            Some(UserId::from("alice"))
        );
    }

    #[test]
    fn dotted_user_ids_survive() {
        let user = UserId::from("alice.smith");
        let value = sign_caller_cookie(SECRET, &user);
        assert_eq!(verify_caller_cookie(SECRET, &value), Some(user));
    }

    #[test]
    fn tampering_is_rejected() {
        let value = sign_caller_cookie(SECRET, &UserId::from("alice"));
        let forged = value.replacen("alice", "bob", 1);
        assert_eq!(verify_caller_cookie(SECRET, &forged), None);
        assert_eq!(verify_caller_cookie("another-secret-another-secret-xx", &value), None);
        assert_eq!(verify_caller_cookie(SECRET, "alice"), None);
        assert_eq!(verify_caller_cookie(SECRET, "alice.zz"), None);
        assert_eq!(verify_caller_cookie(SECRET, ".abcd"), None);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AuthConfig {
            cookie_name: "helpmate_session".into(),
            secret: Some(SECRET.into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains(SECRET));
        assert!(debug.contains("[redacted]"));
    }
}
