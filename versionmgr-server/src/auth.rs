use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;
use tracing::warn;

use crate::error::ApiError;

/// Shared-secret bearer check guarding the mutating routes.
#[derive(Clone, Default)]
pub struct RegistrationAuth {
    token: Option<Arc<str>>,
}

impl RegistrationAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(Arc::from),
        }
    }

    /// Whether a token is configured. Without one every request passes.
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let Some(expected) = &self.token else {
            return Ok(());
        };

        let supplied = extract_bearer(headers).ok_or(AuthError::MissingAuthorization)?;
        if constant_time_eq(supplied.as_bytes(), expected.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingAuthorization,
    #[error("invalid registration token")]
    InvalidToken,
}

pub async fn require_token(
    State(auth): State<RegistrationAuth>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(err) = auth.check(request.headers()) {
        warn!(path = %request.uri().path(), %err, "registration auth rejected");
        return Err(ApiError::unauthorized(err.to_string()));
    }
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Compares without short-circuiting on the first differing byte. Only the
/// length is observable.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header"),
        );
        headers
    }

    #[test]
    fn disabled_auth_accepts_everything() {
        let auth = RegistrationAuth::new(None);
        assert!(!auth.is_enabled());
        assert_eq!(auth.check(&HeaderMap::new()), Ok(()));
    }

    #[test]
    fn matching_token_passes() {
        let auth = RegistrationAuth::new(Some("s3cret".into()));
        assert_eq!(auth.check(&headers("Bearer s3cret")), Ok(()));
    }

    #[test]
    fn wrong_or_missing_token_fails() {
        let auth = RegistrationAuth::new(Some("s3cret".into()));
        assert_eq!(
            auth.check(&HeaderMap::new()),
            Err(AuthError::MissingAuthorization)
        );
        assert_eq!(
            auth.check(&headers("Bearer s3creT")),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            auth.check(&headers("Basic s3cret")),
            Err(AuthError::MissingAuthorization)
        );
    }

    #[test]
    fn constant_time_eq_compares_contents() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
