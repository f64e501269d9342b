//! Authentication slot.
//!
//! The router runs its [`Authenticator`] on every matched request before
//! any middleware sees it, so hooks always find a resolved
//! [`Request::user`](crate::Request::user).

use std::collections::HashMap;
use std::fmt;

use http::header::AUTHORIZATION;
use http::request::Parts;

use crate::error::HttpError;

/// The identity attached to a request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum User {
    #[default]
    Anonymous,
    Authenticated { id: String },
}

impl User {
    pub fn authenticated(id: impl Into<String>) -> Self {
        Self::Authenticated { id: id.into() }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { id } => Some(id),
            Self::Anonymous => None,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Authenticated { id } => f.write_str(id),
        }
    }
}

/// Resolves the [`User`] for an incoming request.
///
/// Returning an error rejects the request before the middleware stack and
/// the view run.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, parts: &Parts) -> Result<User, HttpError>;
}

/// Treats every request as anonymous. The router's default.
pub struct Anonymous;

impl Authenticator for Anonymous {
    fn authenticate(&self, _parts: &Parts) -> Result<User, HttpError> {
        Ok(User::Anonymous)
    }
}

/// Static bearer-token table.
///
/// No `Authorization` header → anonymous. A known `Bearer` token → that
/// user. Anything else → `401 Unauthorized`.
///
/// ```rust
/// use viewhooks::auth::BearerTokens;
///
/// let auth = BearerTokens::new()
///     .token("s3cret", "alice")
///     .token("hunter2", "bob");
/// ```
#[derive(Default)]
pub struct BearerTokens {
    tokens: HashMap<String, String>,
}

impl BearerTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }
}

impl Authenticator for BearerTokens {
    fn authenticate(&self, parts: &Parts) -> Result<User, HttpError> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(User::Anonymous);
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| HttpError::unauthorized("malformed authorization header"))?;

        self.tokens
            .get(token)
            .map(|id| User::authenticated(id.clone()))
            .ok_or_else(|| HttpError::unauthorized("invalid token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = http::Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn anonymous_accepts_everything() {
        assert_eq!(Anonymous.authenticate(&parts(Some("Bearer x"))).unwrap(), User::Anonymous);
    }

    #[test]
    fn bearer_tokens_resolve_known_users() {
        let auth = BearerTokens::new().token("s3cret", "alice");
        let user = auth.authenticate(&parts(Some("Bearer s3cret"))).unwrap();
        assert_eq!(user.id(), Some("alice"));
        assert!(user.is_authenticated());
    }

    #[test]
    fn missing_header_is_anonymous() {
        let auth = BearerTokens::new().token("s3cret", "alice");
        assert_eq!(auth.authenticate(&parts(None)).unwrap(), User::Anonymous);
    }

    #[test]
    fn unknown_or_malformed_tokens_are_unauthorized() {
        let auth = BearerTokens::new().token("s3cret", "alice");
        for header in ["Bearer nope", "Basic YWxpY2U6cHc="] {
            let err = auth.authenticate(&parts(Some(header))).unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn user_display() {
        assert_eq!(User::Anonymous.to_string(), "anonymous");
        assert_eq!(User::authenticated("alice").to_string(), "alice");
    }
}
