//! Error types.
//!
//! Three layers:
//!
//! - [`Error`] — infrastructure failures surfaced to `main`: binding a port,
//!   loading settings.
//! - [`ConfigError`] — everything that can go wrong while turning settings
//!   into a [`MiddlewareStack`](crate::middleware::MiddlewareStack). Raised
//!   once, at startup.
//! - [`BoxError`] — whatever a hook or a view returns at request time. The
//!   dispatch path hands it upward untouched; only the router turns it into
//!   a response, and only [`HttpError`] gets a status other than 500.

use std::path::PathBuf;

use http::StatusCode;

/// The error type hooks and views return. Passed through the middleware
/// stack exactly as produced.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by viewhooks' fallible startup operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

/// Failures while reading settings or resolving middleware names.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown middleware `{name}` at position {position}")]
    UnknownMiddleware { name: String, position: usize },
}

/// A failure that maps onto a specific HTTP status.
///
/// Return it (boxed, or through `?`) from a hook or a view and the client
/// gets `status` and a `{"detail": message}` JSON body. Any other
/// error becomes `500 Internal Server Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn message(&self) -> &str { &self.message }
}
