//! Per-request access log: method, path, user, status, latency.
//!
//! Register it early in the list so the latency covers the other hooks as
//! well as the view.

use std::time::{Duration, Instant};

use tracing::info;

use super::Middleware;
use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

/// Logs one `info` event per completed request.
pub struct RequestTrace;

#[derive(Clone, Copy)]
struct Started(Instant);

impl Middleware for RequestTrace {
    fn name(&self) -> &str {
        "trace"
    }

    fn process_request(&self, mut request: Request) -> Result<Request, BoxError> {
        request.extensions_mut().insert(Started(Instant::now()));
        Ok(request)
    }

    fn process_response(&self, request: &Request, response: Response) -> Result<Response, BoxError> {
        let latency_us = request
            .extensions()
            .get::<Started>()
            .map(|started| micros(started.0.elapsed()));

        info!(
            method = %request.method(),
            path = request.path(),
            user = %request.user(),
            status = response.status_code().as_u16(),
            latency_us,
            "request completed"
        );
        Ok(response)
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn stamps_start_time_and_leaves_response_alone() {
        let request: Request = http::Request::new(Bytes::new()).into();
        let request = RequestTrace.process_request(request).unwrap();
        assert!(request.extensions().get::<Started>().is_some());

        let response = RequestTrace.process_response(&request, Response::text("ok")).unwrap();
        assert_eq!(response.body().as_ref(), b"ok");
    }

    #[test]
    fn latency_saturates_instead_of_wrapping() {
        assert_eq!(micros(Duration::from_millis(3)), 3_000);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }
}
