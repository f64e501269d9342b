//! Request-id propagation.
//!
//! Reuses the client's (or proxy's) `x-request-id` when it is present and
//! sane, otherwise mints a UUIDv4. The id is stored in the request
//! extensions for views and later hooks, and echoed on the response.

use http::HeaderValue;
use http::header::HeaderName;
use uuid::Uuid;

use super::Middleware;
use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

pub const HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_LEN: usize = 128;

/// The id assigned to the current request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssignedId(String);

impl AssignedId {
    pub fn as_str(&self) -> &str { &self.0 }
}

/// Assigns and echoes `x-request-id`.
pub struct RequestId;

impl Middleware for RequestId {
    fn name(&self) -> &str {
        "request_id"
    }

    fn process_request(&self, mut request: Request) -> Result<Request, BoxError> {
        let id = request
            .header(HEADER.as_str())
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_LEN)
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        request.extensions_mut().insert(AssignedId(id));
        Ok(request)
    }

    fn process_response(&self, request: &Request, mut response: Response) -> Result<Response, BoxError> {
        if let Some(id) = request.extensions().get::<AssignedId>() {
            if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                response.headers_mut().insert(HEADER, value);
            }
        }
        Ok(response)
    }
}
