//! Incoming request type, as seen by middleware and views.

use std::collections::HashMap;

use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri};

use crate::auth::User;
use crate::parse::Data;

/// A routed, authenticated, parsed HTTP request.
///
/// By the time a hook or a view receives it, [`user`](Request::user) and
/// [`data`](Request::data) are already resolved. Cloning is cheap: the body
/// is reference-counted, and everything else is small.
///
/// Hooks own the request while they run and may change its headers, user,
/// data and extensions. The typed [`extensions`](Request::extensions_mut)
/// map is the place for per-request state a hook wants back in its
/// `process_response`.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    user: User,
    data: Data,
    extensions: Extensions,
}

impl Request {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        params: HashMap<String, String>,
        user: User,
        data: Data,
    ) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params,
            user,
            data,
            extensions: parts.extensions,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    /// The raw body bytes, as received.
    pub fn body(&self) -> &Bytes { &self.body }

    /// Header lookup. `None` when absent or not valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> { &self.params }

    pub fn user(&self) -> &User { &self.user }
    pub fn set_user(&mut self, user: User) { self.user = user; }

    pub fn data(&self) -> &Data { &self.data }
    pub fn set_data(&mut self, data: Data) { self.data = data; }

    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }
}

/// Builds a request straight from an `http::Request`, without running
/// authentication or body parsing: the user is anonymous and the data is
/// the raw body (or empty). Useful for driving a
/// [`MiddlewareStack`](crate::middleware::MiddlewareStack) directly.
impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        let data = if body.is_empty() { Data::Empty } else { Data::Raw(body.clone()) };
        Self::new(parts, body, HashMap::new(), User::Anonymous, data)
    }
}
