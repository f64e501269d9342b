//! Radix-tree router and the per-request pipeline.
//!
//! One tree per HTTP method, O(path-length) lookup. Every matched request
//! goes through the same steps: authenticate, parse the body, run the
//! middleware stack around the view, translate errors into responses.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::auth::{Anonymous, Authenticator};
use crate::error::BoxError;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::MiddlewareStack;
use crate::parse::parse_body;
use crate::request::Request;
use crate::response::Response;

#[derive(Clone)]
struct Route {
    handler: BoxedHandler,
    hooked: bool,
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every builder method returns `self` so registrations chain naturally.
///
/// The [`MiddlewareStack`] attached with [`middleware`](Router::middleware)
/// wraps every route registered with [`on`](Router::on) (or the method
/// shortcuts), regardless of whether the route was added before or after
/// the stack.
///
/// ```rust
/// use http::Method;
/// use viewhooks::{Request, Response, Router};
/// use viewhooks::middleware::{MiddlewareStack, trace::RequestTrace};
///
/// # async fn get_user(_: Request) -> Response { Response::text("") }
/// # async fn create_user(_: Request) -> Response { Response::text("") }
/// # async fn liveness(_: Request) -> Response { Response::text("ok") }
/// let app = Router::new()
///     .get("/users/{id}", get_user)
///     .on(Method::POST, "/users", create_user)
///     .on_unhooked(Method::GET, "/healthz", liveness)
///     .middleware(MiddlewareStack::new().with(RequestTrace));
/// ```
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
    middleware: Arc<MiddlewareStack>,
    authenticator: Arc<dyn Authenticator>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            middleware: Arc::new(MiddlewareStack::new()),
            authenticator: Arc::new(Anonymous),
        }
    }

    /// Sets the stack wrapped around every hooked route. Replaces any
    /// previously attached stack.
    pub fn middleware(mut self, stack: MiddlewareStack) -> Self {
        self.middleware = Arc::new(stack);
        self
    }

    /// Sets the authenticator run before the middleware stack.
    pub fn authenticator(mut self, authenticator: impl Authenticator) -> Self {
        self.authenticator = Arc::new(authenticator);
        self
    }

    /// Register a view for a method + path pair, wrapped by the middleware
    /// stack. Path parameters use `{name}` syntax.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, handler, true)
    }

    /// Register a view that bypasses the middleware stack (health probes,
    /// metrics scrapes). Authentication and body parsing still run.
    pub fn on_unhooked(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, handler, false)
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self { self.on(Method::GET, path, handler) }
    pub fn post(self, path: &str, handler: impl Handler) -> Self { self.on(Method::POST, path, handler) }
    pub fn put(self, path: &str, handler: impl Handler) -> Self { self.on(Method::PUT, path, handler) }
    pub fn patch(self, path: &str, handler: impl Handler) -> Self { self.on(Method::PATCH, path, handler) }
    pub fn delete(self, path: &str, handler: impl Handler) -> Self { self.on(Method::DELETE, path, handler) }

    fn add(mut self, method: Method, path: &str, handler: impl Handler, hooked: bool) -> Self {
        let route = Route { handler: handler.into_boxed_handler(), hooked };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<(Route, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value.clone(), params))
    }

    /// Runs one request through the full pipeline and returns the response
    /// that goes on the wire. Never fails: errors become responses here.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();

        let Some((route, params)) = self.lookup(&parts.method, parts.uri.path()) else {
            debug!(method = %parts.method, path = parts.uri.path(), "no route");
            return Response::status(StatusCode::NOT_FOUND);
        };

        match self.run(route, parts, body, params).await {
            Ok(response) => response,
            Err(err) => Response::from_error(err),
        }
    }

    async fn run(
        &self,
        route: Route,
        parts: Parts,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Result<Response, BoxError> {
        let user = self.authenticator.authenticate(&parts)?;
        let data = parse_body(parts.headers.get(CONTENT_TYPE), &body)?;
        let request = Request::new(parts, body, params, user, data);

        if !route.hooked {
            return route.handler.call(request).await;
        }

        self.middleware
            .dispatch(request, |req| route.handler.call(req))
            .await
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
