//! Middleware hooks.
//!
//! Transport-level middleware sees bytes and headers. The hooks here run one
//! layer higher: after routing, authentication and body parsing, so
//! [`Request::user`] and [`Request::data`] are already there, and after the
//! view, so the finished [`Response`] is there too.
//!
//! Per request, a [`MiddlewareStack`] runs:
//!
//! 1. every hook's [`process_request`](Middleware::process_request), in
//!    order, each receiving the request the previous one returned;
//! 2. the view, with the request the last hook returned;
//! 3. every hook's [`process_response`](Middleware::process_response), in
//!    the **same** order, each receiving that request and the response the
//!    previous one returned.
//!
//! A hook error stops everything after it and is returned as is. A view
//! error is first turned into its response (see [`HttpError`](crate::HttpError)),
//! and that response goes through the post-phase like any other.
//!
//! ```rust
//! use viewhooks::middleware::{Middleware, MiddlewareStack};
//! use viewhooks::{BoxError, Request, Response};
//!
//! struct UserActivity;
//!
//! impl Middleware for UserActivity {
//!     fn process_request(&self, request: Request) -> Result<Request, BoxError> {
//!         if let Some(id) = request.user().id() {
//!             tracing::info!(user = id, path = request.path(), "api request");
//!         }
//!         Ok(request)
//!     }
//! }
//!
//! let stack = MiddlewareStack::new().with(UserActivity);
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

mod registry;

pub mod request_id;
pub mod trace;

pub use registry::Registry;

/// A hook around view dispatch.
///
/// Both operations default to passing their input through unchanged, so an
/// implementation overrides only the phase it cares about. Errors are not
/// caught by the stack.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in log fields. Defaults to the type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs before the view. Returns the request handed to the next hook
    /// (or to the view, for the last one).
    fn process_request(&self, request: Request) -> Result<Request, BoxError> {
        Ok(request)
    }

    /// Runs after the view. Returns the response handed to the next hook
    /// (or to the client, for the last one).
    fn process_response(&self, request: &Request, response: Response) -> Result<Response, BoxError> {
        let _ = request;
        Ok(response)
    }
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn process_request(&self, request: Request) -> Result<Request, BoxError> {
        (**self).process_request(request)
    }

    fn process_response(&self, request: &Request, response: Response) -> Result<Response, BoxError> {
        (**self).process_response(request, response)
    }
}

pub(crate) type Factory = Arc<dyn Fn() -> Arc<dyn Middleware> + Send + Sync>;

/// One configured position in the stack.
#[derive(Clone)]
enum Slot {
    /// Built once, shared by every request.
    Shared { name: String, hook: Arc<dyn Middleware> },
    /// Built at the start of each request.
    PerRequest { name: String, factory: Factory },
}

impl Slot {
    fn instantiate(&self) -> Arc<dyn Middleware> {
        match self {
            Self::Shared { hook, .. } => Arc::clone(hook),
            Self::PerRequest { factory, .. } => factory(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Shared { name, .. } | Self::PerRequest { name, .. } => name,
        }
    }
}

/// An ordered, immutable list of hooks wrapped around view dispatch.
///
/// Build it once at startup, either by hand with [`with`](Self::with) /
/// [`with_factory`](Self::with_factory) or from settings through
/// [`Registry::resolve`], and attach it with
/// [`Router::middleware`](crate::Router::middleware).
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    slots: Vec<Slot>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook shared by every request.
    pub fn with(mut self, hook: impl Middleware) -> Self {
        let name = hook.name().to_owned();
        self.slots.push(Slot::Shared { name, hook: Arc::new(hook) });
        self
    }

    /// Appends a hook built fresh for every request by `factory`.
    pub fn with_factory<M, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        M: Middleware,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as Arc<dyn Middleware>);
        self.slots.push(Slot::PerRequest { name: name.into(), factory });
        self
    }

    pub(crate) fn push_shared(&mut self, name: String, hook: Arc<dyn Middleware>) {
        self.slots.push(Slot::Shared { name, hook });
    }

    pub(crate) fn push_factory(&mut self, name: String, factory: Factory) {
        self.slots.push(Slot::PerRequest { name, factory });
    }

    pub fn len(&self) -> usize { self.slots.len() }
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    /// Hook names in invocation order.
    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(Slot::name).collect()
    }

    /// Runs the pre-phase, `view`, and the post-phase for one request.
    ///
    /// `view` receives a clone of the request the pre-phase produced; the
    /// post-phase hooks receive the original of that clone. An error from
    /// `view` is rendered as a response before the post-phase, so hooks see
    /// failed requests too.
    pub async fn dispatch<V, Fut>(&self, request: Request, view: V) -> Result<Response, BoxError>
    where
        V: FnOnce(Request) -> Fut,
        Fut: Future<Output = Result<Response, BoxError>>,
    {
        let hooks: Vec<(&str, Arc<dyn Middleware>)> = self
            .slots
            .iter()
            .map(|slot| (slot.name(), slot.instantiate()))
            .collect();

        let mut request = request;
        for (name, hook) in &hooks {
            trace!(middleware = name, "process_request");
            request = hook.process_request(request).inspect_err(|e| {
                debug!(middleware = name, "process_request failed: {e}");
            })?;
        }

        let mut response = view(request.clone()).await.unwrap_or_else(Response::from_error);

        for (name, hook) in &hooks {
            trace!(middleware = name, "process_response");
            response = hook.process_response(&request, response).inspect_err(|e| {
                debug!(middleware = name, "process_response failed: {e}");
            })?;
        }

        Ok(response)
    }
}

impl std::fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
