//! Name → factory table that turns [`Settings`] into a [`MiddlewareStack`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::request_id::RequestId;
use super::trace::RequestTrace;
use super::{Factory, Middleware, MiddlewareStack};
use crate::config::{InstancePolicy, Settings};
use crate::error::ConfigError;

/// Maps middleware names to factories.
///
/// Every name in [`Settings::middleware`] is looked up once, in
/// [`resolve`](Registry::resolve). An unknown name fails the whole
/// resolution; nothing is looked up lazily per request.
///
/// ```rust
/// use viewhooks::config::{InstancePolicy, Settings};
/// use viewhooks::middleware::{Middleware, Registry};
///
/// struct Audit;
/// impl Middleware for Audit {}
///
/// let registry = Registry::with_builtins().register("audit", || Audit);
/// let settings = Settings::new(InstancePolicy::Shared).with("request_id").with("audit");
/// let stack = registry.resolve(&settings).unwrap();
/// assert_eq!(stack.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with `"request_id"` and `"trace"`.
    pub fn with_builtins() -> Self {
        Self::new()
            .register("request_id", || RequestId)
            .register("trace", || RequestTrace)
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<M, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        M: Middleware,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as Arc<dyn Middleware>);
        self.factories.insert(name.into(), factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds the stack `settings` describes.
    ///
    /// With [`InstancePolicy::Shared`] each entry is instantiated here, once.
    /// With [`InstancePolicy::PerRequest`] the factories are kept and run at
    /// the start of every request.
    pub fn resolve(&self, settings: &Settings) -> Result<MiddlewareStack, ConfigError> {
        let mut stack = MiddlewareStack::new();

        for (position, name) in settings.middleware.iter().enumerate() {
            let factory = self.factories.get(name).ok_or_else(|| ConfigError::UnknownMiddleware {
                name: name.clone(),
                position,
            })?;

            match settings.instances {
                InstancePolicy::Shared => stack.push_shared(name.clone(), factory()),
                InstancePolicy::PerRequest => stack.push_factory(name.clone(), Arc::clone(factory)),
            }
        }

        info!(middleware = ?stack.names(), instances = %settings.instances, "middleware resolved");
        Ok(stack)
    }
}
