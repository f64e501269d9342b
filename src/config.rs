//! Deployment settings: which middleware runs, in what order, and how its
//! instances live.
//!
//! Settings come from a JSON document and can be overridden by environment
//! variables:
//!
//! ```json
//! { "middleware": ["request_id", "trace"], "instances": "shared" }
//! ```
//!
//! | Variable | Overrides | Format |
//! |---|---|---|
//! | `VIEWHOOKS_MIDDLEWARE` | `middleware` | comma-separated names |
//! | `VIEWHOOKS_INSTANCES`  | `instances`  | `shared` or `per_request` |
//!
//! `instances` has no default. Whether hook state is shared between
//! concurrent requests is a decision the deployment has to make.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const MIDDLEWARE_ENV: &str = "VIEWHOOKS_MIDDLEWARE";
pub const INSTANCES_ENV: &str = "VIEWHOOKS_INSTANCES";

/// How middleware instances are created.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstancePolicy {
    /// One instance per configured entry, built at startup and shared by
    /// every request. Hook state must be thread-safe.
    Shared,
    /// A fresh instance set per request, used for both phases of that
    /// request and dropped afterwards.
    PerRequest,
}

impl FromStr for InstancePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "shared"      => Ok(Self::Shared),
            "per_request" => Ok(Self::PerRequest),
            other         => Err(format!("expected `shared` or `per_request`, got `{other}`")),
        }
    }
}

impl fmt::Display for InstancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared     => "shared",
            Self::PerRequest => "per_request",
        })
    }
}

/// Middleware settings, resolved once at startup by
/// [`Registry::resolve`](crate::middleware::Registry::resolve).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Registered middleware names. Both phases run in this order.
    #[serde(default)]
    pub middleware: Vec<String>,
    pub instances: InstancePolicy,
}

impl Settings {
    /// Settings with no middleware.
    pub fn new(instances: InstancePolicy) -> Self {
        Self { middleware: Vec::new(), instances }
    }

    /// Appends a middleware name. Returns `self` for chaining.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.middleware.push(name.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Applies `VIEWHOOKS_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(optional_env)
    }

    /// Applies overrides from an arbitrary key lookup. Unset or empty values
    /// leave the field as it is.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup(MIDDLEWARE_ENV) {
            self.middleware = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect();
        }

        if let Some(raw) = lookup(INSTANCES_ENV) {
            self.instances = raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: INSTANCES_ENV.to_owned(),
                message,
            })?;
        }

        Ok(self)
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
