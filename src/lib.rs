//! # viewhooks
//!
//! A minimal HTTP framework whose views can be wrapped by **middleware
//! hooks** that run on the parsed request, not the raw one.
//!
//! ## Where hooks sit
//!
//! ```text
//! bytes → route → authenticate (user) → parse body (data)
//!       → process_request  H1 … Hn
//!       → view
//!       → process_response H1 … Hn
//!       → bytes
//! ```
//!
//! Transport middleware runs before the framework knows who the caller is
//! or what the body says. Hooks run after, with the user and the decoded
//! body already on the request.
//!
//! - [`middleware::Middleware`] — the two-method hook contract, both methods
//!   pass-through by default.
//! - [`middleware::MiddlewareStack`] — the ordered hooks around every view
//!   of a [`Router`].
//! - [`middleware::Registry`] + [`config::Settings`] — pick hooks by name at
//!   deploy time, resolved once at startup.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use viewhooks::config::Settings;
//! use viewhooks::middleware::{Middleware, Registry};
//! use viewhooks::{BoxError, HttpError, Request, Response, Router, Server};
//!
//! struct StaffOnly;
//!
//! impl Middleware for StaffOnly {
//!     fn process_request(&self, request: Request) -> Result<Request, BoxError> {
//!         match request.user().id() {
//!             Some(_) => Ok(request),
//!             None => Err(HttpError::forbidden("staff only").into()),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), viewhooks::Error> {
//!     let settings = Settings::from_file("viewhooks.json")?.apply_env()?;
//!     let stack = Registry::with_builtins()
//!         .register("staff_only", || StaffOnly)
//!         .resolve(&settings)?;
//!
//!     let app = Router::new()
//!         .get("/users/{id}", get_user)
//!         .middleware(stack);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(serde_json::json!({ "id": id }).to_string())
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod auth;
pub mod config;
pub mod middleware;
pub mod parse;

pub use error::{BoxError, ConfigError, Error, HttpError};
pub use handler::Handler;
pub use request::Request;
pub use response::{IntoOutcome, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
