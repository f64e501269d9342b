//! Minimal viewhooks example — JSON endpoints wrapped by configured hooks.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Optional overrides:
//!   VIEWHOOKS_MIDDLEWARE=request_id,trace,user_activity
//!   VIEWHOOKS_INSTANCES=per_request
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i -X POST http://localhost:3000/users \
//!        -H 'authorization: Bearer s3cret' \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl -i http://localhost:3000/healthz

use http::header::LOCATION;
use http::{HeaderValue, Method, StatusCode};
use serde::Deserialize;
use viewhooks::auth::BearerTokens;
use viewhooks::config::{InstancePolicy, Settings};
use viewhooks::middleware::{Middleware, Registry};
use viewhooks::{BoxError, HttpError, Request, Response, Router, Server};

/// Logs who called what, and with which outcome.
struct UserActivity;

impl Middleware for UserActivity {
    fn name(&self) -> &str {
        "user_activity"
    }

    fn process_request(&self, request: Request) -> Result<Request, BoxError> {
        if let Some(user) = request.user().id() {
            tracing::info!(user, path = request.path(), "api request");
        }
        Ok(request)
    }

    fn process_response(&self, request: &Request, response: Response) -> Result<Response, BoxError> {
        if let Some(user) = request.user().id() {
            tracing::info!(user, status = response.status_code().as_u16(), "api request completed");
        }
        Ok(response)
    }
}

#[tokio::main]
async fn main() -> Result<(), viewhooks::Error> {
    tracing_subscriber::fmt::init();

    let settings = Settings::new(InstancePolicy::Shared)
        .with("request_id")
        .with("trace")
        .with("user_activity")
        .apply_env()?;

    let stack = Registry::with_builtins()
        .register("user_activity", || UserActivity)
        .resolve(&settings)?;

    let app = Router::new()
        .get("/users/{id}", get_user)
        .post("/users", create_user)
        .on_unhooked(Method::GET, "/healthz", liveness)
        .authenticator(BearerTokens::new().token("s3cret", "alice"))
        .middleware(stack);

    Server::bind("0.0.0.0:3000").serve(app).await
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(serde_json::json!({ "id": id, "name": "alice" }).to_string())
}

#[derive(Deserialize)]
struct NewUser {
    name: String,
}

// POST /users: req.data() is already parsed JSON.
async fn create_user(req: Request) -> Result<Response, HttpError> {
    if !req.user().is_authenticated() {
        return Err(HttpError::unauthorized("log in first"));
    }
    let input: NewUser = req.data().json()?;

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header(LOCATION, HeaderValue::from_static("/users/99"))
        .json(serde_json::json!({ "id": "99", "name": input.name }).to_string()))
}

async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}
