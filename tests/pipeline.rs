//! End-to-end pipeline tests: routing, authentication, body parsing, the
//! middleware stack and error translation, driven through `Router::handle`.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, StatusCode};
use viewhooks::auth::BearerTokens;
use viewhooks::config::Settings;
use viewhooks::middleware::request_id::{AssignedId, HEADER as REQUEST_ID};
use viewhooks::middleware::{Middleware, MiddlewareStack, Registry};
use viewhooks::parse::Data;
use viewhooks::{BoxError, HttpError, Request, Response, Router};

type Seen = Arc<Mutex<Vec<String>>>;

fn get(path: &str) -> http::Request<Bytes> {
    http::Request::builder().uri(path).body(Bytes::new()).unwrap()
}

fn post_json(path: &str, body: &'static str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Bytes::from_static(body.as_bytes()))
        .unwrap()
}

async fn echo(req: Request) -> Response {
    let id = req.param("id").unwrap_or("none");
    Response::text(format!("{}:{id}", req.user()))
}

async fn not_found(_req: Request) -> Response {
    Response::status(StatusCode::NOT_FOUND)
}

// ── Scenario: a logging hook sees each request exactly once ─────────────────

struct LoggingHook {
    seen: Seen,
}

impl Middleware for LoggingHook {
    fn process_request(&self, request: Request) -> Result<Request, BoxError> {
        self.seen.lock().unwrap().push("seen".to_owned());
        Ok(request)
    }
}

#[tokio::test]
async fn logging_hook_records_one_entry_per_request() {
    let seen: Seen = Arc::default();

    async fn inspect(req: Request) -> Response {
        assert_eq!(req.path(), "/items/7");
        assert_eq!(req.param("id"), Some("7"));
        assert_eq!(req.header("x-trace"), Some("abc"));
        Response::text("ok")
    }

    let app = Router::new()
        .get("/items/{id}", inspect)
        .middleware(MiddlewareStack::new().with(LoggingHook { seen: Arc::clone(&seen) }));

    let req = http::Request::builder()
        .uri("/items/7")
        .header("x-trace", "abc")
        .body(Bytes::new())
        .unwrap();
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(*seen.lock().unwrap(), ["seen"]);
}

// ── Scenario: a later post-hook observes an earlier one's rewrite ──────────

struct ForceOk;

impl Middleware for ForceOk {
    fn process_response(&self, _request: &Request, mut response: Response) -> Result<Response, BoxError> {
        response.set_status_code(StatusCode::OK);
        Ok(response)
    }
}

struct ObserveStatus {
    observed: Arc<Mutex<Option<StatusCode>>>,
}

impl Middleware for ObserveStatus {
    fn process_response(&self, _request: &Request, response: Response) -> Result<Response, BoxError> {
        *self.observed.lock().unwrap() = Some(response.status_code());
        Ok(response)
    }
}

#[tokio::test]
async fn second_hook_observes_status_set_by_first() {
    let observed = Arc::new(Mutex::new(None));
    let app = Router::new()
        .get("/missing", not_found)
        .middleware(
            MiddlewareStack::new()
                .with(ForceOk)
                .with(ObserveStatus { observed: Arc::clone(&observed) }),
        );

    let res = app.handle(get("/missing")).await;

    assert_eq!(*observed.lock().unwrap(), Some(StatusCode::OK));
    assert_eq!(res.status_code(), StatusCode::OK);
}

// ── Hooks see the parsed request ────────────────────────────────────────────

struct RecordUserAndData {
    seen: Seen,
}

impl Middleware for RecordUserAndData {
    fn process_request(&self, request: Request) -> Result<Request, BoxError> {
        let name = request
            .data()
            .as_json()
            .and_then(|v| v["name"].as_str())
            .unwrap_or("-")
            .to_owned();
        self.seen.lock().unwrap().push(format!("{} posted {name}", request.user()));
        Ok(request)
    }
}

#[tokio::test]
async fn hooks_run_after_authentication_and_parsing() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .post("/users", echo)
        .authenticator(BearerTokens::new().token("s3cret", "alice"))
        .middleware(MiddlewareStack::new().with(RecordUserAndData { seen: Arc::clone(&seen) }));

    let mut req = post_json("/users", r#"{"name":"bob"}"#);
    req.headers_mut().insert(AUTHORIZATION, "Bearer s3cret".parse().unwrap());
    let res = app.handle(req).await;

    assert_eq!(res.body().as_ref(), b"alice:none");
    assert_eq!(*seen.lock().unwrap(), ["alice posted bob"]);
}

#[tokio::test]
async fn failed_authentication_never_reaches_hooks() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .get("/me", echo)
        .authenticator(BearerTokens::new())
        .middleware(MiddlewareStack::new().with(LoggingHook { seen: Arc::clone(&seen) }));

    let mut req = get("/me");
    req.headers_mut().insert(AUTHORIZATION, "Bearer forged".parse().unwrap());
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_is_rejected_before_hooks() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .post("/users", echo)
        .middleware(MiddlewareStack::new().with(LoggingHook { seen: Arc::clone(&seen) }));

    let res = app.handle(post_json("/users", "{not json")).await;

    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    assert!(seen.lock().unwrap().is_empty());
}

// ── Request rewriting ───────────────────────────────────────────────────────

struct Impersonate;

impl Middleware for Impersonate {
    fn process_request(&self, mut request: Request) -> Result<Request, BoxError> {
        request.set_user(viewhooks::auth::User::authenticated("support"));
        request.set_data(Data::Empty);
        Ok(request)
    }
}

#[tokio::test]
async fn view_receives_the_rewritten_request() {
    async fn whoami(req: Request) -> Response {
        assert!(req.data().is_empty());
        Response::text(req.user().to_string())
    }

    let app = Router::new()
        .post("/whoami", whoami)
        .middleware(MiddlewareStack::new().with(Impersonate));

    let res = app.handle(post_json("/whoami", r#"{"x":1}"#)).await;
    assert_eq!(res.body().as_ref(), b"support");
}

// ── Error translation ───────────────────────────────────────────────────────

struct Deny;

impl Middleware for Deny {
    fn process_request(&self, _request: Request) -> Result<Request, BoxError> {
        Err(HttpError::forbidden("nope").into())
    }
}

struct Explode;

impl Middleware for Explode {
    fn process_response(&self, _request: &Request, _response: Response) -> Result<Response, BoxError> {
        Err(std::io::Error::other("disk on fire").into())
    }
}

#[tokio::test]
async fn http_errors_from_hooks_keep_their_status() {
    let app = Router::new()
        .get("/secret", echo)
        .middleware(MiddlewareStack::new().with(Deny));

    let res = app.handle(get("/secret")).await;
    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(res.body().as_ref(), br#"{"detail":"nope"}"#);
}

#[tokio::test]
async fn other_errors_become_internal_server_error() {
    let app = Router::new()
        .get("/boom", echo)
        .middleware(MiddlewareStack::new().with(Explode));

    let res = app.handle(get("/boom")).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn view_errors_are_translated_too() {
    async fn fails(_req: Request) -> Result<Response, HttpError> {
        Err(HttpError::new(StatusCode::CONFLICT, "taken"))
    }

    let app = Router::new().post("/claim", fails);
    let res = app.handle(post_json("/claim", "{}")).await;
    assert_eq!(res.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejected_views_still_run_the_post_phase() {
    async fn forbidden(_req: Request) -> Result<Response, HttpError> {
        Err(HttpError::forbidden("not yours"))
    }

    let observed = Arc::new(Mutex::new(None));
    let app = Router::new().get("/orders/{id}", forbidden).middleware(
        MiddlewareStack::new()
            .with(viewhooks::middleware::request_id::RequestId)
            .with(ObserveStatus { observed: Arc::clone(&observed) }),
    );

    let req = http::Request::builder()
        .uri("/orders/1")
        .header(REQUEST_ID, "abc")
        .body(Bytes::new())
        .unwrap();
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(*observed.lock().unwrap(), Some(StatusCode::FORBIDDEN));
    assert_eq!(res.headers()[REQUEST_ID], "abc");
    assert_eq!(res.body().as_ref(), br#"{"detail":"not yours"}"#);
}

// ── Routing and the stack ───────────────────────────────────────────────────

#[tokio::test]
async fn unmatched_routes_skip_hooks() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .get("/known", echo)
        .middleware(MiddlewareStack::new().with(LoggingHook { seen: Arc::clone(&seen) }));

    let res = app.handle(get("/unknown")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = app
        .handle(http::Request::builder().method(Method::DELETE).uri("/known").body(Bytes::new()).unwrap())
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stack_applies_to_routes_registered_after_it() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .middleware(MiddlewareStack::new().with(LoggingHook { seen: Arc::clone(&seen) }))
        .get("/late", echo)
        .on_unhooked(Method::GET, "/healthz", echo);

    app.handle(get("/late")).await;
    app.handle(get("/healthz")).await;

    assert_eq!(*seen.lock().unwrap(), ["seen"]);
}

// ── Configuration-driven stacks ─────────────────────────────────────────────

#[tokio::test]
async fn settings_resolve_to_a_working_stack() {
    let settings = Settings::from_json_str(
        r#"{"middleware": ["trace", "request_id"], "instances": "per_request"}"#,
    )
    .unwrap();
    let stack = Registry::with_builtins().resolve(&settings).unwrap();

    async fn show_id(req: Request) -> Response {
        let id = req.extensions().get::<AssignedId>().map(AssignedId::as_str).unwrap_or("-");
        Response::text(id.to_owned())
    }

    let app = Router::new().get("/id", show_id).middleware(stack);

    let mut req = get("/id");
    req.headers_mut().insert(REQUEST_ID, "req-42".parse().unwrap());
    let res = app.handle(req).await;

    assert_eq!(res.body().as_ref(), b"req-42");
    assert_eq!(res.headers()[REQUEST_ID], "req-42");
}
