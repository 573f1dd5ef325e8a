//! Integration test harness for the Carrito storefront.
//!
//! Each [`TestContext`] starts two in-process servers on ephemeral ports:
//! a stub of the backend REST API and the real storefront router with
//! in-memory sessions. Tests talk to the storefront through a cookie-keeping
//! `reqwest` client, the same way a browser tab would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p carrito-integration-tests
//! ```
//!
//! # Stub Accounts
//!
//! | Username | Password   | Role     |
//! |----------|------------|----------|
//! | `admin`  | `admin123` | admin    |
//! | `ana`    | `ana12345` | customer |

#![allow(clippy::missing_panics_doc, clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
};
use reqwest::{Client, redirect::Policy};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower_sessions::MemoryStore;

use carrito_storefront::{
    build_app,
    config::{BackendConfig, StorefrontConfig},
    middleware::{create_session_layer, session::SESSION_COOKIE_NAME},
    state::AppState,
};

// =============================================================================
// Stub Backend
// =============================================================================

/// Requests the stub backend has seen, for assertions.
#[derive(Default)]
pub struct BackendLog {
    /// Bodies of `POST /pedidos`.
    pub placed_orders: Vec<Value>,
    /// `(order id, estado)` pairs from `PUT /pedidos/{id}`.
    pub status_updates: Vec<(String, String)>,
    /// Number of `GET /productos` calls.
    pub catalog_fetches: usize,
}

/// Handle to the stub backend's request log.
#[derive(Clone, Default)]
pub struct StubBackend {
    log: Arc<Mutex<BackendLog>>,
}

impl StubBackend {
    /// Run `f` against the request log.
    pub fn inspect<T>(&self, f: impl FnOnce(&BackendLog) -> T) -> T {
        f(&self.log.lock().unwrap())
    }
}

fn products() -> Value {
    json!([
        { "_id": "p1", "nombre": "Widget", "precio": 9.99, "imagen": "/img/widget.png" },
        {
            "_id": "p2",
            "nombre": "Gadget",
            "precio": "20.00",
            "imagen": "/img/gadget.png",
            "descripcion": "A very useful gadget",
            "stock": 3
        }
    ])
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn list_products(State(stub): State<StubBackend>) -> Json<Value> {
    stub.log.lock().unwrap().catalog_fetches += 1;
    Json(products())
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (username, password) {
        ("admin", "admin123") => (
            StatusCode::OK,
            Json(json!({ "token": "tok-admin", "username": "admin", "role": "admin", "userId": "u-admin" })),
        ),
        ("ana", "ana12345") => (
            StatusCode::OK,
            Json(json!({ "token": "tok-ana", "username": "ana", "role": "cliente", "userId": "u-ana" })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        ),
    }
}

async fn register(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["username"] == "ana" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Username already exists" })),
        );
    }
    (StatusCode::CREATED, Json(json!({ "ok": true })))
}

async fn place_order(
    State(stub): State<StubBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if bearer(&headers).is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "No token" })));
    }
    let mut log = stub.log.lock().unwrap();
    let mut order = body.clone();
    order["_id"] = json!(format!("o-{}", log.placed_orders.len() + 1));
    order["estado"] = json!("pendiente");
    log.placed_orders.push(order.clone());
    (StatusCode::CREATED, Json(order))
}

async fn all_orders(
    State(stub): State<StubBackend>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if bearer(&headers) != Some("tok-admin") {
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "Admins only" })));
    }
    let orders = stub.log.lock().unwrap().placed_orders.clone();
    (StatusCode::OK, Json(Value::Array(orders)))
}

async fn orders_for_user(
    State(stub): State<StubBackend>,
    Path(user_id): Path<String>,
) -> Json<Value> {
    let orders = stub
        .log
        .lock()
        .unwrap()
        .placed_orders
        .iter()
        .filter(|order| order["userId"] == user_id.as_str())
        .cloned()
        .collect();
    Json(Value::Array(orders))
}

async fn update_order(
    State(stub): State<StubBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let estado = body["estado"].as_str().unwrap_or_default().to_string();
    stub.log.lock().unwrap().status_updates.push((id, estado));
    Json(json!({ "ok": true }))
}

async fn spawn_backend(stub: StubBackend) -> String {
    let app = Router::new()
        .route("/api/productos", get(list_products))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/pedidos", get(all_orders).post(place_order))
        .route("/api/pedidos/usuario/{id}", get(orders_for_user))
        .route("/api/pedidos/{id}", put(update_order))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/api")
}

// =============================================================================
// Test Context
// =============================================================================

/// A running storefront wired to a stub backend.
pub struct TestContext {
    /// Cookie-keeping client that does not follow redirects.
    pub client: Client,
    /// Storefront base URL, without trailing slash.
    pub base_url: String,
    /// The stub backend's request log.
    pub backend: StubBackend,
}

impl TestContext {
    /// Start a stub backend and a storefront in front of it.
    pub async fn new() -> Self {
        let backend = StubBackend::default();
        let api_url = spawn_backend(backend.clone()).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            database_url: None,
            backend: BackendConfig {
                api_url,
                timeout: Duration::from_secs(5),
            },
            catalog_ttl: None,
            tax_rate: Decimal::new(19, 2),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, None).unwrap();
        let app = build_app(state, session_layer);
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self {
            client: new_client(),
            base_url,
            backend,
        }
    }

    /// Absolute URL for a storefront path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A second visitor with its own cookie jar.
    pub fn other_visitor(&self) -> Client {
        new_client()
    }

    /// GET a page and return status and body.
    pub async fn get(&self, path: &str) -> (reqwest::StatusCode, String) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.text().await.unwrap())
    }

    /// POST a form and return the raw response.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Load the home page so the catalog snapshot is populated.
    pub async fn load_catalog(&self) {
        let (status, _) = self.get("/").await;
        assert_eq!(status, reqwest::StatusCode::OK);
    }

    /// Log in through the form and check the redirect home.
    pub async fn login(&self, username: &str, password: &str) {
        let response = self
            .post_form("/login", &[("username", username), ("password", password)])
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect.
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The session id the response sets, if it sets one.
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}
