//! Client for the store's backend REST API.
//!
//! # Architecture
//!
//! - The backend is the source of truth for products, accounts and orders
//! - Plain JSON over HTTP via `reqwest`; wire records are converted to core
//!   types in [`types`]
//! - Authenticated calls forward the session token as a bearer token; the
//!   backend is expected to enforce roles itself
//! - Every request is bounded by the configured timeout, no retries
//!
//! # Endpoints
//!
//! ```text
//! GET    /productos                 list products
//! POST   /productos                 create product          (bearer)
//! PUT    /productos/{id}            update product          (bearer)
//! DELETE /productos/{id}            delete product          (bearer)
//! POST   /auth/register             create account
//! POST   /auth/login                obtain token + role
//! PUT    /usuarios/{id}             update account          (bearer)
//! POST   /pedidos                   place order             (bearer)
//! GET    /pedidos                   list all orders         (bearer)
//! GET    /pedidos/usuario/{userId}  list a user's orders    (bearer)
//! PUT    /pedidos/{id}              set order status        (bearer)
//! ```

pub mod types;

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use carrito_core::{Order, OrderId, OrderStatus, Product, ProductId, UserId};

use crate::config::BackendConfig;
use types::{
    LoginRequest, LoginResponse, NewOrder, OrderStatusUpdate, ProductInput, RawOrder,
    RawProduct, RegisterRequest, UpdateUserRequest,
};

/// Longest slice of a response body kept in errors and logs.
const MAX_BODY_EXCERPT: usize = 200;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credentials or token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The addressed resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request as invalid (4xx other than 401/404).
    #[error("Rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The backend failed (5xx).
    #[error("Backend error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Message safe to show next to a form.
    ///
    /// Validation messages from the backend are passed through; transport
    /// and server failures are replaced by a generic sentence.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(_) => "Invalid credentials or expired session".to_string(),
            Self::NotFound(_) => "The requested record no longer exists".to_string(),
            Self::Rejected { message, .. } if !message.is_empty() => message.clone(),
            Self::Rejected { .. } => "The request was rejected".to_string(),
            Self::Http(_) | Self::Server { .. } | Self::Parse(_) => {
                "The store service is unavailable, please try again later".to_string()
            }
        }
    }
}

/// Client for the backend REST API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("carrito-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_raw(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request, map the status and return the body text.
    async fn send_raw(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized(message)),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
            s if s.is_client_error() => Err(ApiError::Rejected {
                status: s.as_u16(),
                message,
            }),
            s => {
                tracing::error!(
                    status = %s,
                    body = %excerpt(&body),
                    "Backend returned non-success status"
                );
                Err(ApiError::Server {
                    status: s.as_u16(),
                    message,
                })
            }
        }
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List all products, normalized into the catalog shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a product list.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let raw: Vec<RawProduct> = self
            .send(self.inner.client.get(self.url("productos")))
            .await?;
        tracing::debug!(count = raw.len(), "Fetched products from backend");
        Ok(raw.into_iter().map(Product::from).collect())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token, input), fields(name = %input.nombre))]
    pub async fn create_product(
        &self,
        token: &str,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let raw: RawProduct = self
            .send(
                self.inner
                    .client
                    .post(self.url("productos"))
                    .bearer_auth(token)
                    .json(input),
            )
            .await?;
        Ok(raw.into())
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: &ProductId,
        input: &ProductInput,
    ) -> Result<(), ApiError> {
        self.send_raw(
            self.inner
                .client
                .put(self.url(&format!("productos/{id}")))
                .bearer_auth(token)
                .json(input),
        )
        .await?;
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &str, id: &ProductId) -> Result<(), ApiError> {
        self.send_raw(
            self.inner
                .client
                .delete(self.url(&format!("productos/{id}")))
                .bearer_auth(token),
        )
        .await?;
        Ok(())
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it
    /// (e.g. the username is taken).
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<(), ApiError> {
        self.send_raw(
            self.inner
                .client
                .post(self.url("auth/register"))
                .json(request),
        )
        .await?;
        Ok(())
    }

    /// Exchange credentials for a token and role.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for wrong credentials, or another
    /// error if the request fails.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse, ApiError> {
        self.send(self.inner.client.post(self.url("auth/login")).json(request))
            .await
    }

    /// Update account fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token, request), fields(user_id = %user_id))]
    pub async fn update_user(
        &self,
        token: &str,
        user_id: &UserId,
        request: &UpdateUserRequest<'_>,
    ) -> Result<(), ApiError> {
        self.send_raw(
            self.inner
                .client
                .put(self.url(&format!("usuarios/{user_id}")))
                .bearer_auth(token)
                .json(request),
        )
        .await?;
        Ok(())
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token, order), fields(invoice = %order.factura))]
    pub async fn place_order(&self, token: &str, order: &NewOrder) -> Result<Order, ApiError> {
        let raw: RawOrder = self
            .send(
                self.inner
                    .client
                    .post(self.url("pedidos"))
                    .bearer_auth(token)
                    .json(order),
            )
            .await?;
        Ok(raw.into())
    }

    /// Orders placed by one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn orders_for_user(
        &self,
        token: &str,
        user_id: &UserId,
    ) -> Result<Vec<Order>, ApiError> {
        let raw: Vec<RawOrder> = self
            .send(
                self.inner
                    .client
                    .get(self.url(&format!("pedidos/usuario/{user_id}")))
                    .bearer_auth(token),
            )
            .await?;
        Ok(raw.into_iter().map(Order::from).collect())
    }

    /// Every order in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token))]
    pub async fn all_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        let raw: Vec<RawOrder> = self
            .send(self.inner.client.get(self.url("pedidos")).bearer_auth(token))
            .await?;
        Ok(raw.into_iter().map(Order::from).collect())
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip(self, token), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: &str,
        order_id: &OrderId,
        status: &OrderStatus,
    ) -> Result<(), ApiError> {
        self.send_raw(
            self.inner
                .client
                .put(self.url(&format!("pedidos/{order_id}")))
                .bearer_auth(token)
                .json(&OrderStatusUpdate {
                    estado: status.as_str(),
                }),
        )
        .await?;
        Ok(())
    }
}

/// First characters of a body, for logs.
fn excerpt(body: &str) -> String {
    body.chars().take(MAX_BODY_EXCERPT).collect()
}

/// Pull a human message out of an error body.
///
/// Accepts `{"message": ..}`, `{"error": ..}` or `{"msg": ..}`; falls back
/// to the raw body excerpt.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error", "msg"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(String::from))
        })
        .unwrap_or_else(|| excerpt(body.trim()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"message":"Usuario ya existe"}"#), "Usuario ya existe");
        assert_eq!(error_message(r#"{"error":"Token inválido"}"#), "Token inválido");
        assert_eq!(error_message(r#"{"msg":"nope"}"#), "nope");
    }

    #[test]
    fn test_error_message_falls_back_to_excerpt() {
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        let long = "x".repeat(500);
        assert_eq!(error_message(&long).len(), MAX_BODY_EXCERPT);
    }

    #[test]
    fn test_user_message_hides_server_details() {
        let err = ApiError::Server {
            status: 500,
            message: "stack trace at line 3".to_string(),
        };
        assert!(!err.user_message().contains("stack trace"));

        let err = ApiError::Rejected {
            status: 400,
            message: "El nombre es obligatorio".to_string(),
        };
        assert_eq!(err.user_message(), "El nombre es obligatorio");
    }

    #[test]
    fn test_url_joins_without_double_slashes() {
        let client = BackendClient::new(&BackendConfig {
            api_url: "http://localhost:5000/api/".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap_or_else(|e| panic!("client: {e}"));

        assert_eq!(client.url("productos"), "http://localhost:5000/api/productos");
        assert_eq!(client.url("/pedidos/1"), "http://localhost:5000/api/pedidos/1");
    }
}
