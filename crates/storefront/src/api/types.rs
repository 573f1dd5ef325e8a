//! Wire types for the backend REST API.
//!
//! The backend speaks Spanish field names (`nombre`, `precio`, ...) and
//! document-style `_id` keys. Everything is converted to core types at this
//! boundary so nothing past the client sees wire shapes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use carrito_core::{
    Invoice, Order, OrderId, OrderItem, OrderStatus, Price, Product, ProductId, Role, UserId,
};

// =============================================================================
// Products
// =============================================================================

/// Product record as returned by `GET /productos`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    #[serde(rename = "_id")]
    pub id: String,
    pub nombre: String,
    pub precio: Decimal,
    #[serde(default)]
    pub imagen: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        Self {
            id: ProductId::new(raw.id),
            name: raw.nombre,
            price: Price::new(raw.precio),
            image: raw.imagen,
            description: raw.descripcion.filter(|d| !d.trim().is_empty()),
            stock: raw.stock,
        }
    }
}

/// Body for creating or updating a product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductInput {
    pub nombre: String,
    pub precio: Decimal,
    pub imagen: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

// =============================================================================
// Accounts
// =============================================================================

/// Body for `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body for `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response of `POST /auth/login`.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl LoginResponse {
    /// The role as the closed enum used by route guards.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role.as_deref().map_or(Role::Customer, Role::from)
    }
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Body for `PUT /usuarios/{id}`. Only the fields being changed are sent.
#[derive(Debug, Default, Serialize)]
pub struct UpdateUserRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

impl UpdateUserRequest<'_> {
    /// Whether the request would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Body for `POST /pedidos`.
#[derive(Debug, Serialize)]
pub struct NewOrder {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub items: Vec<NewOrderItem>,
    pub total: Decimal,
    pub factura: String,
}

/// Line of a [`NewOrder`].
#[derive(Debug, Serialize)]
pub struct NewOrderItem {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub nombre: String,
    pub precio: Decimal,
    pub cantidad: u32,
}

impl NewOrder {
    /// Build the order body for an issued invoice.
    #[must_use]
    pub fn from_invoice(user_id: &UserId, invoice: &Invoice) -> Self {
        Self {
            user_id: user_id.to_string(),
            items: invoice
                .lines
                .iter()
                .map(|line| NewOrderItem {
                    product_id: line.product_id.to_string(),
                    nombre: line.name.clone(),
                    precio: line.unit_price.amount(),
                    cantidad: line.quantity,
                })
                .collect(),
            total: invoice.total.amount(),
            factura: invoice.number.clone(),
        }
    }
}

/// Order record as returned by the `pedidos` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrder {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub items: Vec<RawOrderItem>,
    pub total: Decimal,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Line of a [`RawOrder`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrderItem {
    #[serde(rename = "productId", default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub precio: Decimal,
    #[serde(default)]
    pub cantidad: u32,
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        Self {
            id: OrderId::new(raw.id),
            user_id: raw.user_id.map(UserId::new),
            items: raw
                .items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id.map(ProductId::new),
                    name: item.nombre,
                    unit_price: Price::new(item.precio),
                    quantity: item.cantidad,
                })
                .collect(),
            total: Price::new(raw.total),
            status: raw
                .estado
                .as_deref()
                .map_or_else(OrderStatus::default, OrderStatus::from),
            created_at: raw.created_at,
        }
    }
}

/// Body for `PUT /pedidos/{id}`.
#[derive(Debug, Serialize)]
pub struct OrderStatusUpdate<'a> {
    pub estado: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_product_maps_field_by_field() {
        let raw: Vec<RawProduct> = serde_json::from_str(
            r#"[{"_id":"p1","nombre":"Widget","precio":9.99,"imagen":"w.png"}]"#,
        )
        .unwrap();
        let products: Vec<Product> = raw.into_iter().map(Product::from).collect();

        assert_eq!(
            products,
            vec![Product::new("p1", "Widget", Price::from_cents(999), "w.png")]
        );
    }

    #[test]
    fn test_raw_product_ignores_unknown_fields_and_keeps_extras() {
        let raw: RawProduct = serde_json::from_str(
            r#"{"_id":"p2","nombre":"Gadget","precio":12,"imagen":"g.png",
                "descripcion":"Shiny","stock":4,"categoria":"tools","__v":0}"#,
        )
        .unwrap();
        let product = Product::from(raw);

        assert_eq!(product.price, Price::from_cents(1200));
        assert_eq!(product.description.as_deref(), Some("Shiny"));
        assert_eq!(product.stock, Some(4));
    }

    #[test]
    fn test_login_response_role() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"token":"t","username":"ana","role":"admin","userId":"u1"}"#,
        )
        .unwrap();
        assert_eq!(response.role(), Role::Admin);
        assert!(!format!("{response:?}").contains("\"t\""));

        let response: LoginResponse =
            serde_json::from_str(r#"{"token":"t","username":"bo","userId":"u2"}"#).unwrap();
        assert_eq!(response.role(), Role::Customer);
    }

    #[test]
    fn test_raw_order_defaults() {
        let raw: RawOrder = serde_json::from_str(
            r#"{"_id":"o1","total":19.98,"items":[{"productId":"p1","nombre":"Widget","precio":9.99,"cantidad":2}]}"#,
        )
        .unwrap();
        let order = Order::from(raw);

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.total, Price::from_cents(1998));
        assert!(order.user_id.is_none());
    }

    #[test]
    fn test_update_user_request_skips_unchanged_fields() {
        let body = UpdateUserRequest {
            email: Some("new@example.com"),
            ..UpdateUserRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"email": "new@example.com"})
        );
        assert!(UpdateUserRequest::default().is_empty());
    }
}
