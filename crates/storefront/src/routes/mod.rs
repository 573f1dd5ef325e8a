//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog (refreshes the product list)
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add units of a catalog product
//! POST /cart/remove            - Remove a product's line
//! POST /cart/reduce            - Take one unit off a product's line
//! POST /cart/menu/close        - Hide the cart flyout
//! GET  /cart/count             - Cart count badge (HTMX fragment)
//!
//! # Checkout
//! GET  /invoice                - Invoice form
//! POST /invoice                - Issue invoice (and place order when logged in)
//! GET  /invoice-pdf            - Printable invoice
//! GET  /sales-report           - Sales report
//!
//! # Auth
//! GET  /register               - Register page
//! POST /register               - Register action
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! POST /logout                 - Logout action
//! GET  /session/events         - Session change stream (SSE)
//!
//! # Account (requires login)
//! GET  /pedidos                - My orders
//! GET  /update-user            - Account form
//! POST /update-user            - Update account
//!
//! # Admin (requires admin role, 403 page otherwise)
//! GET  /manage-products                  - Product management
//! POST /manage-products                  - Create product
//! POST /manage-products/{id}             - Update product
//! POST /manage-products/{id}/delete      - Delete product
//! GET  /manage-orders                    - Order management
//! POST /manage-orders/{id}/status        - Set order status
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod events;
pub mod home;
pub mod invoice;
pub mod sales;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/reduce", post(cart::reduce))
        .route("/menu/close", post(cart::close_menu))
        .route("/count", get(cart::count))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/manage-products",
            get(admin::products).post(admin::create_product),
        )
        .route("/manage-products/{id}", post(admin::update_product))
        .route("/manage-products/{id}/delete", post(admin::delete_product))
        .route("/manage-orders", get(admin::orders))
        .route("/manage-orders/{id}/status", post(admin::update_order_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/cart", cart_routes())
        // Checkout
        .route("/invoice", get(invoice::form).post(invoice::issue))
        .route("/invoice-pdf", get(invoice::printable))
        .route("/sales-report", get(sales::report))
        // Auth
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session/events", get(events::stream))
        // Account
        .route("/pedidos", get(account::orders))
        .route(
            "/update-user",
            get(account::update_user_page).post(account::update_user),
        )
        .merge(admin_routes())
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// A local path to send the visitor back to after a form post.
///
/// Only same-site absolute paths are accepted; anything else falls back to
/// `default`.
#[must_use]
pub fn safe_return_path<'a>(candidate: Option<&'a str>, default: &'a str) -> &'a str {
    match candidate {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path
        }
        _ => default,
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/cart"), "/"), "/cart");
        assert_eq!(safe_return_path(Some("/?page=2"), "/"), "/?page=2");
        assert_eq!(safe_return_path(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_return_path(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_return_path(Some("/\\evil.example"), "/"), "/");
        assert_eq!(safe_return_path(None, "/cart"), "/cart");
    }
}
