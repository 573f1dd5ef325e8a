//! Product and order management (admin role required).
//!
//! Non-admin sessions never reach these handlers: [`RequireAdmin`] renders
//! the access-denied page instead. Mutations forward the admin's token so
//! the backend can enforce the role on its side as well.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use carrito_core::{OrderId, OrderStatus, Product, ProductId};

use crate::api::types::ProductInput;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::account::OrderView;
use crate::state::AppState;
use crate::views::Chrome;

// =============================================================================
// Form Types
// =============================================================================

/// Product create/update form data.
#[derive(Debug, Deserialize, Default)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: String,
}

impl ProductForm {
    /// Validate into a backend request body.
    fn input(&self) -> std::result::Result<ProductInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Product name is required".to_string());
        }

        let price: Decimal = self
            .price
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a valid price", self.price.trim()))?;
        if price < Decimal::ZERO {
            return Err("Price cannot be negative".to_string());
        }

        let stock = match self.stock.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i64>()
                    .ok()
                    .filter(|n| *n >= 0)
                    .ok_or_else(|| format!("'{raw}' is not a valid stock count"))?,
            ),
        };

        let description = self.description.trim();
        Ok(ProductInput {
            nombre: name.to_string(),
            precio: price,
            imagen: self.image.trim().to_string(),
            descripcion: (!description.is_empty()).then(|| description.to_string()),
            stock,
        })
    }
}

/// Order status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub estado: String,
}

/// Query parameters for notice display after a redirect.
#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

fn notice_text(code: Option<&str>) -> Option<String> {
    let text = match code? {
        "created" => "Product created",
        "updated" => "Product updated",
        "deleted" => "Product deleted",
        "status" => "Order status updated",
        _ => return None,
    };
    Some(text.to_string())
}

// =============================================================================
// Templates
// =============================================================================

/// Product row for the management table.
pub struct AdminProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    /// Raw decimal for the edit field.
    pub price_input: String,
    pub image: String,
    pub description: String,
    pub stock: String,
}

impl From<&Product> for AdminProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            price_input: product.price.amount().to_string(),
            image: product.image.clone(),
            description: product.description.clone().unwrap_or_default(),
            stock: product.stock.map(|n| n.to_string()).unwrap_or_default(),
        }
    }
}

/// Product management template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ManageProductsTemplate {
    pub chrome: Chrome,
    pub products: Vec<AdminProductView>,
    pub form: ProductForm,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Status option for the order table.
pub struct StatusOption {
    pub value: String,
    pub label: String,
}

/// Order management template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct ManageOrdersTemplate {
    pub chrome: Chrome,
    pub orders: Vec<OrderView>,
    pub statuses: Vec<StatusOption>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

fn status_options() -> Vec<StatusOption> {
    OrderStatus::SETTABLE
        .iter()
        .map(|status| StatusOption {
            value: status.as_str().to_string(),
            label: status.label().to_string(),
        })
        .collect()
}

async fn products_page(
    state: &AppState,
    admin: &RequireAdmin,
    form: ProductForm,
    notice: Option<String>,
    error: Option<String>,
) -> Result<ManageProductsTemplate> {
    // Fetched on its own; the shared catalog only follows the home view.
    let (products, error) = match state.backend().list_products().await {
        Ok(products) => (products.iter().map(AdminProductView::from).collect(), error),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products for management");
            (Vec::new(), error.or_else(|| Some(e.user_message())))
        }
    };

    Ok(ManageProductsTemplate {
        chrome: admin.ctx.chrome().await?,
        products,
        form,
        notice,
        error,
    })
}

// =============================================================================
// Product Routes
// =============================================================================

/// Display the product management screen.
#[instrument(skip(state, admin))]
pub async fn products(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<NoticeQuery>,
) -> Result<ManageProductsTemplate> {
    products_page(
        &state,
        &admin,
        ProductForm::default(),
        notice_text(query.notice.as_deref()),
        None,
    )
    .await
}

/// Create a product.
#[instrument(skip(state, admin))]
pub async fn create_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.input() {
        Ok(input) => input,
        Err(message) => {
            return Ok(products_page(&state, &admin, form, None, Some(message))
                .await?
                .into_response());
        }
    };

    match state
        .backend()
        .create_product(&admin.user.token, &input)
        .await
    {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            add_breadcrumb(
                "admin",
                "Product created",
                Some(&[("product_id", product.id.as_str())]),
            );
            state.catalog().invalidate().await;
            Ok(Redirect::to("/manage-products?notice=created").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Product creation rejected");
            Ok(
                products_page(&state, &admin, form, None, Some(e.user_message()))
                    .await?
                    .into_response(),
            )
        }
    }
}

/// Update a product.
#[instrument(skip(state, admin))]
pub async fn update_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let id = ProductId::new(id);
    let result = match form.input() {
        Ok(input) => state
            .backend()
            .update_product(&admin.user.token, &id, &input)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Product update rejected");
                e.user_message()
            }),
        Err(message) => Err(message),
    };

    match result {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product updated");
            state.catalog().invalidate().await;
            Ok(Redirect::to("/manage-products?notice=updated").into_response())
        }
        Err(message) => Ok(products_page(
            &state,
            &admin,
            ProductForm::default(),
            None,
            Some(format!("{id}: {message}")),
        )
        .await?
        .into_response()),
    }
}

/// Delete a product.
#[instrument(skip(state, admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ProductId::new(id);
    match state.backend().delete_product(&admin.user.token, &id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            state.catalog().invalidate().await;
            Ok(Redirect::to("/manage-products?notice=deleted").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Product deletion rejected");
            Ok(products_page(
                &state,
                &admin,
                ProductForm::default(),
                None,
                Some(e.user_message()),
            )
            .await?
            .into_response())
        }
    }
}

// =============================================================================
// Order Routes
// =============================================================================

/// Display the order management screen.
#[instrument(skip(state, admin))]
pub async fn orders(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<NoticeQuery>,
) -> Result<ManageOrdersTemplate> {
    let (orders, error) = match state.backend().all_orders(&admin.user.token).await {
        Ok(orders) => (orders.iter().map(OrderView::from).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            (Vec::new(), Some(e.user_message()))
        }
    };

    Ok(ManageOrdersTemplate {
        chrome: admin.ctx.chrome().await?,
        orders,
        statuses: status_options(),
        notice: notice_text(query.notice.as_deref()),
        error,
    })
}

/// Set an order's status.
#[instrument(skip(state, admin))]
pub async fn update_order_status(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let id = OrderId::new(id);
    let status = OrderStatus::from(form.estado.as_str());
    state
        .backend()
        .update_order_status(&admin.user.token, &id, &status)
        .await?;

    tracing::info!(order_id = %id, status = %status, "Order status updated");
    Ok(Redirect::to("/manage-orders?notice=status").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str, stock: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            price: price.to_string(),
            image: " w.png ".to_string(),
            description: String::new(),
            stock: stock.to_string(),
        }
    }

    #[test]
    fn test_product_form_builds_input() {
        let input = form(" Widget ", "9.99", "4").input().unwrap();
        assert_eq!(input.nombre, "Widget");
        assert_eq!(input.precio, Decimal::new(999, 2));
        assert_eq!(input.imagen, "w.png");
        assert_eq!(input.stock, Some(4));
        assert!(input.descripcion.is_none());
    }

    #[test]
    fn test_product_form_rejects_bad_fields() {
        assert!(form("", "9.99", "").input().is_err());
        assert!(form("Widget", "cheap", "").input().is_err());
        assert!(form("Widget", "-1", "").input().is_err());
        assert!(form("Widget", "1", "-3").input().is_err());
    }

    #[test]
    fn test_status_options_cover_settable_statuses() {
        let options = status_options();
        assert_eq!(options.len(), OrderStatus::SETTABLE.len());
        for (option, status) in options.iter().zip(OrderStatus::SETTABLE.iter()) {
            assert_eq!(option.value, status.as_str());
            assert_eq!(option.label, status.label());
        }
    }

    #[test]
    fn test_notice_text() {
        assert_eq!(notice_text(Some("created")).as_deref(), Some("Product created"));
        assert_eq!(notice_text(Some("bogus")), None);
        assert_eq!(notice_text(None), None);
    }
}
