//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Each intent loads it, applies
//! one [`CartState`] operation and stores it back. Plain form posts are
//! answered with a redirect to `return_to`; HTMX posts get the count badge
//! with the flyout swapped in out of band, plus a `cart-updated` trigger.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use carrito_core::{CartState, ProductId, Quantity, ReduceOutcome};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::SessionContext;
use crate::routes::{is_htmx, safe_return_path};
use crate::session::{
    self,
    events::{ChangeKind, SessionChange},
};
use crate::state::AppState;
use crate::views::Chrome;

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    /// Defaults to one unit when missing or blank.
    pub quantity: Option<String>,
    pub return_to: Option<String>,
}

/// Remove or reduce form data.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub product_id: String,
    pub return_to: Option<String>,
}

/// Close flyout form data.
#[derive(Debug, Deserialize)]
pub struct CloseMenuForm {
    pub return_to: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: Chrome,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: usize,
}

/// Badge plus out-of-band flyout, the answer to HTMX cart posts.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_update.html")]
pub struct CartUpdateTemplate {
    pub count: usize,
    pub chrome: Chrome,
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse the quantity field. A cleared number input arrives as `""`.
fn parse_quantity(raw: Option<&str>) -> Result<Quantity> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Quantity::ONE),
        Some(raw) => {
            let n: i64 = raw
                .parse()
                .map_err(|_| AppError::BadRequest(format!("'{raw}' is not a quantity")))?;
            Ok(Quantity::try_from(n)?)
        }
    }
}

fn cart_update(ctx: &SessionContext, cart: &CartState, return_to: Option<&str>) -> Response {
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartUpdateTemplate {
            count: cart.cart().line_count(),
            chrome: Chrome::new(ctx.user.as_ref(), cart, safe_return_path(return_to, "/")),
        },
    )
        .into_response()
}

/// Store the cart, tell the visitor's other tabs, and answer the intent.
async fn respond(
    state: &AppState,
    ctx: &SessionContext,
    cart: &CartState,
    headers: &HeaderMap,
    return_to: Option<&str>,
) -> Result<Response> {
    session::save_cart(&ctx.session, cart).await?;

    state.events().publish(SessionChange {
        channel: session::channel_id(&ctx.session).await?,
        kind: ChangeKind::Cart,
        username: ctx.user.as_ref().map(|u| u.username.clone()),
    });

    if is_htmx(headers) {
        return Ok(cart_update(ctx, cart, return_to));
    }

    Ok(Redirect::to(safe_return_path(return_to, "/cart")).into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(ctx))]
pub async fn show(ctx: SessionContext) -> Result<CartShowTemplate> {
    Ok(CartShowTemplate {
        chrome: ctx.chrome().await?,
    })
}

/// Add units of a catalog product and open the flyout.
///
/// The product is resolved against the last loaded catalog; ids the
/// catalog does not know are rejected with 404.
#[instrument(skip(state, ctx, headers), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    ctx: SessionContext,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = parse_quantity(form.quantity.as_deref())?;
    let product_id = ProductId::new(form.product_id.trim());
    let product = state
        .catalog()
        .find(&product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let mut cart = session::load_cart(&ctx.session).await?;
    cart.add_to_cart(product, quantity);

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product_id", product_id.as_str()),
            ("quantity", quantity.get().to_string().as_str()),
        ]),
    );
    tracing::info!(quantity = quantity.get(), "Added to cart");

    respond(&state, &ctx, &cart, &headers, form.return_to.as_deref()).await
}

/// Remove a product's line. Unknown ids leave the cart unchanged.
#[instrument(skip(state, ctx, headers), fields(product_id = %form.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    ctx: SessionContext,
    headers: HeaderMap,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id.trim());
    let mut cart = session::load_cart(&ctx.session).await?;

    if cart.remove_from_cart(&product_id) {
        add_breadcrumb(
            "cart",
            "Removed from cart",
            Some(&[("product_id", product_id.as_str())]),
        );
    } else {
        tracing::debug!("Remove ignored, product not in cart");
    }

    respond(&state, &ctx, &cart, &headers, form.return_to.as_deref()).await
}

/// Take one unit off a product's line; a single unit removes the line.
#[instrument(skip(state, ctx, headers), fields(product_id = %form.product_id))]
pub async fn reduce(
    State(state): State<AppState>,
    ctx: SessionContext,
    headers: HeaderMap,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let product_id = ProductId::new(form.product_id.trim());
    let mut cart = session::load_cart(&ctx.session).await?;

    match cart.reduce_quantity(&product_id) {
        ReduceOutcome::Reduced | ReduceOutcome::Removed => {
            add_breadcrumb(
                "cart",
                "Reduced quantity",
                Some(&[("product_id", product_id.as_str())]),
            );
        }
        ReduceOutcome::Missing => {
            tracing::debug!("Reduce ignored, product not in cart");
        }
    }

    respond(&state, &ctx, &cart, &headers, form.return_to.as_deref()).await
}

/// Hide the cart flyout.
#[instrument(skip(ctx, headers))]
pub async fn close_menu(
    ctx: SessionContext,
    headers: HeaderMap,
    Form(form): Form<CloseMenuForm>,
) -> Result<Response> {
    let mut cart = session::load_cart(&ctx.session).await?;
    cart.close_cart_menu();
    session::save_cart(&ctx.session, &cart).await?;

    if is_htmx(&headers) {
        return Ok(cart_update(&ctx, &cart, form.return_to.as_deref()));
    }
    Ok(Redirect::to(safe_return_path(form.return_to.as_deref(), "/")).into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(ctx))]
pub async fn count(ctx: SessionContext) -> Result<CartCountTemplate> {
    let cart = session::load_cart(&ctx.session).await?;
    Ok(CartCountTemplate {
        count: cart.cart().line_count(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_quantity_means_one_unit() {
        assert_eq!(parse_quantity(None).unwrap(), Quantity::ONE);
        assert_eq!(parse_quantity(Some("")).unwrap(), Quantity::ONE);
        assert_eq!(parse_quantity(Some("  ")).unwrap(), Quantity::ONE);
        assert_eq!(parse_quantity(Some(" 3 ")).unwrap().get(), 3);
    }

    #[test]
    fn test_bad_quantity_is_rejected() {
        assert!(matches!(parse_quantity(Some("0")), Err(AppError::Quantity(_))));
        assert!(matches!(parse_quantity(Some("-2")), Err(AppError::Quantity(_))));
        assert!(matches!(parse_quantity(Some("two")), Err(AppError::BadRequest(_))));
    }
}
