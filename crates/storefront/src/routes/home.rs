//! Catalog (home page) route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::SessionContext;
use crate::state::AppState;
use crate::views::{Chrome, ProductView};

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub products: Vec<ProductView>,
}

/// Display the catalog.
///
/// This is the only view that refreshes the catalog. A failed refresh
/// still renders, showing the last loaded products.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: SessionContext) -> Result<HomeTemplate> {
    let products = state.catalog().refresh().await;

    Ok(HomeTemplate {
        chrome: ctx.chrome().await?,
        products: products.iter().map(ProductView::from).collect(),
    })
}
