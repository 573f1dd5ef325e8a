//! Backend catalog checks.
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - backend base URL (default `http://localhost:5000/api`)
//! - `BACKEND_TIMEOUT_SECS` - request timeout

use thiserror::Error;

use carrito_storefront::api::{ApiError, BackendClient};
use carrito_storefront::config::{BackendConfig, ConfigError};

/// Errors that can occur while listing the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] ApiError),
}

/// Fetch the product list and print one line per product.
pub async fn list() -> Result<(), CatalogError> {
    dotenvy::dotenv().ok();

    let config = BackendConfig::from_env()?;
    tracing::info!(api_url = %config.api_url, "Fetching catalog...");

    let client = BackendClient::new(&config)?;
    let products = client.list_products().await?;

    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            println!("{:<24} {:>10}  {}", product.id, product.price.to_string(), product.name);
        }
        println!("{} products", products.len());
    }
    Ok(())
}
