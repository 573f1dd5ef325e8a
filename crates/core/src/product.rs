//! Catalog product.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A product as the storefront sees it.
///
/// Normalized from the backend's wire record; never mutated after load. A
/// fresh catalog fetch replaces the whole list rather than patching entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Backend identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Image reference (URL or path served by the backend).
    pub image: String,
    /// Long description, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Units in stock, when the backend tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

impl Product {
    /// Create a product with only the fields every listing carries.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Price,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: image.into(),
            description: None,
            stock: None,
        }
    }
}
