//! Display data shared by every page template.
//!
//! Templates never see core types directly; prices are pre-formatted and
//! roles are reduced to what the header needs.

use carrito_core::{Cart, CartState, LineItem, Product};

use crate::session::SessionUser;

/// Product card data for the catalog grid.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub description: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            image: product.image.clone(),
            description: product.description.clone(),
        }
    }
}

/// One cart line.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&LineItem> for CartLineView {
    fn from(line: &LineItem) -> Self {
        Self {
            product_id: line.product.id.to_string(),
            name: line.product.name.clone(),
            image: line.product.image.clone(),
            quantity: line.quantity.get(),
            unit_price: line.product.price.to_string(),
            line_total: line.line_total().to_string(),
        }
    }
}

/// Cart display data.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    /// Distinct products, shown on the header badge.
    pub line_count: usize,
    pub total_quantity: u64,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            subtotal: cart.subtotal().to_string(),
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
        }
    }
}

/// The logged-in user as the header shows them.
#[derive(Clone)]
pub struct HeaderUser {
    pub username: String,
    pub role: String,
    pub is_admin: bool,
}

impl From<&SessionUser> for HeaderUser {
    fn from(user: &SessionUser) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role.to_string(),
            is_admin: user.role.is_admin(),
        }
    }
}

/// Header, flyout and navigation data for the base layout.
#[derive(Clone)]
pub struct Chrome {
    pub user: Option<HeaderUser>,
    pub cart: CartView,
    pub flyout_visible: bool,
    /// Path of the page being rendered; cart forms return here.
    pub current_path: String,
}

impl Chrome {
    #[must_use]
    pub fn new(user: Option<&SessionUser>, cart: &CartState, current_path: &str) -> Self {
        Self {
            user: user.map(HeaderUser::from),
            cart: CartView::from(cart.cart()),
            flyout_visible: cart.flyout_visible(),
            current_path: current_path.to_string(),
        }
    }

    /// Whether the admin links should be shown.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use carrito_core::{Price, Quantity, Role, UserId};

    use super::*;

    #[test]
    fn test_cart_view_formats_prices() {
        let mut state = CartState::default();
        state.add_to_cart(
            Product::new("p1", "Widget", Price::from_cents(999), "w.png"),
            Quantity::new(3).unwrap(),
        );

        let view = CartView::from(state.cart());
        assert_eq!(view.lines[0].unit_price, "$9.99");
        assert_eq!(view.lines[0].line_total, "$29.97");
        assert_eq!(view.subtotal, "$29.97");
        assert_eq!(view.line_count, 1);
        assert_eq!(view.total_quantity, 3);
    }

    #[test]
    fn test_chrome_admin_flag() {
        let user = SessionUser {
            username: "ana".to_string(),
            role: Role::Admin,
            token: "t".to_string(),
            user_id: UserId::new("u1"),
        };
        let chrome = Chrome::new(Some(&user), &CartState::default(), "/");
        assert!(chrome.is_admin());
        assert_eq!(chrome.user.unwrap().role, "admin");

        let anonymous = Chrome::new(None, &CartState::default(), "/");
        assert!(!anonymous.is_admin());
        assert!(anonymous.cart.is_empty());
    }
}
