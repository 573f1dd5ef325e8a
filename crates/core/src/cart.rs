//! Cart line-items and the cart state container.
//!
//! # Invariants
//!
//! - At most one [`LineItem`] per distinct [`ProductId`].
//! - Every stored quantity is at least 1; a line that would drop to zero is
//!   removed instead.
//! - Lines keep the order in which their product was first added. Updating a
//!   quantity never moves a line.
//!
//! Screens never touch line-items directly: they call the operations on
//! [`CartState`] and store the result back in the visitor's session.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::{Price, ProductId};

/// Error returned when a quantity is not a positive integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("quantity must be a positive whole number (got {0})")]
pub struct QuantityError(pub i64);

/// A positive number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity, rejecting zero.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// The number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0.get()))
    }

    const fn decremented(self) -> Option<Self> {
        match NonZeroU32::new(self.0.get() - 1) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        u32::try_from(n)
            .ok()
            .and_then(Self::new)
            .ok_or(QuantityError(n))
    }
}

/// One distinct product's presence in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product as it was when first added.
    pub product: Product,
    /// Units of the product in the cart.
    pub quantity: Quantity,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity.get())
    }
}

/// What [`Cart::reduce`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOutcome {
    /// The line's quantity went down by one.
    Reduced,
    /// The line had a single unit and was removed.
    Removed,
    /// No line matched the product id; the cart is unchanged.
    Missing,
}

/// Ordered collection of line-items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of `product`.
    ///
    /// Increments the existing line for `product.id` when there is one
    /// (keeping the product data captured on first add), otherwise appends a
    /// new line at the end.
    pub fn add(&mut self, product: Product, quantity: Quantity) {
        if let Some(line) = self.line_mut(&product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(LineItem { product, quantity });
        }
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product.id != product_id);
        self.lines.len() != before
    }

    /// Take one unit off the line for `product_id`.
    ///
    /// A line holding a single unit is removed. An unknown id is a no-op.
    pub fn reduce(&mut self, product_id: &ProductId) -> ReduceOutcome {
        let Some(line) = self.line_mut(product_id) else {
            return ReduceOutcome::Missing;
        };

        if let Some(quantity) = line.quantity.decremented() {
            line.quantity = quantity;
            ReduceOutcome::Reduced
        } else {
            self.remove(product_id);
            ReduceOutcome::Removed
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|line| &line.product.id == product_id)
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut LineItem> {
        self.lines
            .iter_mut()
            .find(|line| &line.product.id == product_id)
    }

    /// Whether the cart holds a line for `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Whether the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products (what the header badge shows).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(LineItem::line_total).sum()
    }
}

/// The cart plus the flyout visibility flag.
///
/// This is what lives in the visitor's session. Adding to the cart opens
/// the flyout; only [`CartState::close_cart_menu`] closes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    cart: Cart,
    flyout_visible: bool,
}

impl CartState {
    /// The cart contents.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Whether the cart flyout should be shown.
    #[must_use]
    pub const fn flyout_visible(&self) -> bool {
        self.flyout_visible
    }

    /// Add units of a product and open the flyout.
    pub fn add_to_cart(&mut self, product: Product, quantity: Quantity) {
        self.cart.add(product, quantity);
        self.flyout_visible = true;
    }

    /// Remove a product's line. Unknown ids are ignored.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> bool {
        self.cart.remove(product_id)
    }

    /// Take one unit off a product's line. Unknown ids are ignored.
    pub fn reduce_quantity(&mut self, product_id: &ProductId) -> ReduceOutcome {
        self.cart.reduce(product_id)
    }

    /// Hide the flyout.
    pub const fn close_cart_menu(&mut self) {
        self.flyout_visible = false;
    }
}
