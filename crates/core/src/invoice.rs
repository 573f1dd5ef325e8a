//! Invoice snapshots taken from a cart at checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::types::{Price, ProductId};

/// Errors raised while building an invoice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvoiceError {
    /// Checkout was attempted with nothing in the cart.
    #[error("cannot invoice an empty cart")]
    EmptyCart,
    /// A required buyer field was left blank.
    #[error("missing buyer field: {0}")]
    MissingField(&'static str),
    /// The tax rate is negative or above 100%.
    #[error("tax rate out of range: {0}")]
    InvalidTaxRate(Decimal),
}

/// Buyer details captured by the invoice form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerDetails {
    /// Full name or business name.
    pub name: String,
    /// Tax or identity document number.
    pub document_id: String,
    /// Billing address.
    pub address: String,
    /// Contact email.
    pub email: String,
    /// Free-form payment method label ("cash", "card", ...).
    pub payment_method: String,
}

impl BuyerDetails {
    /// Trim every field and check the required ones are present.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceError::MissingField`] naming the first blank field
    /// among name, document id and payment method.
    pub fn validated(self) -> Result<Self, InvoiceError> {
        let details = Self {
            name: self.name.trim().to_owned(),
            document_id: self.document_id.trim().to_owned(),
            address: self.address.trim().to_owned(),
            email: self.email.trim().to_owned(),
            payment_method: self.payment_method.trim().to_owned(),
        };

        for (field, value) in [
            ("name", &details.name),
            ("document_id", &details.document_id),
            ("payment_method", &details.payment_method),
        ] {
            if value.is_empty() {
                return Err(InvoiceError::MissingField(field));
            }
        }

        Ok(details)
    }
}

/// One invoiced product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
}

/// A frozen copy of the cart with totals and buyer details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Human-facing invoice number.
    pub number: String,
    /// When the invoice was issued.
    pub issued_at: DateTime<Utc>,
    /// Who is being billed.
    pub buyer: BuyerDetails,
    /// Invoiced lines in cart order.
    pub lines: Vec<InvoiceLine>,
    /// Sum of line totals.
    pub subtotal: Price,
    /// Tax rate applied to the subtotal (0.19 = 19%).
    pub tax_rate: Decimal,
    /// Tax amount, rounded to cents.
    pub tax: Price,
    /// Subtotal plus tax.
    pub total: Price,
}

impl Invoice {
    /// Build an invoice from the current cart contents.
    ///
    /// The cart is only read; checkout does not empty it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or the tax rate is outside
    /// `0..=1`.
    pub fn from_cart(
        cart: &Cart,
        buyer: BuyerDetails,
        tax_rate: Decimal,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, InvoiceError> {
        if cart.is_empty() {
            return Err(InvoiceError::EmptyCart);
        }
        if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
            return Err(InvoiceError::InvalidTaxRate(tax_rate));
        }

        let lines: Vec<InvoiceLine> = cart
            .lines()
            .iter()
            .map(|line| InvoiceLine {
                product_id: line.product.id.clone(),
                name: line.product.name.clone(),
                unit_price: line.product.price,
                quantity: line.quantity.get(),
                line_total: line.line_total(),
            })
            .collect();

        let subtotal = cart.subtotal();
        let tax = Price::new((subtotal * tax_rate).amount().round_dp(2));

        Ok(Self {
            number: invoice_number(issued_at),
            issued_at,
            buyer,
            lines,
            subtotal,
            tax_rate,
            tax,
            total: subtotal + tax,
        })
    }

    /// Tax rate as a whole-number percentage for display.
    #[must_use]
    pub fn tax_percent(&self) -> Decimal {
        self.tax_rate.saturating_mul(Decimal::ONE_HUNDRED).normalize()
    }
}

/// `FAC-YYYYMMDD-XXXXXXXX`, the suffix drawn from a random UUID.
fn invoice_number(issued_at: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect();
    format!(
        "FAC-{}-{}",
        issued_at.format("%Y%m%d"),
        suffix.to_uppercase()
    )
}
