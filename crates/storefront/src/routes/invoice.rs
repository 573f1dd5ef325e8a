//! Checkout: invoice form, order placement and printable invoice.
//!
//! Issuing an invoice freezes the cart into an [`Invoice`], stores it and
//! the payment details in the session and, for logged-in visitors, places
//! the order with the backend. The cart is left as it is.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use carrito_core::{BuyerDetails, Invoice, InvoiceLine};

use crate::api::types::NewOrder;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::SessionContext;
use crate::session::{self, IssuedInvoice, PaymentInfo};
use crate::state::AppState;
use crate::views::Chrome;

// =============================================================================
// Form Types
// =============================================================================

/// Invoice form data.
#[derive(Deserialize, Default)]
pub struct InvoiceForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub payment_method: String,
    /// Card or transfer reference; only kept in the session.
    #[serde(default)]
    pub payment_reference: String,
}

impl std::fmt::Debug for InvoiceForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceForm")
            .field("payment_method", &self.payment_method)
            .finish_non_exhaustive()
    }
}

impl InvoiceForm {
    fn buyer(&self) -> BuyerDetails {
        BuyerDetails {
            name: self.name.clone(),
            document_id: self.document_id.clone(),
            address: self.address.clone(),
            email: self.email.clone(),
            payment_method: self.payment_method.clone(),
        }
    }

    fn payment_info(&self) -> PaymentInfo {
        let mut info = PaymentInfo::new();
        info.insert("method".to_string(), self.payment_method.trim().to_string());
        if !self.payment_reference.trim().is_empty() {
            info.insert(
                "reference".to_string(),
                self.payment_reference.trim().to_string(),
            );
        }
        info
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Payment methods offered by the form.
pub const PAYMENT_METHODS: [&str; 3] = ["cash", "card", "transfer"];

/// Invoice form template.
#[derive(Template, WebTemplate)]
#[template(path = "invoice/form.html")]
pub struct InvoiceFormTemplate {
    pub chrome: Chrome,
    pub form: InvoiceForm,
    pub tax_percent: String,
    pub payment_methods: &'static [&'static str],
    pub error: Option<String>,
}

impl InvoiceFormTemplate {
    /// Whether `method` is the one currently chosen on the form.
    pub fn is_selected(&self, method: &str) -> bool {
        self.form.payment_method == method
    }
}

/// Invoice line display data.
pub struct InvoiceLineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&InvoiceLine> for InvoiceLineView {
    fn from(line: &InvoiceLine) -> Self {
        Self {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.to_string(),
            line_total: line.line_total.to_string(),
        }
    }
}

/// Printable invoice template.
#[derive(Template, WebTemplate)]
#[template(path = "invoice/print.html")]
pub struct InvoicePrintTemplate {
    pub number: String,
    pub issued_at: String,
    pub buyer: BuyerDetails,
    pub lines: Vec<InvoiceLineView>,
    pub subtotal: String,
    pub tax_percent: String,
    pub tax: String,
    pub total: String,
    pub order_id: Option<String>,
}

impl From<&IssuedInvoice> for InvoicePrintTemplate {
    fn from(issued: &IssuedInvoice) -> Self {
        let invoice = &issued.invoice;
        Self {
            number: invoice.number.clone(),
            issued_at: invoice.issued_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            buyer: invoice.buyer.clone(),
            lines: invoice.lines.iter().map(InvoiceLineView::from).collect(),
            subtotal: invoice.subtotal.to_string(),
            tax_percent: invoice.tax_percent().to_string(),
            tax: invoice.tax.to_string(),
            total: invoice.total.to_string(),
            order_id: issued.order_id.as_ref().map(ToString::to_string),
        }
    }
}

fn form_page(
    state: &AppState,
    chrome: Chrome,
    form: InvoiceForm,
    error: Option<String>,
) -> InvoiceFormTemplate {
    InvoiceFormTemplate {
        chrome,
        form,
        tax_percent: (state.config().tax_rate * Decimal::ONE_HUNDRED)
            .normalize()
            .to_string(),
        payment_methods: &PAYMENT_METHODS,
        error,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the invoice form with the cart summary.
#[instrument(skip(state, ctx))]
pub async fn form(
    State(state): State<AppState>,
    ctx: SessionContext,
) -> Result<InvoiceFormTemplate> {
    Ok(form_page(
        &state,
        ctx.chrome().await?,
        InvoiceForm::default(),
        None,
    ))
}

/// Issue the invoice.
///
/// Missing buyer fields and an empty cart re-render the form with a
/// message. A failed order placement also re-renders; nothing is stored in
/// that case so the visitor can retry.
#[instrument(skip(state, ctx))]
pub async fn issue(
    State(state): State<AppState>,
    ctx: SessionContext,
    Form(form): Form<InvoiceForm>,
) -> Result<Response> {
    let cart = session::load_cart(&ctx.session).await?;

    let invoice = match form
        .buyer()
        .validated()
        .and_then(|buyer| {
            Invoice::from_cart(cart.cart(), buyer, state.config().tax_rate, Utc::now())
        })
    {
        Ok(invoice) => invoice,
        Err(e) => {
            tracing::info!(error = %e, "Invoice form rejected");
            let chrome = ctx.chrome().await?;
            return Ok(form_page(&state, chrome, form, Some(e.to_string())).into_response());
        }
    };

    let order_id = match &ctx.user {
        Some(user) => {
            let order = NewOrder::from_invoice(&user.user_id, &invoice);
            match state.backend().place_order(&user.token, &order).await {
                Ok(placed) => Some(placed.id),
                Err(e) => {
                    tracing::warn!(error = %e, "Order placement failed");
                    let chrome = ctx.chrome().await?;
                    return Ok(
                        form_page(&state, chrome, form, Some(e.user_message())).into_response()
                    );
                }
            }
        }
        None => None,
    };

    add_breadcrumb(
        "checkout",
        "Invoice issued",
        Some(&[("invoice", invoice.number.as_str())]),
    );
    tracing::info!(
        invoice = %invoice.number,
        total = %invoice.total,
        order_id = order_id.as_ref().map(|id| id.as_str()),
        "Invoice issued"
    );

    session::save_payment_info(&ctx.session, &form.payment_info()).await?;
    session::save_invoice(&ctx.session, &IssuedInvoice { invoice, order_id }).await?;

    Ok(Redirect::to("/invoice-pdf").into_response())
}

/// Render the last issued invoice as a printable page.
///
/// Without an invoice in the session the visitor is sent to the form.
#[instrument(skip(ctx))]
pub async fn printable(ctx: SessionContext) -> Result<Response> {
    let Some(issued) = session::last_invoice(&ctx.session).await? else {
        return Ok(Redirect::to("/invoice").into_response());
    };

    Ok(InvoicePrintTemplate::from(&issued).into_response())
}
