//! Carrito Core - Shared domain types.
//!
//! This crate provides the types used across all Carrito components:
//! - `storefront` - Server-rendered storefront (catalog, cart, checkout, admin screens)
//! - `cli` - Command-line tools for session migrations and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O, no
//! HTTP clients, no session storage. The cart rules live here so they can be
//! tested without a running server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, roles and account fields
//! - [`product`] - The normalized catalog product
//! - [`cart`] - Cart line-items and the cart state container
//! - [`invoice`] - Invoice snapshots taken from a cart at checkout
//! - [`order`] - Orders reported by the backend
//! - [`sales`] - Sales report series and summary

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod invoice;
pub mod order;
pub mod product;
pub mod sales;
pub mod types;

pub use cart::{Cart, CartState, LineItem, Quantity, QuantityError, ReduceOutcome};
pub use invoice::{BuyerDetails, Invoice, InvoiceError, InvoiceLine};
pub use order::{Order, OrderItem, OrderStatus};
pub use product::Product;
pub use sales::{SalesPoint, SalesSummary};
pub use types::*;
