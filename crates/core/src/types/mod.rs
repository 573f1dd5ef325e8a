//! Core types for Carrito.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod id;
pub mod price;
pub mod role;

pub use account::{AccountError, Email, Password, Username};
pub use id::*;
pub use price::Price;
pub use role::Role;
