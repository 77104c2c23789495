//! Core types for Atelier.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod role;

pub use id::*;
pub use price::{Price, PriceError};
pub use product::{CartItem, NewProduct, Product, ProductError};
pub use role::Role;
