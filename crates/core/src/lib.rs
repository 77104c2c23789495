//! Atelier Core - Shared types library.
//!
//! This crate provides the domain types used by every Atelier component:
//! - `storefront` - Local web UI for browsing, cart and the admin panel
//! - `cli` - Terminal front end over the same stores
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. The remote REST API owns the data; these types mirror its
//! JSON shapes.
//!
//! # Modules
//!
//! - [`types`] - Product identifiers, prices, roles, products and cart items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
