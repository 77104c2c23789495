//! Presentation components: theme palette and template view models.

mod theme;
mod views;

pub use theme::{Palette, Theme};
pub use views::{
    CartItemView, CartView, Flash, InventoryRowView, NavView, PageContext, ProductCardView,
    catalog_cards,
};
