//! Display data handed to templates.

use atelier_core::{CartItem, Product};

use super::theme::{Palette, Theme};
use crate::cart::CartSnapshot;
use crate::storefront::Storefront;

/// Data every page needs: palette and navbar state.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub theme: Theme,
    pub palette: Palette,
    pub nav: NavView,
}

impl PageContext {
    #[must_use]
    pub fn new(theme: Theme, storefront: &Storefront) -> Self {
        Self {
            theme,
            palette: theme.palette(),
            nav: NavView::from_storefront(storefront),
        }
    }
}

/// Navbar state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavView {
    pub signed_in: bool,
    pub is_admin: bool,
    pub cart_count: usize,
}

impl NavView {
    #[must_use]
    pub fn from_storefront(storefront: &Storefront) -> Self {
        let role = storefront.session().role();
        Self {
            signed_in: role.is_some(),
            is_admin: role.is_some_and(|r| r.is_admin()),
            cart_count: storefront.cart().len(),
        }
    }
}

/// One card in the catalog grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    /// Already in the shopper's bag; the add button is disabled.
    pub in_bag: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, in_bag: bool) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            image: product.image.clone(),
            in_bag,
        }
    }

    /// Button label for the add action.
    #[must_use]
    pub const fn button_label(&self) -> &'static str {
        if self.in_bag { "Added to Bag" } else { "Add to Bag" }
    }
}

/// Build the catalog grid, marking products already in the cart.
#[must_use]
pub fn catalog_cards(products: &[Product], cart: &CartSnapshot) -> Vec<ProductCardView> {
    products
        .iter()
        .map(|p| ProductCardView::new(p, cart.contains(&p.id)))
        .collect()
}

/// One line of the cart page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            price: item.price.to_string(),
            image: item.image.clone(),
        }
    }
}

/// Cart page contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: usize,
    pub total: String,
    /// The last refresh failed; contents may be out of date.
    pub stale: bool,
    pub loading: bool,
}

impl From<&CartSnapshot> for CartView {
    fn from(snapshot: &CartSnapshot) -> Self {
        Self {
            items: snapshot.items.iter().map(CartItemView::from).collect(),
            item_count: snapshot.items.len(),
            total: snapshot.total().to_string(),
            stale: snapshot.stale,
            loading: snapshot.loading,
        }
    }
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One row of the admin inventory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRowView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
}

impl From<&Product> for InventoryRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            image: product.image.clone(),
        }
    }
}

/// Flash message shown after a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Success(String),
    Error(String),
}

impl Flash {
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Error(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartPhase;
    use crate::testing::{cart_item, product};
    use atelier_core::Price;

    #[test]
    fn test_catalog_marks_items_in_bag() {
        let products = vec![product("p1", 1000), product("p2", 2000)];
        let cart = CartSnapshot {
            items: vec![cart_item("p2", 2000)],
            phase: CartPhase::Synced,
            loading: false,
            stale: false,
        };

        let cards = catalog_cards(&products, &cart);
        assert!(!cards[0].in_bag);
        assert_eq!(cards[0].button_label(), "Add to Bag");
        assert!(cards[1].in_bag);
        assert_eq!(cards[1].button_label(), "Added to Bag");
        assert_eq!(cards[1].price, "$20.00");
    }

    #[test]
    fn test_cart_view_totals() {
        let snapshot = CartSnapshot {
            items: vec![cart_item("p1", 1050), cart_item("p2", 200)],
            phase: CartPhase::Synced,
            loading: false,
            stale: true,
        };

        let view = CartView::from(&snapshot);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.total, Price::from_cents(1250).to_string());
        assert!(view.stale);
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::from(&CartSnapshot::default());
        assert!(view.is_empty());
        assert_eq!(view.total, "$0.00");
    }

    #[test]
    fn test_flash_text() {
        let flash = Flash::Error("Failed to add product".to_string());
        assert!(flash.is_error());
        assert_eq!(flash.text(), "Failed to add product");
    }
}
