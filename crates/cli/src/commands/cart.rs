//! Cart commands. All of them need a saved session.

use std::io::Write;

use atelier_core::ProductId;
use atelier_storefront::Storefront;
use atelier_storefront::cart::{CartError, CartSnapshot};

use super::CommandError;

/// Re-fetch the cart and print it with its total.
///
/// # Errors
///
/// Returns an error if not signed in or output cannot be written. A failed
/// fetch prints the last known contents with a warning.
pub async fn show(storefront: &Storefront, out: &mut impl Write) -> Result<(), CommandError> {
    if !storefront.session().is_authenticated() {
        return Err(CartError::AuthenticationRequired.into());
    }

    if let Err(e) = storefront.cart().refresh().await {
        tracing::warn!(error = %e, "Showing last known cart");
    }
    write_cart(&storefront.cart().snapshot(), out)
}

/// Add a product and print the updated count.
///
/// # Errors
///
/// Returns an error if not signed in or the server rejects the item.
pub async fn add(
    storefront: &Storefront,
    id: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    storefront.cart().add_item(&ProductId::new(id)).await?;
    writeln!(out, "Added to bag ({})", item_count(storefront.cart().len()))?;
    Ok(())
}

/// Remove a product and print the updated count.
///
/// # Errors
///
/// Returns an error if not signed in or the server rejects the removal.
pub async fn remove(
    storefront: &Storefront,
    id: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    storefront.cart().remove_item(&ProductId::new(id)).await?;
    writeln!(out, "Removed from bag ({})", item_count(storefront.cart().len()))?;
    Ok(())
}

/// "1 item" / "N items".
pub fn item_count(count: usize) -> String {
    if count == 1 {
        "1 item".to_owned()
    } else {
        format!("{count} items")
    }
}

fn write_cart(cart: &CartSnapshot, out: &mut impl Write) -> Result<(), CommandError> {
    if cart.stale {
        writeln!(out, "Could not refresh your bag; showing the last known contents.")?;
    }
    if cart.items.is_empty() {
        writeln!(out, "Your shopping bag is empty")?;
        return Ok(());
    }

    for item in &cart.items {
        writeln!(
            out,
            "{:<26}{:>10}  {}",
            item.id.as_str(),
            item.price.to_string(),
            item.name
        )?;
    }
    writeln!(out, "{}, total {}", item_count(cart.items.len()), cart.total())?;
    Ok(())
}
