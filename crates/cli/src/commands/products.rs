//! Catalog commands.
//!
//! `add` and `delete` need an admin session; the check happens locally
//! before anything is sent.

use std::io::Write;

use atelier_core::{NewProduct, Price, Product, ProductId};
use atelier_storefront::Storefront;

use super::CommandError;

/// Print every product, marking the ones already in the cart.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn list(storefront: &Storefront, out: &mut impl Write) -> Result<(), CommandError> {
    let products = storefront.products().await?;
    if products.is_empty() {
        writeln!(out, "No products available")?;
        return Ok(());
    }

    let cart = storefront.cart().snapshot();
    for product in &products {
        writeln!(out, "{}", product_line(product, cart.contains(&product.id)))?;
    }
    Ok(())
}

/// Create a product.
///
/// # Errors
///
/// Returns an error if the input is invalid, the session is not an admin
/// session, or the server rejects the product.
pub async fn add(
    storefront: &Storefront,
    name: &str,
    price: &str,
    image: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let price: Price = price
        .parse()
        .map_err(|e| CommandError::InvalidInput(format!("Invalid price: {e}")))?;
    let product = NewProduct::new(name, price, image)
        .map_err(|e| CommandError::InvalidInput(e.to_string()))?;

    let created = storefront.create_product(&product).await?;
    match created.product_id {
        Some(id) => writeln!(out, "Product added successfully! ({id})")?,
        None => writeln!(out, "Product added successfully!")?,
    }
    Ok(())
}

/// Delete a product by ID.
///
/// # Errors
///
/// Returns an error if the session is not an admin session or the server
/// rejects the deletion.
pub async fn delete(
    storefront: &Storefront,
    id: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    storefront.delete_product(&ProductId::new(id)).await?;
    writeln!(out, "Product deleted successfully!")?;
    Ok(())
}

/// One catalog row: `<id>  <price>  <name>` plus an "In Bag" marker.
fn product_line(product: &Product, in_bag: bool) -> String {
    let marker = if in_bag { "  [In Bag]" } else { "" };
    format!(
        "{:<26}{:>10}  {}{marker}",
        product.id.as_str(),
        product.price.to_string(),
        product.name
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, price: &str, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            price: price.parse().unwrap(),
            image: "https://img.example/p.jpg".to_owned(),
        }
    }

    #[test]
    fn test_product_line_formats_price() {
        let line = product_line(&product("p1", "49.5", "Pearl Drop"), false);
        assert!(line.starts_with("p1 "));
        assert!(line.contains("$49.50"));
        assert!(line.ends_with("Pearl Drop"));
    }

    #[test]
    fn test_product_line_marks_in_bag() {
        let line = product_line(&product("p1", "10", "Hoops"), true);
        assert!(line.ends_with("[In Bag]"));
    }
}
