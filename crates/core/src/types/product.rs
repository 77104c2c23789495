//! Catalog products and cart entries.
//!
//! The remote API identifies both by the product's database ID, serialized
//! under the `_id` key. `id` is accepted as an alias on input.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Image URL.
    pub image: String,
}

/// A product entry held in the shopper's cart.
///
/// Same shape as [`Product`]; kept separate so cart contents can only come
/// from a cart response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Image URL.
    pub image: String,
}

impl From<Product> for CartItem {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            image: product.image,
        }
    }
}

/// Errors that can occur when building a [`NewProduct`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// The product name is blank.
    #[error("product name cannot be empty")]
    EmptyName,
    /// The image URL is blank.
    #[error("product image URL cannot be empty")]
    EmptyImage,
}

/// Admin input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub image: String,
}

impl NewProduct {
    /// Build a product submission, trimming the text fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or image URL is blank after trimming.
    pub fn new(name: &str, price: Price, image: &str) -> Result<Self, ProductError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductError::EmptyName);
        }
        let image = image.trim();
        if image.is_empty() {
            return Err(ProductError::EmptyImage);
        }
        Ok(Self {
            name: name.to_owned(),
            price,
            image: image.to_owned(),
        })
    }
}
