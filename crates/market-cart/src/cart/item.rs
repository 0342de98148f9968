//! Catalog item and cart line types.

use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::ids::ProductId;

/// Catalog data for a purchasable entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Unique item identifier.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Image reference.
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    /// Unit price, never negative.
    pub price: f64,
}

impl Item {
    /// Create a validated item.
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Result<Self, CartError> {
        let item = Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        };
        item.validate()?;
        Ok(item)
    }

    /// Check the catalog contract: non-empty id, finite non-negative price.
    pub fn validate(&self) -> Result<(), CartError> {
        check_contract(&self.id, self.price)
    }
}

fn check_contract(id: &ProductId, price: f64) -> Result<(), CartError> {
    if id.is_empty() {
        return Err(CartError::InvalidItem("item id is empty".to_string()));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(CartError::InvalidItem(format!(
            "item {id} has invalid price {price}"
        )));
    }
    Ok(())
}

/// An item in the cart together with how many of it were added.
///
/// Serialized flat, the same shape the snapshot stores:
/// `{ "id", "title", "image_url", "price", "quantity" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Item identifier; unique within a cart.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Image reference.
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    /// Unit price.
    pub price: f64,
    /// Quantity, at least 1 for any line held by a cart.
    pub quantity: u32,
}

impl CartLine {
    /// A fresh line for `item` with quantity 1.
    pub fn from_item(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            image_url: item.image_url.clone(),
            price: item.price,
            quantity: 1,
        }
    }

    /// The catalog item this line was built from.
    pub fn item(&self) -> Item {
        Item {
            id: self.id.clone(),
            title: self.title.clone(),
            image_url: self.image_url.clone(),
            price: self.price,
        }
    }

    /// Check the item fields against the catalog contract.
    pub fn validate(&self) -> Result<(), CartError> {
        check_contract(&self.id, self.price)
    }

    pub(crate) fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}
