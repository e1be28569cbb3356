//! Data model definitions for the cart and favorites collections.
//!
//! These are the records each store keeps in memory and writes to its
//! persistence slot as a JSON array. Field order matches the persisted
//! layout the host app already reads:
//!
//! - cart slot: `[{"id", "image", "name", "price", "quantity"}, ...]`
//! - favorites slot: `[{"id", "image", "name", "price", "details"}, ...]`
//!
//! `image` is an opaque JSON value. The crate never looks inside it.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Anything stored in a persisted collection that is keyed by product id.
pub trait Keyed {
    fn id(&self) -> &str;
}

/// One product's presence in the cart.
///
/// A line always has `quantity >= 1`. The cart removes lines instead of
/// storing a zero quantity.
///
/// # Examples
///
/// ```rust
/// use storefront_core::model::CartLine;
/// use serde_json::json;
///
/// let line = CartLine {
///     id: "1".to_string(),
///     image: json!("iphone.png"),
///     name: "Phone".to_string(),
///     price: 100.0,
///     quantity: 2,
/// };
///
/// let json = serde_json::to_string(&line)?;
/// let back: CartLine = serde_json::from_str(&json)?;
/// assert_eq!(line, back);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CartLine {
    /// Stable product identifier, unique within the cart.
    pub id: String,

    /// Opaque image reference supplied by the host catalog.
    #[serde(default)]
    pub image: JsonValue,

    /// Display label.
    pub name: String,

    /// Unit price at the time the product was added.
    pub price: f64,

    pub quantity: u32,
}

impl CartLine {
    /// `price * quantity` for this line.
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

impl Keyed for CartLine {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A cart item before it has a quantity, as passed to
/// [`CartStore::add_item`](crate::cart_store::CartStore::add_item).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NewCartLine {
    pub id: String,
    #[serde(default)]
    pub image: JsonValue,
    pub name: String,
    pub price: f64,
}

impl NewCartLine {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            image: JsonValue::Null,
            name: name.into(),
            price,
        }
    }

    pub fn with_image(mut self, image: JsonValue) -> Self {
        self.image = image;
        self
    }

    pub(crate) fn into_line(self, quantity: u32) -> CartLine {
        CartLine {
            id: self.id,
            image: self.image,
            name: self.name,
            price: self.price,
            quantity,
        }
    }
}

/// One product marked as a favorite. Only `id` has meaning to the store.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FavoriteEntry {
    pub id: String,
    #[serde(default)]
    pub image: JsonValue,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub details: String,
}

impl FavoriteEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            image: JsonValue::Null,
            name: name.into(),
            price,
            details: details.into(),
        }
    }
}

impl Keyed for FavoriteEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A product from the host's static catalog.
///
/// The Product Details screen adds the product it is showing to the cart or
/// to favorites. These conversions keep that mapping in one place.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub image: JsonValue,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub details: String,
}

impl Product {
    pub fn to_cart_line(&self) -> NewCartLine {
        NewCartLine {
            id: self.id.clone(),
            image: self.image.clone(),
            name: self.name.clone(),
            price: self.price,
        }
    }

    pub fn to_favorite(&self) -> FavoriteEntry {
        FavoriteEntry {
            id: self.id.clone(),
            image: self.image.clone(),
            name: self.name.clone(),
            price: self.price,
            details: self.details.clone(),
        }
    }
}

/// Checks a price coming from outside the crate: finite and non-negative.
pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err(format!("price must be a finite number, got {price}"));
    }
    if price < 0.0 {
        return Err(format!("price must be non-negative, got {price}"));
    }
    Ok(())
}
