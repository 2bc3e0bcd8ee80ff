//! # Line-Item Types
//!
//! The only entity in Basket is the line-item: one product in the cart.
//!
//! ```text
//! ┌─────────────────────┐            ┌─────────────────────┐
//! │    NewLineItem      │  add_item  │      LineItem       │
//! │  ─────────────────  │ ─────────► │  ─────────────────  │
//! │  id                 │            │  id                 │
//! │  title              │            │  title              │
//! │  image_url          │            │  image_url          │
//! │  price              │            │  price              │
//! └─────────────────────┘            │  quantity (>= 1)    │
//!                                    └─────────────────────┘
//! ```
//!
//! `title`, `image_url` and `price` are opaque to the cart: they are stored
//! and returned as given. Only `id` takes part in matching.

use serde::{Deserialize, Serialize};

// =============================================================================
// Line Item
// =============================================================================

/// A product entry in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identity, the sole equality key.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Display image.
    pub image_url: String,

    /// Unit price as supplied by the caller.
    pub price: f64,

    /// Units of this product in the cart. Never zero inside a [`crate::Cart`].
    pub quantity: u32,
}

impl LineItem {
    /// Builds a line-item from a descriptor and a quantity.
    pub fn from_new(item: NewLineItem, quantity: u32) -> Self {
        LineItem {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
            quantity,
        }
    }
}

// =============================================================================
// New Line Item
// =============================================================================

/// The descriptor passed to `add_to_cart`: a line-item without a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub price: f64,
}

impl NewLineItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        NewLineItem {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

impl From<LineItem> for NewLineItem {
    fn from(item: LineItem) -> Self {
        NewLineItem {
            id: item.id,
            title: item.title,
            image_url: item.image_url,
            price: item.price,
        }
    }
}
