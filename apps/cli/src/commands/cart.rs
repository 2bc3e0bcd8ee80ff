//! # Cart Commands
//!
//! The cart operations exposed on the command line.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  basket add --id A --title Apple --price 1.5                           │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  with_cart_scope(handle, commands::cart::add_to_cart(item))            │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │  1. use_cart() → CartHandle                                   │    │
//! │  │  2. handle.add_to_cart(item) → queued behind hydration        │    │
//! │  │  3. CartSnapshot → CartResponse (items + totals)              │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  Printed as a table, or as JSON with --json                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use basket_core::{LineItem, NewLineItem};
use basket_store::{use_cart, CartResult, CartSnapshot};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Aggregates over the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: u64,
    pub subtotal: f64,
}

impl From<&CartSnapshot> for CartTotals {
    fn from(snapshot: &CartSnapshot) -> Self {
        CartTotals {
            item_count: snapshot.item_count(),
            total_quantity: snapshot.total_quantity(),
            subtotal: snapshot
                .products
                .iter()
                .map(|item| item.price * f64::from(item.quantity))
                .sum(),
        }
    }
}

/// Cart response including items and totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub items: Vec<LineItem>,
    pub totals: CartTotals,
    /// Storage is behind the items shown.
    pub dirty: bool,
    /// When the cart slot was last written (RFC 3339), if ever.
    pub saved_at: Option<String>,
}

impl CartResponse {
    pub fn with_saved_at(mut self, saved_at: Option<String>) -> Self {
        self.saved_at = saved_at;
        self
    }
}

impl From<CartSnapshot> for CartResponse {
    fn from(snapshot: CartSnapshot) -> Self {
        CartResponse {
            totals: CartTotals::from(&snapshot),
            dirty: snapshot.dirty,
            saved_at: None,
            items: snapshot.products,
        }
    }
}

impl fmt::Display for CartResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            writeln!(f, "Cart is empty")?;
        } else {
            writeln!(
                f,
                "CART{:>52}",
                format!(
                    "{} item(s), {} unit(s)",
                    self.totals.item_count, self.totals.total_quantity
                )
            )?;
            for item in &self.items {
                writeln!(
                    f,
                    "  {:<30} {:>4} x {:>8.2} {:>10.2}",
                    format!("{} ({})", item.title, item.id),
                    item.quantity,
                    item.price,
                    item.price * f64::from(item.quantity)
                )?;
            }
            writeln!(f, "  {:<46} {:>10.2}", "Subtotal", self.totals.subtotal)?;
        }

        match (&self.saved_at, self.dirty) {
            (_, true) => writeln!(f, "  (not yet saved)"),
            (Some(saved_at), false) => writeln!(f, "  Last saved: {}", saved_at),
            (None, false) => Ok(()),
        }
    }
}

/// Shows the hydrated cart.
pub async fn show() -> CartResult<CartResponse> {
    debug!("show command");
    let cart = use_cart()?;
    Ok(cart.ready().await?.into())
}

/// Adds one unit of a product.
///
/// ## Behavior
/// - Already in cart: quantity increases by one
/// - Not in cart: appended with quantity 1
pub async fn add_to_cart(item: NewLineItem) -> CartResult<CartResponse> {
    debug!(id = %item.id, "add_to_cart command");
    let cart = use_cart()?;
    Ok(cart.add_to_cart(item).await?.into())
}

/// Adds one unit to a line-item. Unknown ids leave the cart unchanged.
pub async fn increment(id: String) -> CartResult<CartResponse> {
    debug!(id = %id, "increment command");
    let cart = use_cart()?;
    Ok(cart.increment(id).await?.into())
}

/// Removes one unit from a line-item, dropping it at zero.
pub async fn decrement(id: String) -> CartResult<CartResponse> {
    debug!(id = %id, "decrement command");
    let cart = use_cart()?;
    Ok(cart.decrement(id).await?.into())
}
