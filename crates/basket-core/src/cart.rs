//! # Cart
//!
//! The ordered sequence of line-items and its three mutations.
//!
//! ## Mutation Outcomes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Mutations                                    │
//! │                                                                         │
//! │  add_item(new)                                                         │
//! │      ├── id present ──► increment(id) ───────► Incremented { qty }     │
//! │      └── id absent ───► items.push(qty = 1) ─► Added                   │
//! │                                                                         │
//! │  increment(id)                                                         │
//! │      ├── id present ──► qty += 1 ────────────► Incremented { qty }     │
//! │      └── id absent ───► (nothing) ───────────► NotFound                │
//! │                                                                         │
//! │  decrement(id)                                                         │
//! │      ├── qty > 1 ─────► qty -= 1 ────────────► Decremented { qty }     │
//! │      ├── qty == 1 ────► items.remove(i) ─────► Removed                 │
//! │      └── id absent ───► (nothing) ───────────► NotFound                │
//! │                                                                         │
//! │  NotFound is a normal outcome, not an error: the caller cannot tell    │
//! │  "already removed" from "never existed" and neither needs reporting.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{LineItem, NewLineItem};

// =============================================================================
// Mutation Outcome
// =============================================================================

/// What a mutation did to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum Mutation {
    /// A new line-item was appended with quantity 1.
    Added,
    /// An existing line-item gained one unit.
    Incremented { quantity: u32 },
    /// An existing line-item lost one unit and is still present.
    Decremented { quantity: u32 },
    /// The line-item's last unit was removed, and the entry with it.
    Removed,
    /// No line-item with that id; the cart is untouched.
    NotFound,
}

impl Mutation {
    /// Returns true if the cart content changed.
    pub fn changed(&self) -> bool {
        !matches!(self, Mutation::NotFound)
    }
}

// =============================================================================
// Repairs
// =============================================================================

/// Invariant repairs applied by [`Cart::from_items`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Repairs {
    /// Entries folded into an earlier entry with the same id.
    pub merged_duplicates: usize,
    /// Entries dropped because their quantity was zero.
    pub dropped_empty: usize,
}

impl Repairs {
    /// Returns true if the input already satisfied every invariant.
    pub fn is_clean(&self) -> bool {
        self.merged_duplicates == 0 && self.dropped_empty == 0
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `id` (adding the same product increases quantity)
/// - Quantity is always >= 1 (decrementing the last unit removes the item)
/// - Insertion order is preserved across every mutation
///
/// Serializes as a plain array of line-items. Deserializing goes through
/// [`Cart::from_items`], so a stored array that breaks the invariants comes
/// back repaired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Builds a cart from an arbitrary sequence, restoring the invariants.
    ///
    /// ## Repair Rules
    /// - Duplicate ids fold into the first occurrence (quantities summed,
    ///   saturating at `u32::MAX`)
    /// - Zero-quantity entries are dropped
    pub fn from_items(items: Vec<LineItem>) -> (Self, Repairs) {
        let mut repairs = Repairs::default();
        let mut cart = Cart::new();

        for item in items {
            if item.quantity == 0 {
                repairs.dropped_empty += 1;
                continue;
            }

            match cart.position(&item.id) {
                Some(index) => {
                    repairs.merged_duplicates += 1;
                    if let Some(existing) = cart.items.get_mut(index) {
                        existing.quantity = existing.quantity.saturating_add(item.quantity);
                    }
                }
                None => cart.items.push(item),
            }
        }

        (cart, repairs)
    }

    /// Adds a product, or one more unit of it if already present.
    ///
    /// ## Returns
    /// - `Ok(Mutation::Added)` for a new id
    /// - `Ok(Mutation::Incremented { .. })` for an existing id, exactly as
    ///   [`Cart::increment`] would report
    /// - `Err(CoreError::InvalidPrice)` for a non-finite price
    pub fn add_item(&mut self, item: NewLineItem) -> CoreResult<Mutation> {
        if self.position(&item.id).is_some() {
            return self.increment(&item.id);
        }

        if !item.price.is_finite() {
            return Err(CoreError::InvalidPrice {
                id: item.id,
                price: item.price,
            });
        }

        self.items.push(LineItem::from_new(item, 1));
        Ok(Mutation::Added)
    }

    /// Adds one unit to the line-item with this id.
    pub fn increment(&mut self, id: &str) -> CoreResult<Mutation> {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else {
            return Ok(Mutation::NotFound);
        };

        item.quantity = item
            .quantity
            .checked_add(1)
            .ok_or_else(|| CoreError::QuantityOverflow {
                id: id.to_string(),
                max: u32::MAX,
            })?;

        Ok(Mutation::Incremented {
            quantity: item.quantity,
        })
    }

    /// Removes one unit from the line-item with this id.
    ///
    /// The entry is removed entirely when its last unit goes.
    pub fn decrement(&mut self, id: &str) -> Mutation {
        let Some(index) = self.position(id) else {
            return Mutation::NotFound;
        };

        match self.items.get_mut(index) {
            Some(item) if item.quantity > 1 => {
                item.quantity -= 1;
                Mutation::Decremented {
                    quantity: item.quantity,
                }
            }
            _ => {
                // Vec::remove keeps the relative order of the rest
                self.items.remove(index);
                Mutation::Removed
            }
        }
    }

    /// Returns the line-item with this id.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Returns the items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the number of distinct products in the cart.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total number of units across all items.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }
}

impl From<Vec<LineItem>> for Cart {
    fn from(items: Vec<LineItem>) -> Self {
        Cart::from_items(items).0
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
