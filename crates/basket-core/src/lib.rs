//! # basket-core: Pure Cart Logic for Basket
//!
//! This crate is the **heart** of Basket. It contains the cart rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Basket Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Consumers (UI, CLI, services)                  │   │
//! │  │        render products ◄── snapshot    add / inc / dec ──►      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CartHandle                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 basket-store (CartStore actor)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ basket-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐      ┌───────────┐      ┌───────────┐          │   │
//! │  │   │   types   │      │   cart    │      │   codec   │          │   │
//! │  │   │ LineItem  │      │   Cart    │      │  encode   │          │   │
//! │  │   │ NewLine.. │      │ Mutation  │      │  decode   │          │   │
//! │  │   └───────────┘      └───────────┘      └───────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 basket-db (SQLite key-value slots)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Line-item types
//! - [`cart`] - The cart and its three mutations
//! - [`codec`] - The persisted blob format
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use basket_core::{Cart, Mutation, NewLineItem};
//!
//! let mut cart = Cart::new();
//! let coffee = NewLineItem::new("A", "Coffee", "https://img/a.png", 10.0);
//!
//! assert_eq!(cart.add_item(coffee.clone()).unwrap(), Mutation::Added);
//! assert_eq!(
//!     cart.add_item(coffee).unwrap(),
//!     Mutation::Incremented { quantity: 2 }
//! );
//! assert_eq!(cart.item_count(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod codec;
pub mod error;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, Mutation, Repairs};
pub use error::{CoreError, CoreResult};
pub use types::{LineItem, NewLineItem};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Namespace used for the storage key when none is configured.
pub const DEFAULT_NAMESPACE: &str = "basket";

/// Suffix of the storage key; the full key is `"<namespace>:products"`.
pub const PRODUCTS_KEY_SUFFIX: &str = "products";

/// Builds the storage key holding the cart blob for a namespace.
///
/// ```rust
/// assert_eq!(basket_core::products_key("shop"), "shop:products");
/// ```
pub fn products_key(namespace: &str) -> String {
    format!("{}:{}", namespace, PRODUCTS_KEY_SUFFIX)
}
