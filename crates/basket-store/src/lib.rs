//! # basket-store: Cart Lifecycle for Basket
//!
//! Runs the shopping cart: hydrates it from local storage once, applies
//! mutations one at a time, persists every change and publishes snapshots.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        basket-store (THIS CRATE)                        │
//! │                                                                         │
//! │   UI / CLI code                                                        │
//! │       │  use_cart() inside with_cart_scope(..)   (scope.rs)            │
//! │       ▼                                                                 │
//! │  ┌──────────────┐   mpsc: CartCommand   ┌───────────────────────────┐  │
//! │  │  CartHandle  │ ────────────────────► │  CartStore task (store.rs)│  │
//! │  │  (handle.rs) │ ◄──────────────────── │                           │  │
//! │  └──────────────┘   watch: CartSnapshot │  basket_core::Cart        │  │
//! │                                         │  retry + backoff          │  │
//! │                                         └────────────┬──────────────┘  │
//! │                                                      │                 │
//! │                                                      ▼                 │
//! │                              CartStorage (storage.rs)                  │
//! │                              SqliteStorage │ MemoryStorage             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The single-writer store task
//! - [`handle`] - Public handle over the store
//! - [`scope`] - Task-local access point
//! - [`storage`] - Storage trait and backends
//! - [`snapshot`] - Published cart snapshots
//! - [`config`] - Store configuration
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use basket_core::NewLineItem;
//! use basket_store::{use_cart, with_cart_scope, CartStore, MemoryStorage, StoreConfig};
//!
//! # async fn demo() -> basket_store::CartResult<()> {
//! let cart = CartStore::spawn(MemoryStorage::new(), StoreConfig::default())?;
//!
//! with_cart_scope(cart, async {
//!     let cart = use_cart()?;
//!     cart.add_to_cart(NewLineItem::new("A", "Apple", "/a.png", 1.5)).await?;
//!     cart.increment("A").await?;
//!     Ok::<_, basket_store::CartError>(())
//! })
//! .await
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod handle;
pub mod scope;
pub mod snapshot;
pub mod storage;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StoreConfig;
pub use error::{CartError, CartResult, StorageError, StorageResult};
pub use handle::CartHandle;
pub use scope::{use_cart, with_cart_scope, with_cart_scope_sync};
pub use snapshot::{CartPhase, CartSnapshot};
pub use storage::{CartStorage, MemoryStorage, SqliteStorage};
pub use store::CartStore;
