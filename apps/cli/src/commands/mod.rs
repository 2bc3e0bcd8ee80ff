//! # CLI Commands
//!
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! └── cart.rs     ◄─── show, add, increment, decrement
//! ```
//!
//! Every command resolves the cart through `use_cart()`, so it must run
//! inside `with_cart_scope`.

pub mod cart;

pub use cart::{CartResponse, CartTotals};
