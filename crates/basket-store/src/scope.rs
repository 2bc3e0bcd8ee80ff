//! # Cart Scope
//!
//! Scoped lookup of the active [`CartHandle`] for code that cannot have the
//! handle passed in.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  with_cart_scope(handle, async {                                       │
//! │      ...                                                               │
//! │      let cart = use_cart()?;     ← Ok(handle)                          │
//! │      cart.add_to_cart(item).await?;                                    │
//! │  }).await;                                                             │
//! │                                                                         │
//! │  use_cart()                      ← Err(CartError::OutsideScope)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scope is task-local: tasks spawned inside it do not inherit it and
//! must be handed a clone of the handle, or open their own scope.

use std::future::Future;

use crate::error::{CartError, CartResult};
use crate::handle::CartHandle;

tokio::task_local! {
    static ACTIVE_CART: CartHandle;
}

/// Runs `future` with `handle` as the active cart.
pub async fn with_cart_scope<F>(handle: CartHandle, future: F) -> F::Output
where
    F: Future,
{
    ACTIVE_CART.scope(handle, future).await
}

/// Runs `f` synchronously with `handle` as the active cart.
pub fn with_cart_scope_sync<R>(handle: CartHandle, f: impl FnOnce() -> R) -> R {
    ACTIVE_CART.sync_scope(handle, f)
}

/// Returns the active cart.
///
/// ## Errors
/// [`CartError::OutsideScope`] when called outside [`with_cart_scope`], or
/// when the scoped store has already shut down.
pub fn use_cart() -> CartResult<CartHandle> {
    let handle = ACTIVE_CART
        .try_with(CartHandle::clone)
        .map_err(|_| CartError::OutsideScope)?;

    if handle.is_closed() {
        return Err(CartError::OutsideScope);
    }

    Ok(handle)
}
