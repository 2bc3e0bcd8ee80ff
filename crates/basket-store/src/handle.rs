//! # Cart Handle
//!
//! The public surface of a running [`crate::CartStore`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CartHandle                                     │
//! │                                                                         │
//! │  reads (no round-trip)          writes (queued at call time, in order) │
//! │  ─────────────────────          ─────────────────────────────────      │
//! │  products()                     add_to_cart(item)                      │
//! │  snapshot()                     increment(id)                          │
//! │  subscribe()                    decrement(id)                          │
//! │  ready()                        flush()                                │
//! │                                 shutdown()                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cloning is cheap; every clone talks to the same store.

use basket_core::{LineItem, NewLineItem};
use std::future::Future;
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{CartError, CartResult};
use crate::snapshot::CartSnapshot;
use crate::store::{CartCommand, Reply};

/// Handle for reading and mutating the cart.
#[derive(Debug, Clone)]
pub struct CartHandle {
    command_tx: mpsc::UnboundedSender<CartCommand>,
    snapshot_rx: watch::Receiver<CartSnapshot>,
}

impl CartHandle {
    pub(crate) fn new(
        command_tx: mpsc::UnboundedSender<CartCommand>,
        snapshot_rx: watch::Receiver<CartSnapshot>,
    ) -> Self {
        CartHandle {
            command_tx,
            snapshot_rx,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current line-items in insertion order.
    pub fn products(&self) -> Vec<LineItem> {
        self.snapshot_rx.borrow().products.clone()
    }

    /// Current snapshot, including hydration phase and dirty flag.
    pub fn snapshot(&self) -> CartSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Waits until hydration has completed.
    pub async fn ready(&self) -> CartResult<CartSnapshot> {
        let mut snapshot_rx = self.snapshot_rx.clone();
        let snapshot = snapshot_rx
            .wait_for(CartSnapshot::is_ready)
            .await
            .map_err(|_| CartError::StoreClosed)?
            .clone();
        Ok(snapshot)
    }

    /// Returns true once the store has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    // =========================================================================
    // Mutations
    // =========================================================================
    //
    // Each mutation is queued when the method is called, not when the
    // returned future is first polled. Dropping the future only discards
    // the reply; the mutation is still applied and persisted.

    /// Adds one unit of `item`. Behaves exactly like [`Self::increment`]
    /// when a line-item with the same id is already in the cart.
    pub fn add_to_cart(
        &self,
        item: NewLineItem,
    ) -> impl Future<Output = CartResult<CartSnapshot>> + Send + 'static {
        self.request(|reply| CartCommand::AddToCart { item, reply })
    }

    /// Adds one unit to the line-item `id`. Unknown ids are a no-op.
    pub fn increment(
        &self,
        id: impl Into<String>,
    ) -> impl Future<Output = CartResult<CartSnapshot>> + Send + 'static {
        let id = id.into();
        self.request(|reply| CartCommand::Increment { id, reply })
    }

    /// Removes one unit from the line-item `id`, and the line-item itself
    /// when its last unit goes. Unknown ids are a no-op.
    pub fn decrement(
        &self,
        id: impl Into<String>,
    ) -> impl Future<Output = CartResult<CartSnapshot>> + Send + 'static {
        let id = id.into();
        self.request(|reply| CartCommand::Decrement { id, reply })
    }

    /// Re-persists the current cart, clearing `dirty` on success.
    pub fn flush(&self) -> impl Future<Output = CartResult<CartSnapshot>> + Send + 'static {
        self.request(|reply| CartCommand::Flush { reply })
    }

    /// Stops the store once the commands queued before this one are done.
    pub fn shutdown(&self) -> impl Future<Output = CartResult<()>> + Send + 'static {
        let (reply_tx, reply_rx) = oneshot::channel();
        let queued = self
            .command_tx
            .send(CartCommand::Shutdown { reply: reply_tx })
            .map_err(|_| CartError::StoreClosed);

        async move {
            queued?;
            reply_rx.await.map_err(|_| CartError::StoreClosed)
        }
    }

    fn request<F>(&self, command: F) -> impl Future<Output = CartResult<CartSnapshot>> + Send + 'static
    where
        F: FnOnce(Reply) -> CartCommand,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let queued = self
            .command_tx
            .send(command(reply_tx))
            .map_err(|_| CartError::StoreClosed);

        async move {
            queued?;
            reply_rx.await.map_err(|_| CartError::StoreClosed)?
        }
    }
}
