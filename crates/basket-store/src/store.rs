//! # Cart Store
//!
//! The single writer of the cart: one tokio task owns the cart, the
//! storage backend and the snapshot publisher.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        CartStore Lifecycle                              │
//! │                                                                         │
//! │  spawn(storage, config)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────┐  read "<ns>:products"   ┌──────────────┐             │
//! │  │ Uninitialized│ ──────────────────────► │  Hydrating   │             │
//! │  └──────────────┘                         └──────┬───────┘             │
//! │                       absent / malformed / read  │ parsed + repaired   │
//! │                       error → empty cart         ▼                     │
//! │                                           ┌──────────────┐             │
//! │       commands queued while hydrating ──► │    Ready     │ ◄─┐         │
//! │                                           └──────┬───────┘   │         │
//! │                                                  │ command   │         │
//! │                                                  ▼           │         │
//! │                                   mutate → publish → persist ┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No Lost Updates
//! Commands are applied strictly in arrival order, each against the cart as
//! the previous command left it, and the blob written is exactly the
//! sequence just computed. Two back-to-back `increment("A")` calls always
//! end at quantity + 2, in memory and in storage.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use basket_core::{codec, Cart, CoreResult, Mutation, NewLineItem};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::config::StoreConfig;
use crate::error::{CartError, CartResult};
use crate::handle::CartHandle;
use crate::snapshot::{CartPhase, CartSnapshot};
use crate::storage::CartStorage;

/// Reply channel carried by every mutating command.
pub(crate) type Reply = oneshot::Sender<CartResult<CartSnapshot>>;

/// Commands processed by the store task, one at a time.
#[derive(Debug)]
pub(crate) enum CartCommand {
    AddToCart { item: NewLineItem, reply: Reply },
    Increment { id: String, reply: Reply },
    Decrement { id: String, reply: Reply },
    /// Re-persist the current cart.
    Flush { reply: Reply },
    Shutdown { reply: oneshot::Sender<()> },
}

impl CartCommand {
    fn name(&self) -> &'static str {
        match self {
            CartCommand::AddToCart { .. } => "add_to_cart",
            CartCommand::Increment { .. } => "increment",
            CartCommand::Decrement { .. } => "decrement",
            CartCommand::Flush { .. } => "flush",
            CartCommand::Shutdown { .. } => "shutdown",
        }
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// Owns the cart and its persistence.
///
/// Never used directly after [`CartStore::spawn`]: all interaction goes
/// through the returned [`CartHandle`].
pub struct CartStore<S: CartStorage> {
    storage: S,
    config: Arc<StoreConfig>,
    /// `"<namespace>:products"`
    key: String,
    cart: Cart,
    phase: CartPhase,
    version: u64,
    dirty: bool,
    snapshot_tx: watch::Sender<CartSnapshot>,
}

impl<S: CartStorage> CartStore<S> {
    /// Validates `config`, starts the store task and returns its handle.
    ///
    /// Hydration starts immediately in the background; mutations sent
    /// before it completes are queued and applied to the hydrated cart.
    /// Must be called from within a tokio runtime.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let cart = CartStore::spawn(MemoryStorage::new(), StoreConfig::default())?;
    /// cart.add_to_cart(NewLineItem::new("A", "Apple", "/a.png", 1.5)).await?;
    /// ```
    pub fn spawn(storage: S, config: StoreConfig) -> CartResult<CartHandle> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(CartSnapshot::default());

        let store = CartStore {
            storage,
            key: config.storage_key(),
            config: Arc::new(config),
            cart: Cart::new(),
            phase: CartPhase::Uninitialized,
            version: 0,
            dirty: false,
            snapshot_tx,
        };

        tokio::spawn(store.run(command_rx));

        Ok(CartHandle::new(command_tx, snapshot_rx))
    }

    /// Main store loop.
    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<CartCommand>) {
        info!(key = %self.key, "Cart store started");

        self.hydrate().await;

        while let Some(command) = command_rx.recv().await {
            debug!(command = command.name(), version = self.version, "Processing cart command");

            match command {
                CartCommand::AddToCart { item, reply } => {
                    let result = self.apply(|cart| cart.add_item(item)).await;
                    let _ = reply.send(result);
                }
                CartCommand::Increment { id, reply } => {
                    let result = self.apply(|cart| cart.increment(&id)).await;
                    let _ = reply.send(result);
                }
                CartCommand::Decrement { id, reply } => {
                    let result = self.apply(|cart| Ok(cart.decrement(&id))).await;
                    let _ = reply.send(result);
                }
                CartCommand::Flush { reply } => {
                    let result = self.persist().await.map(|()| self.snapshot());
                    self.publish();
                    let _ = reply.send(result);
                }
                CartCommand::Shutdown { reply } => {
                    // Later sends fail fast; anything queued behind us is dropped
                    command_rx.close();
                    let _ = reply.send(());
                    break;
                }
            }
        }

        if self.dirty {
            warn!(key = %self.key, "Cart store stopped with unpersisted changes");
        }
        info!(key = %self.key, "Cart store stopped");
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// Loads the persisted cart. Never fails: every problem falls back to
    /// an empty cart.
    async fn hydrate(&mut self) {
        self.phase = CartPhase::Hydrating;
        self.publish();

        let items = match self.storage.read(&self.key).await {
            Ok(Some(blob)) => match codec::decode(&blob) {
                Ok(items) => items,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Stored cart is malformed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!(key = %self.key, "No stored cart");
                Vec::new()
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read stored cart, starting empty");
                Vec::new()
            }
        };

        let (cart, repairs) = Cart::from_items(items);
        if !repairs.is_clean() {
            warn!(
                key = %self.key,
                merged_duplicates = repairs.merged_duplicates,
                dropped_empty = repairs.dropped_empty,
                "Repaired stored cart"
            );
        }

        self.cart = cart;
        self.phase = CartPhase::Ready;
        self.publish();

        info!(
            key = %self.key,
            items = self.cart.item_count(),
            quantity = self.cart.total_quantity(),
            "Cart hydrated"
        );
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Applies one mutation, publishes the result, then persists it.
    ///
    /// Rejected and not-found mutations leave the cart, the version and
    /// storage untouched.
    async fn apply<F>(&mut self, mutate: F) -> CartResult<CartSnapshot>
    where
        F: FnOnce(&mut Cart) -> CoreResult<Mutation>,
    {
        let mutation = match mutate(&mut self.cart) {
            Ok(mutation) => mutation,
            Err(e) => {
                warn!(error = %e, "Cart change rejected");
                return Err(CartError::Rejected(e));
            }
        };

        if !mutation.changed() {
            debug!("Line-item not in cart, nothing to do");
            return Ok(self.snapshot());
        }

        self.version += 1;
        debug!(?mutation, version = self.version, "Cart updated");

        // Readers see the new cart before the write completes
        self.publish();

        let persisted = self.persist().await;
        self.publish();

        persisted.map(|()| self.snapshot())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Writes the current cart, retrying with exponential backoff.
    async fn persist(&mut self) -> CartResult<()> {
        let blob = codec::encode(self.cart.items()).map_err(|e| CartError::StorageWrite {
            attempts: 0,
            reason: e.to_string(),
        })?;

        let mut backoff = self.create_backoff();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let error = match self.storage.write(&self.key, &blob).await {
                Ok(()) => {
                    if self.dirty {
                        info!(key = %self.key, version = self.version, "Storage caught up with cart");
                    }
                    self.dirty = false;
                    return Ok(());
                }
                Err(e) => e,
            };

            let retry_in = if error.is_retryable() && attempts <= self.config.write_retries {
                backoff.next_backoff()
            } else {
                None
            };

            let Some(delay) = retry_in else {
                error!(
                    key = %self.key,
                    attempts,
                    error = %error,
                    "Failed to persist cart"
                );
                self.dirty = true;
                return Err(CartError::StorageWrite {
                    attempts,
                    reason: error.to_string(),
                });
            };

            warn!(
                key = %self.key,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Cart write failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Creates the exponential backoff configuration.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff(),
            max_interval: self.config.max_backoff(),
            multiplier: 2.0,
            max_elapsed_time: None, // bounded by write_retries instead
            ..Default::default()
        }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            products: self.cart.items().to_vec(),
            phase: self.phase,
            version: self.version,
            dirty: self.dirty,
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, SqliteStorage};
    use basket_core::LineItem;
    use basket_db::{Database, DbConfig};
    use std::time::Duration;

    const KEY: &str = "basket:products";

    fn fast_config() -> StoreConfig {
        StoreConfig::default()
            .with_write_retries(2)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(2))
    }

    fn item(id: &str) -> NewLineItem {
        NewLineItem::new(id, format!("Product {}", id), format!("/img/{}.png", id), 9.99)
    }

    async fn ready_store(storage: &MemoryStorage) -> CartHandle {
        let handle = CartStore::spawn(storage.clone(), fast_config()).unwrap();
        handle.ready().await.unwrap();
        handle
    }

    fn quantities(snapshot: &CartSnapshot) -> Vec<(String, u32)> {
        snapshot
            .products
            .iter()
            .map(|i| (i.id.clone(), i.quantity))
            .collect()
    }

    fn persisted(storage: &MemoryStorage) -> Vec<LineItem> {
        codec::decode(&storage.get(KEY).unwrap()).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scenarios
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_to_empty_cart() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;

        let snapshot = cart.add_to_cart(item("A")).await.unwrap();

        assert_eq!(quantities(&snapshot), vec![("A".into(), 1)]);
        assert_eq!(snapshot.version, 1);
        assert_eq!(persisted(&storage), snapshot.products);
    }

    #[tokio::test]
    async fn test_add_existing_increments() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;

        cart.add_to_cart(item("A")).await.unwrap();
        let snapshot = cart.add_to_cart(item("A")).await.unwrap();

        assert_eq!(quantities(&snapshot), vec![("A".into(), 2)]);
        assert_eq!(persisted(&storage)[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_existing_matches_increment() {
        let via_add = MemoryStorage::new();
        let via_increment = MemoryStorage::new();
        let a = ready_store(&via_add).await;
        let b = ready_store(&via_increment).await;

        a.add_to_cart(item("A")).await.unwrap();
        a.add_to_cart(item("A")).await.unwrap();
        b.add_to_cart(item("A")).await.unwrap();
        b.increment("A").await.unwrap();

        assert_eq!(a.products(), b.products());
        assert_eq!(via_add.get(KEY), via_increment.get(KEY));
    }

    #[tokio::test]
    async fn test_decrement_to_zero_removes() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;

        cart.add_to_cart(item("A")).await.unwrap();
        cart.add_to_cart(item("B")).await.unwrap();
        let snapshot = cart.decrement("A").await.unwrap();

        assert_eq!(quantities(&snapshot), vec![("B".into(), 1)]);
        assert_eq!(storage.get(KEY), Some(codec::encode(&snapshot.products).unwrap()));
    }

    #[tokio::test]
    async fn test_decrement_keeps_order() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;

        cart.add_to_cart(item("A")).await.unwrap();
        cart.add_to_cart(item("B")).await.unwrap();
        cart.add_to_cart(item("C")).await.unwrap();
        cart.increment("B").await.unwrap();
        let snapshot = cart.decrement("B").await.unwrap();

        assert_eq!(
            quantities(&snapshot),
            vec![("A".into(), 1), ("B".into(), 1), ("C".into(), 1)]
        );
    }

    #[tokio::test]
    async fn test_hydrates_persisted_cart() {
        let blob = r#"[{"id":"A","title":"Apple","image_url":"/a.png","price":1.5,"quantity":2}]"#;
        let storage = MemoryStorage::new().with_value(KEY, blob);

        let cart = CartStore::spawn(storage.clone(), fast_config()).unwrap();
        let snapshot = cart.ready().await.unwrap();

        assert_eq!(snapshot.phase, CartPhase::Ready);
        assert_eq!(quantities(&snapshot), vec![("A".into(), 2)]);
        assert_eq!(snapshot.products[0].price, 1.5);
        assert_eq!(snapshot.version, 0);
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_hydrates_under_namespace() {
        let blob = r#"[{"id":"A","title":"Apple","image_url":"","price":1.0,"quantity":1}]"#;
        let storage = MemoryStorage::new().with_value("shop:products", blob);

        let cart = CartStore::spawn(storage.clone(), fast_config().with_namespace("shop")).unwrap();
        cart.ready().await.unwrap();
        cart.increment("A").await.unwrap();

        assert!(storage.get(KEY).is_none());
        assert!(storage.get("shop:products").unwrap().contains("\"quantity\":2"));
    }

    // -------------------------------------------------------------------------
    // Edge cases
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_malformed_blob_starts_empty() {
        let storage = MemoryStorage::new().with_value(KEY, "{not json");

        let cart = CartStore::spawn(storage.clone(), fast_config()).unwrap();
        let snapshot = cart.ready().await.unwrap();

        assert!(snapshot.is_empty());
        // Left alone until the next mutation
        assert_eq!(storage.get(KEY).as_deref(), Some("{not json"));

        cart.add_to_cart(item("A")).await.unwrap();
        assert_eq!(persisted(&storage).len(), 1);
    }

    #[tokio::test]
    async fn test_hydration_repairs_duplicates() {
        let blob = r#"[
            {"id":"A","title":"Apple","image_url":"","price":1.0,"quantity":1},
            {"id":"B","title":"Pear","image_url":"","price":2.0,"quantity":0},
            {"id":"A","title":"Apple","image_url":"","price":1.0,"quantity":2}
        ]"#;
        let storage = MemoryStorage::new().with_value(KEY, blob);

        let cart = CartStore::spawn(storage, fast_config()).unwrap();
        let snapshot = cart.ready().await.unwrap();

        assert_eq!(quantities(&snapshot), vec![("A".into(), 3)]);
    }

    #[tokio::test]
    async fn test_missing_id_is_a_no_op() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;
        cart.add_to_cart(item("A")).await.unwrap();
        let before = storage.get(KEY);
        let writes = storage.write_count();

        let after_increment = cart.increment("Z").await.unwrap();
        let after_decrement = cart.decrement("Z").await.unwrap();

        assert_eq!(after_increment.version, 1);
        assert_eq!(after_decrement.version, 1);
        assert_eq!(storage.write_count(), writes);
        assert_eq!(storage.get(KEY), before);
    }

    #[tokio::test]
    async fn test_rejected_item_leaves_cart_untouched() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;

        let err = cart
            .add_to_cart(NewLineItem::new("A", "Apple", "", f64::NAN))
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::Rejected(_)));
        assert!(cart.products().is_empty());
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_commands_before_hydration_apply_to_hydrated_cart() {
        let blob = r#"[{"id":"A","title":"Apple","image_url":"","price":1.0,"quantity":1}]"#;
        let storage = MemoryStorage::new().with_value(KEY, blob);

        let cart = CartStore::spawn(storage.clone(), fast_config()).unwrap();
        // No ready() first: queued behind hydration
        let snapshot = cart.increment("A").await.unwrap();

        assert_eq!(quantities(&snapshot), vec![("A".into(), 2)]);
    }

    #[tokio::test]
    async fn test_concurrent_mutations_are_all_applied() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;
        cart.add_to_cart(item("A")).await.unwrap();

        let (first, second, third) =
            tokio::join!(cart.increment("A"), cart.increment("A"), cart.add_to_cart(item("A")));
        first.unwrap();
        second.unwrap();
        third.unwrap();

        assert_eq!(cart.snapshot().get("A").map(|i| i.quantity), Some(4));
        assert_eq!(persisted(&storage)[0].quantity, 4);
        assert_eq!(cart.snapshot().version, 4);
    }

    #[tokio::test]
    async fn test_dropped_reply_still_applies_mutation() {
        let blob = r#"[{"id":"A","title":"Apple","image_url":"","price":1.0,"quantity":1}]"#;
        let storage = MemoryStorage::new().with_value(KEY, blob);
        let cart = ready_store(&storage).await;

        // Never polled
        drop(cart.increment("A"));
        drop(cart.add_to_cart(item("B")));
        let snapshot = cart.flush().await.unwrap();

        assert_eq!(
            quantities(&snapshot),
            vec![("A".into(), 2), ("B".into(), 1)]
        );
        assert_eq!(persisted(&storage), snapshot.products);
    }

    #[tokio::test]
    async fn test_spawned_mutations_are_all_applied() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;
        cart.add_to_cart(item("A")).await.unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let cart = cart.clone();
                tokio::spawn(async move { cart.increment("A").await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(persisted(&storage)[0].quantity, 21);
    }

    // -------------------------------------------------------------------------
    // Write failures
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_transient_write_failure_is_retried() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;
        storage.fail_next_writes(2);

        let snapshot = cart.add_to_cart(item("A")).await.unwrap();

        assert!(!snapshot.dirty);
        assert_eq!(storage.write_count(), 3);
        assert_eq!(persisted(&storage).len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_marks_dirty_then_flush_reconciles() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;
        storage.fail_next_writes(3);

        let err = cart.add_to_cart(item("A")).await.unwrap_err();

        assert!(matches!(err, CartError::StorageWrite { attempts: 3, .. }));
        assert!(err.is_retryable());
        // Memory keeps the new state
        let snapshot = cart.snapshot();
        assert!(snapshot.dirty);
        assert_eq!(quantities(&snapshot), vec![("A".into(), 1)]);
        assert_eq!(storage.get(KEY), None);

        let flushed = cart.flush().await.unwrap();

        assert!(!flushed.dirty);
        assert_eq!(persisted(&storage), flushed.products);
    }

    #[tokio::test]
    async fn test_next_mutation_reconciles_dirty_cart() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;
        storage.fail_next_writes(3);
        cart.add_to_cart(item("A")).await.unwrap_err();

        let snapshot = cart.add_to_cart(item("B")).await.unwrap();

        assert!(!snapshot.dirty);
        assert_eq!(persisted(&storage).len(), 2);
    }

    #[tokio::test]
    async fn test_no_retries_when_disabled() {
        let storage = MemoryStorage::new();
        let cart = CartStore::spawn(storage.clone(), fast_config().with_write_retries(0)).unwrap();
        storage.fail_next_writes(1);

        let err = cart.add_to_cart(item("A")).await.unwrap_err();

        assert!(matches!(err, CartError::StorageWrite { attempts: 1, .. }));
        assert_eq!(storage.write_count(), 1);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = StoreConfig::default().with_namespace("");

        let err = CartStore::spawn(MemoryStorage::new(), config).unwrap_err();

        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_shutdown_closes_store() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;
        cart.add_to_cart(item("A")).await.unwrap();

        cart.shutdown().await.unwrap();

        assert!(matches!(
            cart.increment("A").await.unwrap_err(),
            CartError::StoreClosed
        ));
        assert!(cart.is_closed());
        // Last snapshot stays readable
        assert_eq!(cart.products().len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_cart_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basket.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let cart = CartStore::spawn(SqliteStorage::new(db.clone()), fast_config()).unwrap();
        cart.add_to_cart(item("A")).await.unwrap();
        cart.add_to_cart(item("B")).await.unwrap();
        cart.increment("A").await.unwrap();
        cart.shutdown().await.unwrap();
        db.close().await;

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let cart = CartStore::spawn(SqliteStorage::new(db), fast_config()).unwrap();
        let snapshot = cart.ready().await.unwrap();

        assert_eq!(
            quantities(&snapshot),
            vec![("A".into(), 2), ("B".into(), 1)]
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_every_mutation() {
        let storage = MemoryStorage::new();
        let cart = ready_store(&storage).await;
        let mut updates = cart.subscribe();
        updates.borrow_and_update();

        cart.add_to_cart(item("A")).await.unwrap();

        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().version, 1);
    }

    // -------------------------------------------------------------------------
    // Random operation sequences
    // -------------------------------------------------------------------------

    mod sequences {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(&'static str),
            Increment(&'static str),
            Decrement(&'static str),
        }

        fn op() -> impl Strategy<Value = Op> {
            let id = prop::sample::select(vec!["A", "B", "C", "D"]);
            prop_oneof![
                id.clone().prop_map(Op::Add),
                id.clone().prop_map(Op::Increment),
                id.prop_map(Op::Decrement),
            ]
        }

        /// Plain list model of what the cart should hold.
        fn expected_after(model: &mut Vec<(String, u32)>, op: &Op) {
            match op {
                Op::Add(id) => match model.iter_mut().find(|(m, _)| m.as_str() == *id) {
                    Some((_, quantity)) => *quantity += 1,
                    None => model.push((id.to_string(), 1)),
                },
                Op::Increment(id) => {
                    if let Some((_, quantity)) = model.iter_mut().find(|(m, _)| m.as_str() == *id) {
                        *quantity += 1;
                    }
                }
                Op::Decrement(id) => {
                    if let Some(pos) = model.iter().position(|(m, _)| m.as_str() == *id) {
                        model[pos].1 -= 1;
                        if model[pos].1 == 0 {
                            model.remove(pos);
                        }
                    }
                }
            }
        }

        fn stored(storage: &MemoryStorage) -> Vec<LineItem> {
            storage
                .get(KEY)
                .map(|blob| codec::decode(&blob).unwrap())
                .unwrap_or_default()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn test_storage_mirrors_every_snapshot(ops in prop::collection::vec(op(), 0..40)) {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();

                runtime.block_on(async {
                    let storage = MemoryStorage::new();
                    let cart = ready_store(&storage).await;
                    let mut model = Vec::new();

                    for op in &ops {
                        let snapshot = match op {
                            Op::Add(id) => cart.add_to_cart(item(id)).await,
                            Op::Increment(id) => cart.increment(*id).await,
                            Op::Decrement(id) => cart.decrement(*id).await,
                        }
                        .unwrap();
                        expected_after(&mut model, op);

                        assert_eq!(quantities(&snapshot), model);
                        assert_eq!(stored(&storage), snapshot.products);
                        assert!(snapshot.products.iter().all(|i| i.quantity >= 1));
                        assert!(!snapshot.dirty);
                    }

                    cart.shutdown().await.unwrap();
                });
            }
        }
    }
}
