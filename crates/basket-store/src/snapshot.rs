//! Read-only views of the cart, published after every change.

use basket_core::LineItem;
use serde::Serialize;

/// Hydration lifecycle. Advances once, never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartPhase {
    /// The store task has not run yet.
    #[default]
    Uninitialized,
    /// Reading the persisted cart.
    Hydrating,
    /// Accepting mutations.
    Ready,
}

impl std::fmt::Display for CartPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartPhase::Uninitialized => write!(f, "uninitialized"),
            CartPhase::Hydrating => write!(f, "hydrating"),
            CartPhase::Ready => write!(f, "ready"),
        }
    }
}

/// The cart as of one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartSnapshot {
    /// Line-items in insertion order.
    pub products: Vec<LineItem>,

    pub phase: CartPhase,

    /// Bumped once per applied mutation. No-ops leave it unchanged.
    pub version: u64,

    /// True while storage lags this snapshot after a failed write.
    pub dirty: bool,
}

impl CartSnapshot {
    /// Looks up a line-item by id.
    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.products.iter().find(|item| item.id == id)
    }

    /// Number of distinct line-items.
    pub fn item_count(&self) -> usize {
        self.products.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.products.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.phase == CartPhase::Ready
    }
}
