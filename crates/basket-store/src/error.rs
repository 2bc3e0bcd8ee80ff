//! # Store Error Types
//!
//! Error types for the cart store and its storage backends.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Wiring         │  │   Persistence   │  │     Domain              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  OutsideScope   │  │  StorageWrite   │  │  Rejected(CoreError)    │ │
//! │  │  StoreClosed    │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Configuration  │   Storage READ failures never surface: hydration  │
//! │  │                 │   logs them and starts from an empty cart.        │
//! │  │  InvalidConfig  │                                                   │
//! │  │  ConfigLoad..   │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use basket_core::CoreError;
use basket_db::DbError;
use thiserror::Error;

/// Result type alias for cart operations.
pub type CartResult<T> = Result<T, CartError>;

/// Result type alias for storage backend operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Cart Error
// =============================================================================

/// Errors surfaced to consumers of the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The access point was called without an enclosing cart scope.
    ///
    /// This is a wiring bug: fix it at integration time, do not handle it
    /// at runtime.
    #[error("use_cart must be used within an active cart scope")]
    OutsideScope,

    /// The store's actor has stopped.
    #[error("Cart store is closed")]
    StoreClosed,

    /// The cart refused the change and is unchanged.
    #[error("Cart change rejected: {0}")]
    Rejected(#[from] CoreError),

    /// Every write attempt failed.
    ///
    /// The in-memory cart already holds the new state; storage lags until
    /// the next successful write (any mutation, or `flush`).
    #[error("Failed to persist cart after {attempts} attempt(s): {reason}")]
    StorageWrite { attempts: u32, reason: String },

    /// Invalid store configuration.
    #[error("Invalid cart configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),
}

impl CartError {
    /// Returns true if retrying (typically via `flush`) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CartError::StorageWrite { .. })
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CartError::InvalidConfig(_) | CartError::ConfigLoadFailed(_)
        )
    }
}

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CartError {
    fn from(err: toml::de::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Storage Error
// =============================================================================

/// Failures reported by a [`crate::CartStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading a slot failed.
    #[error("Storage read failed: {0}")]
    Read(String),

    /// Writing a slot failed.
    #[error("Storage write failed: {0}")]
    Write(String),

    /// The backend is gone (closed pool, unreachable file).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns true if the same operation may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Read(_) | StorageError::Write(_))
    }

    pub(crate) fn from_read(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(msg) => StorageError::Unavailable(msg),
            other => StorageError::Read(other.to_string()),
        }
    }

    pub(crate) fn from_write(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(msg) => StorageError::Unavailable(msg),
            other => StorageError::Write(other.to_string()),
        }
    }
}
