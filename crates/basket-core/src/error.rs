//! # Error Types
//!
//! Domain-specific error types for basket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  basket-core errors (this file)                                        │
//! │  └── CoreError        - Rejected mutations, malformed blobs            │
//! │                                                                         │
//! │  basket-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  basket-store errors                                                   │
//! │  └── CartError        - What consumers of the cart see                 │
//! │                                                                         │
//! │  Flow: CoreError → CartError::Rejected → caller                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart logic errors.
///
/// A missing id on increment/decrement is deliberately NOT an error here;
/// see [`crate::Mutation::NotFound`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Price cannot be represented in the persisted blob.
    ///
    /// ## When This Occurs
    /// - `add_item` with a NaN or infinite price
    #[error("Invalid price for {id}: {price}")]
    InvalidPrice { id: String, price: f64 },

    /// Quantity would exceed the integer range.
    #[error("Quantity of {id} cannot exceed {max}")]
    QuantityOverflow { id: String, max: u32 },

    /// The persisted blob could not be encoded or decoded.
    #[error("Malformed cart data: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Codec(err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
