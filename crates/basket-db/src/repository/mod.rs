//! # Repository Module
//!
//! Database repository implementations for Basket.
//!
//! ```text
//! CartStore (via SqliteStorage)
//!      │
//!      │  db.kv().set("basket:products", blob)
//!      ▼
//! KvRepository
//! ├── get(&self, key)
//! ├── set(&self, key, value)
//! └── updated_at(&self, key)   (shown as "Last saved" by `basket show`)
//!      │
//!      ▼
//! kv_store table
//! ```
//!
//! ## Available Repositories
//!
//! - [`kv::KvRepository`] - Key-value slots

pub mod kv;
