//! Local record store for offline data access.
//!
//! This module provides the `RecordStore`, which persists the catalog
//! locally so screens can still be filled when the network is gone.
//! Each record kind lives in its own JSON table file:
//!
//! - `categories.json`: menu categories
//! - `dishes.json`: dishes of every category
//!
//! Tables are keyed by integer id and only ever grow or get updated in
//! place; nothing is evicted.

pub mod error;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use record::{Record, RecordKind};
pub use store::{RecordStore, Stored, StoredTable, SCHEMA_VERSION};
