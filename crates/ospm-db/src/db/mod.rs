//! Store interface and backends
//!
//! Every lifecycle operation runs inside exactly one store transaction. The
//! [`Store`] trait opens transactions; [`StoreTransaction`] carries the typed
//! finders, inserts, filtered updates and hard deletes the services need.
//! Backends live in `postgres` (sqlx) and `memory` (tests and local runs).
//
// Store traits and error type
pub mod error;
pub mod store;
//
// Transaction utilities
pub mod transaction;
//
// Backends
pub mod memory;
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use store::{IsolationLevel, OrganizationTable, Store, StoreOperation, StoreTransaction};
pub use transaction::TransactionGuard;
