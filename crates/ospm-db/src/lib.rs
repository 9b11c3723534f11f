//! OSPM persistence layer
//!
//! Exposes the transactional store interface used by the lifecycle services
//! together with its PostgreSQL (CockroachDB compatible) and in-memory
//! implementations.

pub mod db;

pub use db::{
    memory::{MemoryStore, MemoryTransaction},
    postgres::{PgStore, PgTransaction},
    IsolationLevel, OrganizationTable, Store, StoreError, StoreOperation, StoreResult,
    StoreTransaction, TransactionGuard,
};
