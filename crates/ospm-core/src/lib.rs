//! OSPM Core Library
//!
//! This crate provides the domain models, error types, configuration, creation
//! validation, the IP policy gate and the permission reconciler shared by every
//! OSPM component. Nothing in here talks to a database.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod reconcile;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, StoreBackend, WhitelistConfig};
pub use error::{AppError, ErrorMetadata, FieldViolation, LogLevel};
pub use policy::{IpRangeMatcher, OperationKind, PolicyGate, Whitelist};
pub use reconcile::{reconcile, PermissionAction, ReconcilePlan};
