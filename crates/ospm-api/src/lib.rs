//! OSPM API Library
//!
//! This crate provides the HTTP handlers, the client IP middleware and
//! application setup around the lifecycle services.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod setup;
mod telemetry;
mod utils;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
