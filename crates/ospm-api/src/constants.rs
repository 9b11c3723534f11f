//! API constants
//!
//! Every resource route lives under [`API_PREFIX`]. Handler path annotations
//! repeat the literal because utoipa needs it at compile time.

pub const API_VERSION: &str = "v1";

/// Versioned prefix all resource routes are nested under
pub const API_PREFIX: &str = "/api/v1";

/// Where the OpenAPI document is served
pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";
