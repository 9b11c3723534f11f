pub mod health;
pub mod organizations;
pub mod subscriber_groups;

use ospm_core::AppError;
use uuid::Uuid;

/// Parse an identifier taken from the request path
fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| AppError::InvalidInput(format!("invalid {}: {}", what, e)))
}
