//! Validation modules

pub mod organization;
pub mod permission;

pub use organization::check_organization_draft;
pub use permission::validate_permission_entries;
