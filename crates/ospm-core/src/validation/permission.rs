use std::borrow::Cow;
use std::collections::HashSet;

use validator::ValidationError;

use crate::models::PermissionEntry;

/// Every entry needs a category and a name, and no `(category, name)` pair may
/// appear twice in one request.
pub fn validate_permission_entries(entries: &[PermissionEntry]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(entries.len());

    for entry in entries {
        if entry.category.trim().is_empty() || entry.name.trim().is_empty() {
            let mut err = ValidationError::new("incomplete_permission");
            err.message = Some(Cow::from(
                "every permission needs a non-empty category and name",
            ));
            return Err(err);
        }

        if !seen.insert((entry.category.as_str(), entry.name.as_str())) {
            let mut err = ValidationError::new("duplicate_permission");
            err.message = Some(Cow::from(format!(
                "permission {}/{} is listed more than once",
                entry.category, entry.name
            )));
            return Err(err);
        }
    }

    Ok(())
}
