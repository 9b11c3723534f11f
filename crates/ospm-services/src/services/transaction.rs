//! Transaction scoping for lifecycle operations
//!
//! Each service operation hands its body to [`with_transaction`], which opens
//! one store transaction, commits it if the body succeeds and rolls it back
//! otherwise. Store errors are converted to `AppError` by [`store_failure`]
//! exactly where they happen, which is also the only place they are logged.

use std::future::Future;
use std::pin::Pin;

use ospm_core::AppError;
use ospm_db::{IsolationLevel, Store, StoreError, TransactionGuard};

/// Body of a transactional operation
pub(crate) type TxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'a>>;

/// Execute a closure within one store transaction
///
/// The closure receives the open transaction and returns a boxed future.
/// Commit failures are reported as `AppError::Transaction`.
pub(crate) async fn with_transaction<S, T, F>(
    store: &S,
    isolation: IsolationLevel,
    operation: &'static str,
    f: F,
) -> Result<T, AppError>
where
    S: Store,
    F: for<'a> FnOnce(&'a mut S::Tx) -> TxFuture<'a, T>,
{
    let mut tx = TransactionGuard::begin(store, isolation)
        .await
        .map_err(store_failure(operation))?;

    match f(&mut *tx).await {
        Ok(result) => {
            tx.commit().await.map_err(store_failure(operation))?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(
                    error = %rollback_err,
                    original_error = %e,
                    operation,
                    "Failed to rollback transaction"
                );
            }
            Err(e)
        }
    }
}

/// Convert a store error raised during `operation` into an `AppError`, logging it once
pub(crate) fn store_failure(operation: &'static str) -> impl Fn(StoreError) -> AppError {
    move |err| match err {
        StoreError::NotFound { entity, key } => {
            tracing::debug!(operation, entity, key = %key, "Record not found");
            AppError::NotFound(format!("{} not found: {}", entity, key))
        }
        StoreError::UniqueViolation { constraint } => {
            tracing::warn!(operation, constraint = %constraint, "Unique constraint violated");
            AppError::Conflict(conflict_message(&constraint).to_string())
        }
        other => {
            tracing::error!(operation, error = %other, "Store operation failed");
            AppError::transaction(operation, other)
        }
    }
}

fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        "organization_details_name_key" => "an organization with this name already exists",
        "organization_details_email_key" => "an organization with this email already exists",
        "organization_details_mobile_key" => "an organization with this mobile already exists",
        "organization_owners_name_key" => "an organization owner with this name already exists",
        "organization_owners_email_key" => "an organization owner with this email already exists",
        "organization_owners_mobile_key" => "an organization owner with this mobile already exists",
        "subscriber_groups_organization_name_key" => {
            "a subscriber group with this name already exists in the organization"
        }
        "permissions_group_category_name_key" => {
            "the subscriber group already has this permission"
        }
        _ => "a record with the same unique value already exists",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ospm_db::StoreOperation;

    #[test]
    fn store_errors_map_to_domain_errors() {
        let map = store_failure("test");

        assert!(matches!(
            map(StoreError::not_found("subscriber group", "42")),
            AppError::NotFound(msg) if msg == "subscriber group not found: 42"
        ));
        assert!(matches!(
            map(StoreError::UniqueViolation {
                constraint: "organization_details_name_key".to_string()
            }),
            AppError::Conflict(msg) if msg.contains("organization with this name")
        ));
        assert!(matches!(
            map(StoreError::Backend(StoreOperation::Commit, "boom".to_string())),
            AppError::Transaction { .. }
        ));
    }
}
