//! Organization lifecycle: create, soft delete, hard delete, recover, list
//!
//! An organization spans three rows (organization, details, owner). Every
//! operation here changes all three or none of them.

use chrono::Utc;
use ospm_core::models::{
    NewOrganization, OrganizationDraft, OrganizationKey, OrganizationProfile, OrganizationSummary,
    Visibility,
};
use ospm_core::AppError;
use ospm_db::{
    IsolationLevel, OrganizationTable, Store, StoreError, StoreOperation, StoreTransaction,
};
use uuid::Uuid;

use super::transaction::{store_failure, with_transaction};

/// Order in which soft-delete markers are set and cleared
const MARKER_ORDER: [OrganizationTable; 3] = [
    OrganizationTable::Organizations,
    OrganizationTable::Details,
    OrganizationTable::Owners,
];

/// Order in which rows are purged; dependents first
const PURGE_ORDER: [OrganizationTable; 3] = [
    OrganizationTable::Owners,
    OrganizationTable::Details,
    OrganizationTable::Organizations,
];

/// Result of a recover request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverOutcome {
    /// The organization was soft-deleted and is live again
    Recovered(Uuid),
    /// The organization was not soft-deleted; nothing changed
    AlreadyLive(Uuid),
}

impl RecoverOutcome {
    pub fn organization_id(&self) -> Uuid {
        match self {
            RecoverOutcome::Recovered(id) | RecoverOutcome::AlreadyLive(id) => *id,
        }
    }
}

#[derive(Clone)]
pub struct OrganizationService<S: Store> {
    store: S,
}

impl<S: Store> OrganizationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate the draft and persist the organization with its details and owner.
    #[tracing::instrument(skip(self, draft), fields(organization.name = %draft.details.name))]
    pub async fn create(&self, draft: OrganizationDraft) -> Result<Uuid, AppError> {
        let organization = NewOrganization::try_from(draft).inspect_err(|e| {
            tracing::debug!(error = %e, "Organization draft rejected");
        })?;

        let id = with_transaction(
            &self.store,
            IsolationLevel::Default,
            "create organization",
            move |tx| {
                Box::pin(async move {
                    tx.insert_organization(&organization)
                        .await
                        .map_err(store_failure("create organization"))
                })
            },
        )
        .await?;

        tracing::info!(organization.id = %id, "Organization created");
        Ok(id)
    }

    /// Mark a live organization and its details and owner as deleted.
    #[tracing::instrument(skip(self, key), fields(organization.key = %key))]
    pub async fn soft_delete(&self, key: &OrganizationKey) -> Result<Uuid, AppError> {
        let key = key.clone();
        let id = with_transaction(
            &self.store,
            IsolationLevel::Serializable,
            "soft delete organization",
            move |tx| {
                Box::pin(async move {
                    let operation = "soft delete organization";
                    let profile = tx
                        .find_organization(&key, Visibility::Live)
                        .await
                        .map_err(store_failure(operation))?;

                    let deleted_at = Some(Utc::now());
                    for table in MARKER_ORDER {
                        mark(tx, table, profile.id(), deleted_at, operation).await?;
                    }
                    Ok(profile.id())
                })
            },
        )
        .await?;

        tracing::info!(organization.id = %id, "Organization soft deleted");
        Ok(id)
    }

    /// Permanently remove an organization, live or soft-deleted, together with
    /// its subscriber groups and their permissions.
    #[tracing::instrument(skip(self, key), fields(organization.key = %key))]
    pub async fn hard_delete(&self, key: &OrganizationKey) -> Result<Uuid, AppError> {
        let key = key.clone();
        let id = with_transaction(
            &self.store,
            IsolationLevel::Serializable,
            "hard delete organization",
            move |tx| {
                Box::pin(async move {
                    let operation = "hard delete organization";
                    let profile = tx
                        .find_organization(&key, Visibility::IncludeDeleted)
                        .await
                        .map_err(store_failure(operation))?;
                    let id = profile.id();

                    let groups = tx
                        .list_subscriber_groups(id)
                        .await
                        .map_err(store_failure(operation))?;
                    for group in &groups {
                        tx.delete_permissions(group.id)
                            .await
                            .map_err(store_failure(operation))?;
                        tx.delete_subscriber_group(group.id)
                            .await
                            .map_err(store_failure(operation))?;
                    }

                    for table in PURGE_ORDER {
                        let removed = tx
                            .purge_organization_row(table, id)
                            .await
                            .map_err(store_failure(operation))?;
                        require_one_row(
                            removed,
                            StoreOperation::PurgeOrganizationRow(table),
                            id,
                            operation,
                        )?;
                    }

                    tracing::debug!(
                        organization.id = %id,
                        subscriber_groups = groups.len(),
                        "Organization rows purged"
                    );
                    Ok(id)
                })
            },
        )
        .await?;

        tracing::info!(organization.id = %id, "Organization hard deleted");
        Ok(id)
    }

    /// Undo a soft delete. Recovering a live organization is a no-op.
    #[tracing::instrument(skip(self, key), fields(organization.key = %key))]
    pub async fn recover(&self, key: &OrganizationKey) -> Result<RecoverOutcome, AppError> {
        let key = key.clone();
        let outcome = with_transaction(
            &self.store,
            IsolationLevel::Serializable,
            "recover organization",
            move |tx| {
                Box::pin(async move {
                    let operation = "recover organization";
                    let profile = tx
                        .find_organization(&key, Visibility::IncludeDeleted)
                        .await
                        .map_err(store_failure(operation))?;

                    if !profile.is_soft_deleted() {
                        return Ok(RecoverOutcome::AlreadyLive(profile.id()));
                    }

                    for table in MARKER_ORDER {
                        mark(tx, table, profile.id(), None, operation).await?;
                    }
                    Ok(RecoverOutcome::Recovered(profile.id()))
                })
            },
        )
        .await?;

        match outcome {
            RecoverOutcome::Recovered(id) => {
                tracing::info!(organization.id = %id, "Organization recovered")
            }
            RecoverOutcome::AlreadyLive(id) => {
                tracing::debug!(organization.id = %id, "Organization was not deleted")
            }
        }
        Ok(outcome)
    }

    /// Live organizations ordered by name
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<OrganizationSummary>, AppError> {
        self.list_with(Visibility::Live).await
    }

    /// All organizations, soft-deleted ones included, ordered by name
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<OrganizationSummary>, AppError> {
        self.list_with(Visibility::IncludeDeleted).await
    }

    /// Full profile of a live organization
    #[tracing::instrument(skip(self, key), fields(organization.key = %key))]
    pub async fn details(&self, key: &OrganizationKey) -> Result<OrganizationProfile, AppError> {
        let key = key.clone();
        with_transaction(
            &self.store,
            IsolationLevel::Default,
            "get organization",
            move |tx| {
                Box::pin(async move {
                    tx.find_organization(&key, Visibility::Live)
                        .await
                        .map_err(store_failure("get organization"))
                })
            },
        )
        .await
    }

    async fn list_with(&self, visibility: Visibility) -> Result<Vec<OrganizationSummary>, AppError> {
        with_transaction(
            &self.store,
            IsolationLevel::Default,
            "list organizations",
            move |tx| {
                Box::pin(async move {
                    tx.list_organizations(visibility)
                        .await
                        .map_err(store_failure("list organizations"))
                })
            },
        )
        .await
    }
}

/// Set or clear one table's soft-delete marker; exactly one row must change.
async fn mark<T: StoreTransaction>(
    tx: &mut T,
    table: OrganizationTable,
    organization_id: Uuid,
    deleted_at: Option<chrono::DateTime<Utc>>,
    operation: &'static str,
) -> Result<(), AppError> {
    let touched = tx
        .set_deleted_at(table, organization_id, deleted_at)
        .await
        .map_err(store_failure(operation))?;
    require_one_row(
        touched,
        StoreOperation::SetDeletedAt(table),
        organization_id,
        operation,
    )
}

fn require_one_row(
    rows: u64,
    step: StoreOperation,
    organization_id: Uuid,
    operation: &'static str,
) -> Result<(), AppError> {
    if rows == 1 {
        return Ok(());
    }
    Err(store_failure(operation)(StoreError::Backend(
        step,
        format!(
            "expected exactly one row for organization {}, found {}",
            organization_id, rows
        ),
    )))
}
