use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ospm_core::models::{
    NewOrganization, NewSubscriberGroup, OrganizationKey, OrganizationProfile,
    OrganizationSummary, Permission, PermissionEntry, SubscriberGroup, SubscriberGroupSummary,
    Visibility,
};
use uuid::Uuid;

use crate::db::error::StoreResult;

/// Isolation requested when a transaction begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    /// Whatever the connection defaults to (read committed or stronger)
    Default,
    Serializable,
}

/// The three tables that together make up one organization.
/// Their soft-delete markers always move together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrganizationTable {
    Organizations,
    Details,
    Owners,
}

impl OrganizationTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            OrganizationTable::Organizations => "organizations",
            OrganizationTable::Details => "organization_details",
            OrganizationTable::Owners => "organization_owners",
        }
    }

    /// Column holding the organization id in this table
    pub fn key_column(&self) -> &'static str {
        match self {
            OrganizationTable::Organizations => "id",
            OrganizationTable::Details | OrganizationTable::Owners => "organization_id",
        }
    }
}

/// Individual store operations, used to inject failures in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    InsertOrganization,
    SetDeletedAt(OrganizationTable),
    PurgeOrganizationRow(OrganizationTable),
    InsertSubscriberGroup,
    UpdateSubscriberGroup,
    DeleteSubscriberGroup,
    InsertPermission,
    UpdatePermissionValue,
    DeletePermissions,
    Commit,
}

/// A source of transactions
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Tx: StoreTransaction;

    async fn begin(&self, isolation: IsolationLevel) -> StoreResult<Self::Tx>;
}

/// Operations available inside one open transaction.
///
/// Finders return `StoreError::NotFound` when nothing matches; unique
/// constraint failures surface as `StoreError::UniqueViolation`. Dropping a
/// transaction without committing discards every change made through it.
#[async_trait]
pub trait StoreTransaction: Send + Sized {
    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;

    // Organizations

    async fn find_organization(
        &mut self,
        key: &OrganizationKey,
        visibility: Visibility,
    ) -> StoreResult<OrganizationProfile>;

    /// `(id, name)` pairs ordered by name
    async fn list_organizations(
        &mut self,
        visibility: Visibility,
    ) -> StoreResult<Vec<OrganizationSummary>>;

    /// Insert the organization, details and owner rows; returns the new id
    async fn insert_organization(&mut self, organization: &NewOrganization) -> StoreResult<Uuid>;

    /// Set (or clear, with `None`) the soft-delete marker of one table's row
    /// for `organization_id`. Returns the number of rows touched.
    async fn set_deleted_at(
        &mut self,
        table: OrganizationTable,
        organization_id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
    ) -> StoreResult<u64>;

    /// Permanently remove one table's row for `organization_id`
    async fn purge_organization_row(
        &mut self,
        table: OrganizationTable,
        organization_id: Uuid,
    ) -> StoreResult<u64>;

    // Subscriber groups

    async fn find_subscriber_group(&mut self, id: Uuid) -> StoreResult<SubscriberGroup>;

    /// `(id, name)` pairs ordered by name
    async fn list_subscriber_groups(
        &mut self,
        organization_id: Uuid,
    ) -> StoreResult<Vec<SubscriberGroupSummary>>;

    /// Insert the group row only; permissions go through `insert_permission`
    async fn insert_subscriber_group(&mut self, group: &NewSubscriberGroup) -> StoreResult<Uuid>;

    async fn update_subscriber_group(
        &mut self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<()>;

    async fn delete_subscriber_group(&mut self, id: Uuid) -> StoreResult<u64>;

    // Permissions

    /// Rows for the group in insertion order
    async fn list_permissions(&mut self, subscriber_group_id: Uuid) -> StoreResult<Vec<Permission>>;

    async fn insert_permission(
        &mut self,
        subscriber_group_id: Uuid,
        entry: &PermissionEntry,
    ) -> StoreResult<Uuid>;

    async fn update_permission_value(&mut self, permission_id: Uuid, value: &str)
        -> StoreResult<()>;

    async fn delete_permissions(&mut self, subscriber_group_id: Uuid) -> StoreResult<u64>;
}
