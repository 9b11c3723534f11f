//! PostgreSQL / CockroachDB store backed by sqlx

mod organization;
mod permission;
mod subscriber_group;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ospm_core::models::{
    NewOrganization, NewSubscriberGroup, OrganizationKey, OrganizationProfile,
    OrganizationSummary, Permission, PermissionEntry, SubscriberGroup, SubscriberGroupSummary,
    Visibility,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::error::StoreResult;
use crate::db::store::{IsolationLevel, OrganizationTable, Store, StoreTransaction};

/// Store over a sqlx connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTransaction;

    #[tracing::instrument(skip(self))]
    async fn begin(&self, isolation: IsolationLevel) -> StoreResult<PgTransaction> {
        let mut tx = self.pool.begin().await?;

        if isolation == IsolationLevel::Serializable {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await?;
        }

        Ok(PgTransaction { tx })
    }
}

/// One open sqlx transaction. Dropping it rolls back.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    async fn find_organization(
        &mut self,
        key: &OrganizationKey,
        visibility: Visibility,
    ) -> StoreResult<OrganizationProfile> {
        organization::find(&mut *self.tx, key, visibility).await
    }

    async fn list_organizations(
        &mut self,
        visibility: Visibility,
    ) -> StoreResult<Vec<OrganizationSummary>> {
        organization::list(&mut *self.tx, visibility).await
    }

    async fn insert_organization(&mut self, organization: &NewOrganization) -> StoreResult<Uuid> {
        organization::insert(&mut *self.tx, organization).await
    }

    async fn set_deleted_at(
        &mut self,
        table: OrganizationTable,
        organization_id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
    ) -> StoreResult<u64> {
        organization::set_deleted_at(&mut *self.tx, table, organization_id, deleted_at).await
    }

    async fn purge_organization_row(
        &mut self,
        table: OrganizationTable,
        organization_id: Uuid,
    ) -> StoreResult<u64> {
        organization::purge(&mut *self.tx, table, organization_id).await
    }

    async fn find_subscriber_group(&mut self, id: Uuid) -> StoreResult<SubscriberGroup> {
        subscriber_group::find(&mut *self.tx, id).await
    }

    async fn list_subscriber_groups(
        &mut self,
        organization_id: Uuid,
    ) -> StoreResult<Vec<SubscriberGroupSummary>> {
        subscriber_group::list(&mut *self.tx, organization_id).await
    }

    async fn insert_subscriber_group(&mut self, group: &NewSubscriberGroup) -> StoreResult<Uuid> {
        subscriber_group::insert(&mut *self.tx, group).await
    }

    async fn update_subscriber_group(
        &mut self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<()> {
        subscriber_group::update(&mut *self.tx, id, name, description).await
    }

    async fn delete_subscriber_group(&mut self, id: Uuid) -> StoreResult<u64> {
        subscriber_group::delete(&mut *self.tx, id).await
    }

    async fn list_permissions(&mut self, subscriber_group_id: Uuid) -> StoreResult<Vec<Permission>> {
        permission::list(&mut *self.tx, subscriber_group_id).await
    }

    async fn insert_permission(
        &mut self,
        subscriber_group_id: Uuid,
        entry: &PermissionEntry,
    ) -> StoreResult<Uuid> {
        permission::insert(&mut *self.tx, subscriber_group_id, entry).await
    }

    async fn update_permission_value(
        &mut self,
        permission_id: Uuid,
        value: &str,
    ) -> StoreResult<()> {
        permission::update_value(&mut *self.tx, permission_id, value).await
    }

    async fn delete_permissions(&mut self, subscriber_group_id: Uuid) -> StoreResult<u64> {
        permission::delete_for_group(&mut *self.tx, subscriber_group_id).await
    }
}
