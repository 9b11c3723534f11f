//! In-memory store
//!
//! Used by the test suites and by `STORE_BACKEND=memory` local runs. A
//! transaction holds the store lock for its whole lifetime and works on a
//! private copy of the tables, so transactions are serializable and a dropped
//! transaction leaves no trace. Unique constraints mirror the SQL schema.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ospm_core::models::{
    NewOrganization, NewSubscriberGroup, Organization, OrganizationDetails, OrganizationKey,
    OrganizationOwner, OrganizationProfile, OrganizationSummary, Permission, PermissionEntry,
    SubscriberGroup, SubscriberGroupSummary, Visibility,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::db::error::{StoreError, StoreResult};
use crate::db::store::{
    IsolationLevel, OrganizationTable, Store, StoreOperation, StoreTransaction,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    organizations: Vec<Organization>,
    details: Vec<OrganizationDetails>,
    owners: Vec<OrganizationOwner>,
    groups: Vec<SubscriberGroup>,
    permissions: Vec<Permission>,
}

impl Tables {
    fn check_unique<T>(
        rows: &[T],
        constraint: &str,
        candidate: Option<&str>,
        column: impl Fn(&T) -> Option<&str>,
    ) -> StoreResult<()> {
        let Some(candidate) = candidate else {
            return Ok(());
        };
        if rows.iter().any(|row| column(row) == Some(candidate)) {
            return Err(StoreError::UniqueViolation {
                constraint: constraint.to_string(),
            });
        }
        Ok(())
    }

    fn check_organization_unique(&self, organization: &NewOrganization) -> StoreResult<()> {
        let details = organization.details();
        let owner = organization.owner();

        Self::check_unique(
            &self.details,
            "organization_details_name_key",
            Some(details.name.as_str()),
            |d| Some(d.name.as_str()),
        )?;
        Self::check_unique(
            &self.details,
            "organization_details_email_key",
            details.email.as_deref(),
            |d| d.email.as_deref(),
        )?;
        Self::check_unique(
            &self.details,
            "organization_details_mobile_key",
            details.mobile.as_deref(),
            |d| d.mobile.as_deref(),
        )?;
        Self::check_unique(
            &self.owners,
            "organization_owners_name_key",
            owner.name.as_deref(),
            |o| o.name.as_deref(),
        )?;
        Self::check_unique(
            &self.owners,
            "organization_owners_email_key",
            Some(owner.email.as_str()),
            |o| Some(o.email.as_str()),
        )?;
        Self::check_unique(
            &self.owners,
            "organization_owners_mobile_key",
            Some(owner.mobile.as_str()),
            |o| Some(o.mobile.as_str()),
        )
    }

    fn group_name_taken(&self, organization_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.groups.iter().any(|g| {
            g.organization_id == organization_id && g.name == name && Some(g.id) != except
        })
    }
}

/// Store keeping every table in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Mutex<HashSet<StoreOperation>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later transaction fail when it reaches `operation`
    pub async fn fail_on(&self, operation: StoreOperation) {
        self.faults.lock().await.insert(operation);
    }

    pub async fn clear_faults(&self) {
        self.faults.lock().await.clear();
    }

    /// Number of stored permission rows for a group, outside any transaction
    pub async fn permission_count(&self, subscriber_group_id: Uuid) -> usize {
        self.tables
            .lock()
            .await
            .permissions
            .iter()
            .filter(|p| p.subscriber_group_id == subscriber_group_id)
            .count()
    }

    /// Whether a subscriber group row exists, outside any transaction
    pub async fn has_subscriber_group(&self, id: Uuid) -> bool {
        self.tables.lock().await.groups.iter().any(|g| g.id == id)
    }

    /// Soft-delete markers of the three organization rows, outside any transaction
    pub async fn deleted_markers(
        &self,
        organization_id: Uuid,
    ) -> Option<[Option<DateTime<Utc>>; 3]> {
        let tables = self.tables.lock().await;
        let organization = tables
            .organizations
            .iter()
            .find(|o| o.id == organization_id)?;
        let details = tables
            .details
            .iter()
            .find(|d| d.organization_id == organization_id)?;
        let owner = tables
            .owners
            .iter()
            .find(|o| o.organization_id == organization_id)?;
        Some([organization.deleted_at, details.deleted_at, owner.deleted_at])
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self, _isolation: IsolationLevel) -> StoreResult<MemoryTransaction> {
        let faults = self.faults.lock().await.clone();
        let committed = self.tables.clone().lock_owned().await;
        let working = committed.clone();

        Ok(MemoryTransaction {
            committed,
            working,
            faults,
        })
    }
}

/// An open in-memory transaction. Dropping it discards `working`.
pub struct MemoryTransaction {
    committed: OwnedMutexGuard<Tables>,
    working: Tables,
    faults: HashSet<StoreOperation>,
}

impl MemoryTransaction {
    fn fault(&self, operation: StoreOperation) -> StoreResult<()> {
        if self.faults.contains(&operation) {
            return Err(StoreError::Backend(
                operation,
                "injected failure".to_string(),
            ));
        }
        Ok(())
    }

    fn organization_id(&self, key: &OrganizationKey, visibility: Visibility) -> Option<Uuid> {
        let visible = |deleted_at: &Option<DateTime<Utc>>| {
            visibility == Visibility::IncludeDeleted || deleted_at.is_none()
        };

        match key {
            OrganizationKey::Id(id) => self
                .working
                .organizations
                .iter()
                .find(|o| o.id == *id && visible(&o.deleted_at))
                .map(|o| o.id),
            OrganizationKey::Name(name) => self
                .working
                .details
                .iter()
                .find(|d| d.name == *name && visible(&d.deleted_at))
                .map(|d| d.organization_id),
        }
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self) -> StoreResult<()> {
        self.fault(StoreOperation::Commit)?;
        let MemoryTransaction {
            mut committed,
            working,
            ..
        } = self;
        *committed = working;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_organization(
        &mut self,
        key: &OrganizationKey,
        visibility: Visibility,
    ) -> StoreResult<OrganizationProfile> {
        let id = self
            .organization_id(key, visibility)
            .ok_or_else(|| StoreError::not_found("organization", key))?;

        let organization = self
            .working
            .organizations
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("organization", key))?;
        let details = self
            .working
            .details
            .iter()
            .find(|d| d.organization_id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("organization details", id))?;
        let owner = self
            .working
            .owners
            .iter()
            .find(|o| o.organization_id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("organization owner", id))?;

        Ok(OrganizationProfile {
            organization,
            details,
            owner,
        })
    }

    async fn list_organizations(
        &mut self,
        visibility: Visibility,
    ) -> StoreResult<Vec<OrganizationSummary>> {
        let mut summaries: Vec<OrganizationSummary> = self
            .working
            .organizations
            .iter()
            .filter(|o| visibility == Visibility::IncludeDeleted || o.deleted_at.is_none())
            .filter_map(|o| {
                self.working
                    .details
                    .iter()
                    .find(|d| d.organization_id == o.id)
                    .map(|d| OrganizationSummary {
                        id: o.id,
                        name: d.name.clone(),
                        deleted_at: o.deleted_at,
                    })
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn insert_organization(&mut self, organization: &NewOrganization) -> StoreResult<Uuid> {
        self.fault(StoreOperation::InsertOrganization)?;
        self.working.check_organization_unique(organization)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let details = organization.details();
        let owner = organization.owner();

        self.working.organizations.push(Organization {
            id,
            balance: organization.opening_balance(),
            allow_negative_balance: false,
            negative_balance_threshold: organization.opening_balance(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        self.working.details.push(OrganizationDetails {
            organization_id: id,
            name: details.name.clone(),
            address: details.address.clone(),
            email: details.email.clone(),
            mobile: details.mobile.clone(),
            phone: details.phone.clone(),
            deleted_at: None,
        });
        self.working.owners.push(OrganizationOwner {
            organization_id: id,
            owner_type: owner.owner_type,
            name: owner.name.clone(),
            address: owner.address.clone(),
            email: owner.email.clone(),
            mobile: owner.mobile.clone(),
            phone: owner.phone.clone(),
            legal_national_id: owner.legal_national_id.clone(),
            deleted_at: None,
        });

        Ok(id)
    }

    async fn set_deleted_at(
        &mut self,
        table: OrganizationTable,
        organization_id: Uuid,
        deleted_at: Option<DateTime<Utc>>,
    ) -> StoreResult<u64> {
        self.fault(StoreOperation::SetDeletedAt(table))?;

        let mut touched = 0;
        match table {
            OrganizationTable::Organizations => {
                for row in self
                    .working
                    .organizations
                    .iter_mut()
                    .filter(|o| o.id == organization_id)
                {
                    row.deleted_at = deleted_at;
                    touched += 1;
                }
            }
            OrganizationTable::Details => {
                for row in self
                    .working
                    .details
                    .iter_mut()
                    .filter(|d| d.organization_id == organization_id)
                {
                    row.deleted_at = deleted_at;
                    touched += 1;
                }
            }
            OrganizationTable::Owners => {
                for row in self
                    .working
                    .owners
                    .iter_mut()
                    .filter(|o| o.organization_id == organization_id)
                {
                    row.deleted_at = deleted_at;
                    touched += 1;
                }
            }
        }
        Ok(touched)
    }

    async fn purge_organization_row(
        &mut self,
        table: OrganizationTable,
        organization_id: Uuid,
    ) -> StoreResult<u64> {
        self.fault(StoreOperation::PurgeOrganizationRow(table))?;

        let removed = match table {
            OrganizationTable::Organizations => {
                let before = self.working.organizations.len();
                self.working.organizations.retain(|o| o.id != organization_id);
                before - self.working.organizations.len()
            }
            OrganizationTable::Details => {
                let before = self.working.details.len();
                self.working
                    .details
                    .retain(|d| d.organization_id != organization_id);
                before - self.working.details.len()
            }
            OrganizationTable::Owners => {
                let before = self.working.owners.len();
                self.working
                    .owners
                    .retain(|o| o.organization_id != organization_id);
                before - self.working.owners.len()
            }
        };
        Ok(removed as u64)
    }

    async fn find_subscriber_group(&mut self, id: Uuid) -> StoreResult<SubscriberGroup> {
        self.working
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("subscriber group", id))
    }

    async fn list_subscriber_groups(
        &mut self,
        organization_id: Uuid,
    ) -> StoreResult<Vec<SubscriberGroupSummary>> {
        let mut groups: Vec<SubscriberGroupSummary> = self
            .working
            .groups
            .iter()
            .filter(|g| g.organization_id == organization_id)
            .map(|g| SubscriberGroupSummary {
                id: g.id,
                name: g.name.clone(),
            })
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    async fn insert_subscriber_group(&mut self, group: &NewSubscriberGroup) -> StoreResult<Uuid> {
        self.fault(StoreOperation::InsertSubscriberGroup)?;

        if self
            .working
            .group_name_taken(group.organization_id(), group.name(), None)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "subscriber_groups_organization_name_key".to_string(),
            });
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        self.working.groups.push(SubscriberGroup {
            id,
            organization_id: group.organization_id(),
            name: group.name().to_string(),
            description: group.description().to_string(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update_subscriber_group(
        &mut self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<()> {
        self.fault(StoreOperation::UpdateSubscriberGroup)?;

        let organization_id = self
            .working
            .groups
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.organization_id)
            .ok_or_else(|| StoreError::not_found("subscriber group", id))?;

        if let Some(name) = name {
            if self.working.group_name_taken(organization_id, name, Some(id)) {
                return Err(StoreError::UniqueViolation {
                    constraint: "subscriber_groups_organization_name_key".to_string(),
                });
            }
        }

        if let Some(group) = self.working.groups.iter_mut().find(|g| g.id == id) {
            if let Some(name) = name {
                group.name = name.to_string();
            }
            if let Some(description) = description {
                group.description = description.to_string();
            }
            group.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_subscriber_group(&mut self, id: Uuid) -> StoreResult<u64> {
        self.fault(StoreOperation::DeleteSubscriberGroup)?;

        if self
            .working
            .permissions
            .iter()
            .any(|p| p.subscriber_group_id == id)
        {
            // Mirrors the permissions.subscriber_group_id foreign key
            return Err(StoreError::Backend(
                StoreOperation::DeleteSubscriberGroup,
                format!("subscriber group {} still has permissions", id),
            ));
        }

        let before = self.working.groups.len();
        self.working.groups.retain(|g| g.id != id);
        Ok((before - self.working.groups.len()) as u64)
    }

    async fn list_permissions(&mut self, subscriber_group_id: Uuid) -> StoreResult<Vec<Permission>> {
        Ok(self
            .working
            .permissions
            .iter()
            .filter(|p| p.subscriber_group_id == subscriber_group_id)
            .cloned()
            .collect())
    }

    async fn insert_permission(
        &mut self,
        subscriber_group_id: Uuid,
        entry: &PermissionEntry,
    ) -> StoreResult<Uuid> {
        self.fault(StoreOperation::InsertPermission)?;

        if self.working.permissions.iter().any(|p| {
            p.subscriber_group_id == subscriber_group_id
                && p.category == entry.category
                && p.name == entry.name
        }) {
            return Err(StoreError::UniqueViolation {
                constraint: "permissions_group_category_name_key".to_string(),
            });
        }

        let id = Uuid::new_v4();
        self.working.permissions.push(Permission {
            id,
            subscriber_group_id,
            category: entry.category.clone(),
            name: entry.name.clone(),
            value: entry.value.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update_permission_value(
        &mut self,
        permission_id: Uuid,
        value: &str,
    ) -> StoreResult<()> {
        self.fault(StoreOperation::UpdatePermissionValue)?;

        let permission = self
            .working
            .permissions
            .iter_mut()
            .find(|p| p.id == permission_id)
            .ok_or_else(|| StoreError::not_found("permission", permission_id))?;
        permission.value = value.to_string();
        Ok(())
    }

    async fn delete_permissions(&mut self, subscriber_group_id: Uuid) -> StoreResult<u64> {
        self.fault(StoreOperation::DeletePermissions)?;

        let before = self.working.permissions.len();
        self.working
            .permissions
            .retain(|p| p.subscriber_group_id != subscriber_group_id);
        Ok((before - self.working.permissions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::transaction::TransactionGuard;
    use ospm_core::models::{
        OrganizationDetailsDraft, OrganizationDraft, OrganizationOwnerDraft, SubscriberGroupDraft,
    };

    fn new_organization(name: &str, email: &str, mobile: &str) -> NewOrganization {
        NewOrganization::try_from(OrganizationDraft {
            details: OrganizationDetailsDraft {
                name: name.to_string(),
                ..Default::default()
            },
            owner: OrganizationOwnerDraft {
                owner_type: "individual".to_string(),
                email: email.to_string(),
                mobile: mobile.to_string(),
                legal_national_id: "ID-1".to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn committed_changes_are_visible() {
        let store = MemoryStore::new();

        let mut tx = TransactionGuard::begin(&store, IsolationLevel::Default)
            .await
            .unwrap();
        let id = tx
            .insert_organization(&new_organization("acme", "a@acme.io", "1"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(IsolationLevel::Default).await.unwrap();
        let profile = tx
            .find_organization(&OrganizationKey::Name("acme".to_string()), Visibility::Live)
            .await
            .unwrap();
        assert_eq!(profile.id(), id);
    }

    #[tokio::test]
    async fn dropped_transaction_is_discarded() {
        let store = MemoryStore::new();

        {
            let mut tx = TransactionGuard::begin(&store, IsolationLevel::Default)
                .await
                .unwrap();
            tx.insert_organization(&new_organization("acme", "a@acme.io", "1"))
                .await
                .unwrap();
        }

        let mut tx = store.begin(IsolationLevel::Default).await.unwrap();
        let all = tx
            .list_organizations(Visibility::IncludeDeleted)
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn unique_constraints_are_enforced() {
        let store = MemoryStore::new();
        let mut tx = store.begin(IsolationLevel::Default).await.unwrap();
        tx.insert_organization(&new_organization("acme", "a@acme.io", "1"))
            .await
            .unwrap();

        let err = tx
            .insert_organization(&new_organization("acme", "b@acme.io", "2"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueViolation { ref constraint } if constraint == "organization_details_name_key"
        ));

        let err = tx
            .insert_organization(&new_organization("globex", "a@acme.io", "3"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_hidden_from_live_lookups() {
        let store = MemoryStore::new();
        let mut tx = store.begin(IsolationLevel::Default).await.unwrap();
        let id = tx
            .insert_organization(&new_organization("acme", "a@acme.io", "1"))
            .await
            .unwrap();
        for table in [
            OrganizationTable::Organizations,
            OrganizationTable::Details,
            OrganizationTable::Owners,
        ] {
            assert_eq!(
                tx.set_deleted_at(table, id, Some(Utc::now())).await.unwrap(),
                1
            );
        }

        let key = OrganizationKey::Id(id);
        assert!(tx
            .find_organization(&key, Visibility::Live)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(tx
            .find_organization(&key, Visibility::IncludeDeleted)
            .await
            .unwrap()
            .is_soft_deleted());
    }

    #[tokio::test]
    async fn injected_fault_fails_the_operation() {
        let store = MemoryStore::new();
        store.fail_on(StoreOperation::InsertPermission).await;

        let mut tx = store.begin(IsolationLevel::Default).await.unwrap();
        let org = tx
            .insert_organization(&new_organization("acme", "a@acme.io", "1"))
            .await
            .unwrap();
        let group = NewSubscriberGroup::try_new(
            org,
            SubscriberGroupDraft {
                name: "support".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let group_id = tx.insert_subscriber_group(&group).await.unwrap();
        let err = tx
            .insert_permission(group_id, &PermissionEntry::new("REPORT_LEVEL", "CAN_VIEW", "yes"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Backend(StoreOperation::InsertPermission, _)
        ));
    }
}
