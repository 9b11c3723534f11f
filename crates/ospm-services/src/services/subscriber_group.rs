use ospm_core::models::{
    NewSubscriberGroup, OrganizationKey, SubscriberGroupDetail, SubscriberGroupDraft,
    SubscriberGroupSummary, SubscriberGroupUpdate, Visibility,
};
use ospm_core::{reconcile, AppError, PermissionAction, ReconcilePlan};
use ospm_db::{IsolationLevel, Store, StoreTransaction};
use uuid::Uuid;
use validator::Validate;

use super::transaction::{store_failure, with_transaction};

#[derive(Clone)]
pub struct SubscriberGroupService<S: Store> {
    store: S,
}

impl<S: Store> SubscriberGroupService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a group with its initial permissions under a live organization.
    #[tracing::instrument(skip(self, draft), fields(group.name = %draft.name))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        draft: SubscriberGroupDraft,
    ) -> Result<Uuid, AppError> {
        let group = NewSubscriberGroup::try_new(organization_id, draft)?;

        let id = with_transaction(
            &self.store,
            IsolationLevel::Default,
            "create subscriber group",
            move |tx| {
                Box::pin(async move {
                    let operation = "create subscriber group";
                    tx.find_organization(
                        &OrganizationKey::Id(group.organization_id()),
                        Visibility::Live,
                    )
                    .await
                    .map_err(store_failure(operation))?;

                    let id = tx
                        .insert_subscriber_group(&group)
                        .await
                        .map_err(store_failure(operation))?;
                    for entry in group.permissions() {
                        tx.insert_permission(id, entry)
                            .await
                            .map_err(store_failure(operation))?;
                    }
                    Ok(id)
                })
            },
        )
        .await?;

        tracing::info!(group.id = %id, %organization_id, "Subscriber group created");
        Ok(id)
    }

    /// Delete a group and every permission row that belongs to it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, group_id: Uuid) -> Result<(), AppError> {
        let removed = with_transaction(
            &self.store,
            IsolationLevel::Default,
            "delete subscriber group",
            move |tx| {
                Box::pin(async move {
                    let operation = "delete subscriber group";
                    // Resolve first so the dependent rows are addressed by the stored key
                    let group = tx
                        .find_subscriber_group(group_id)
                        .await
                        .map_err(store_failure(operation))?;

                    let removed = tx
                        .delete_permissions(group.id)
                        .await
                        .map_err(store_failure(operation))?;
                    tx.delete_subscriber_group(group.id)
                        .await
                        .map_err(store_failure(operation))?;
                    Ok(removed)
                })
            },
        )
        .await?;

        tracing::info!(%group_id, permissions_removed = removed, "Subscriber group deleted");
        Ok(())
    }

    /// Rename, re-describe and reconcile permissions of a group in one transaction.
    ///
    /// Empty or unchanged name and description are ignored. Permissions are
    /// only created or updated, never removed.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update(
        &self,
        group_id: Uuid,
        changes: SubscriberGroupUpdate,
    ) -> Result<SubscriberGroupDetail, AppError> {
        changes.validate()?;

        let (detail, plan) = with_transaction(
            &self.store,
            IsolationLevel::Default,
            "update subscriber group",
            move |tx| {
                Box::pin(async move {
                    let operation = "update subscriber group";
                    let group = tx
                        .find_subscriber_group(group_id)
                        .await
                        .map_err(store_failure(operation))?;

                    let name = changes.name_change(&group.name);
                    let description = changes.description_change(&group.description);
                    if name.is_some() || description.is_some() {
                        tx.update_subscriber_group(group.id, name, description)
                            .await
                            .map_err(store_failure(operation))?;
                    }

                    let mut plan = ReconcilePlan::default();
                    if let Some(incoming) = &changes.permissions {
                        let existing = tx
                            .list_permissions(group.id)
                            .await
                            .map_err(store_failure(operation))?;
                        let actions = reconcile(incoming, &existing);
                        plan = ReconcilePlan::summarize(&actions);

                        for action in actions {
                            match action {
                                PermissionAction::Ignore { .. } => {}
                                PermissionAction::Update { existing_id, value } => {
                                    tx.update_permission_value(existing_id, &value)
                                        .await
                                        .map_err(store_failure(operation))?;
                                }
                                PermissionAction::Create(entry) => {
                                    tx.insert_permission(group.id, &entry)
                                        .await
                                        .map_err(store_failure(operation))?;
                                }
                            }
                        }
                    }

                    let group = tx
                        .find_subscriber_group(group.id)
                        .await
                        .map_err(store_failure(operation))?;
                    let permissions = tx
                        .list_permissions(group.id)
                        .await
                        .map_err(store_failure(operation))?;
                    Ok((SubscriberGroupDetail::new(group, permissions), plan))
                })
            },
        )
        .await?;

        tracing::info!(
            %group_id,
            permissions.created = plan.created,
            permissions.updated = plan.updated,
            permissions.ignored = plan.ignored,
            "Subscriber group updated"
        );
        Ok(detail)
    }

    /// Groups of a live organization ordered by name
    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<SubscriberGroupSummary>, AppError> {
        with_transaction(
            &self.store,
            IsolationLevel::Default,
            "list subscriber groups",
            move |tx| {
                Box::pin(async move {
                    let operation = "list subscriber groups";
                    tx.find_organization(&OrganizationKey::Id(organization_id), Visibility::Live)
                        .await
                        .map_err(store_failure(operation))?;
                    tx.list_subscriber_groups(organization_id)
                        .await
                        .map_err(store_failure(operation))
                })
            },
        )
        .await
    }

    /// A group with its permissions
    #[tracing::instrument(skip(self))]
    pub async fn detail(&self, group_id: Uuid) -> Result<SubscriberGroupDetail, AppError> {
        with_transaction(
            &self.store,
            IsolationLevel::Default,
            "get subscriber group",
            move |tx| {
                Box::pin(async move {
                    let operation = "get subscriber group";
                    let group = tx
                        .find_subscriber_group(group_id)
                        .await
                        .map_err(store_failure(operation))?;
                    let permissions = tx
                        .list_permissions(group.id)
                        .await
                        .map_err(store_failure(operation))?;
                    Ok(SubscriberGroupDetail::new(group, permissions))
                })
            },
        )
        .await
    }
}
