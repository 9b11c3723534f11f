//! Organization lifecycle integration tests over the in-memory store.

mod helpers;

use helpers::{create_group, create_organization, organization_draft, setup};
use ospm_core::models::permission::ACCESS_LEVEL;
use ospm_core::models::{OrganizationKey, OrganizationSummary, PermissionEntry};
use ospm_core::AppError;
use ospm_db::{OrganizationTable, StoreOperation};
use ospm_services::RecoverOutcome;
use rust_decimal::Decimal;
use uuid::Uuid;

fn listed(summaries: &[OrganizationSummary], id: Uuid) -> bool {
    summaries.iter().any(|s| s.id == id)
}

#[tokio::test]
async fn test_create_and_fetch_details() {
    let ctx = setup();
    let id = create_organization(&ctx, "acme").await;

    let by_id = ctx
        .organizations
        .details(&OrganizationKey::Id(id))
        .await
        .unwrap();
    assert_eq!(by_id.id(), id);
    assert_eq!(by_id.name(), "org-acme");
    assert_eq!(by_id.organization.balance, Decimal::ZERO);
    assert!(!by_id.organization.allow_negative_balance);

    let by_name = ctx
        .organizations
        .details(&OrganizationKey::Name("org-acme".to_string()))
        .await
        .unwrap();
    assert_eq!(by_name.id(), id);
    // Blank optional fields are stored as NULL
    assert_eq!(by_name.details.address, None);
    assert_eq!(by_name.owner.phone, None);
}

#[tokio::test]
async fn test_create_rejects_invalid_draft() {
    let ctx = setup();
    let mut draft = organization_draft("acme");
    draft.balance = Decimal::new(10, 0);
    draft.owner.owner_type = "corporate".to_string();

    let err = ctx.organizations.create(draft).await.unwrap_err();
    match err {
        AppError::Validation { violations } => {
            assert_eq!(violations.len(), 2);
            assert_eq!(violations[0].field, "balance");
            assert_eq!(violations[1].field, "owner.type");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(ctx.organizations.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_duplicate_name_conflicts() {
    let ctx = setup();
    create_organization(&ctx, "acme").await;

    let mut draft = organization_draft("other");
    draft.details.name = "org-acme".to_string();
    let err = ctx.organizations.create(draft).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("name")));
    assert_eq!(ctx.organizations.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_soft_delete_and_recover_round_trip() {
    let ctx = setup();
    let id = create_organization(&ctx, "acme").await;
    let key = OrganizationKey::Id(id);

    assert_eq!(ctx.organizations.soft_delete(&key).await.unwrap(), id);

    assert!(!listed(&ctx.organizations.list().await.unwrap(), id));
    let all = ctx.organizations.list_all().await.unwrap();
    let summary = all.iter().find(|s| s.id == id).expect("listed with deleted");
    assert!(summary.deleted_at.is_some());

    let markers = ctx.store.deleted_markers(id).await.unwrap();
    assert!(markers.iter().all(Option::is_some));
    assert!(markers.iter().all(|m| *m == markers[0]));

    assert!(matches!(
        ctx.organizations.details(&key).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        ctx.organizations.soft_delete(&key).await.unwrap_err(),
        AppError::NotFound(_)
    ));

    let outcome = ctx
        .organizations
        .recover(&OrganizationKey::Name("org-acme".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome, RecoverOutcome::Recovered(id));

    assert!(listed(&ctx.organizations.list().await.unwrap(), id));
    let markers = ctx.store.deleted_markers(id).await.unwrap();
    assert!(markers.iter().all(Option::is_none));
}

#[tokio::test]
async fn test_recover_live_organization_is_noop() {
    let ctx = setup();
    let id = create_organization(&ctx, "acme").await;

    let outcome = ctx
        .organizations
        .recover(&OrganizationKey::Id(id))
        .await
        .unwrap();
    assert_eq!(outcome, RecoverOutcome::AlreadyLive(id));
    assert_eq!(outcome.organization_id(), id);
    assert!(listed(&ctx.organizations.list().await.unwrap(), id));
}

#[tokio::test]
async fn test_hard_delete_removes_everything() {
    let ctx = setup();
    let id = create_organization(&ctx, "acme").await;
    let group_id = create_group(
        &ctx,
        id,
        "gold",
        vec![PermissionEntry::new(ACCESS_LEVEL, "CAN_LOGIN", "yes")],
    )
    .await;
    let key = OrganizationKey::Id(id);

    ctx.organizations.soft_delete(&key).await.unwrap();
    assert_eq!(ctx.organizations.hard_delete(&key).await.unwrap(), id);

    assert!(!listed(&ctx.organizations.list().await.unwrap(), id));
    assert!(!listed(&ctx.organizations.list_all().await.unwrap(), id));
    assert!(ctx.store.deleted_markers(id).await.is_none());
    assert!(!ctx.store.has_subscriber_group(group_id).await);
    assert_eq!(ctx.store.permission_count(group_id).await, 0);

    assert!(matches!(
        ctx.organizations.recover(&key).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        ctx.organizations.hard_delete(&key).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_hard_delete_live_organization_by_name() {
    let ctx = setup();
    let id = create_organization(&ctx, "acme").await;

    let deleted = ctx
        .organizations
        .hard_delete(&OrganizationKey::Name("org-acme".to_string()))
        .await
        .unwrap();
    assert_eq!(deleted, id);
    assert!(ctx.organizations.list_all().await.unwrap().is_empty());

    // The name is free again once the rows are gone
    create_organization(&ctx, "acme").await;
}

#[tokio::test]
async fn test_soft_delete_failure_leaves_no_partial_markers() {
    let ctx = setup();
    let id = create_organization(&ctx, "acme").await;
    ctx.store
        .fail_on(StoreOperation::SetDeletedAt(OrganizationTable::Owners))
        .await;

    let err = ctx
        .organizations
        .soft_delete(&OrganizationKey::Id(id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Transaction { .. }));

    let markers = ctx.store.deleted_markers(id).await.unwrap();
    assert!(markers.iter().all(Option::is_none));

    ctx.store.clear_faults().await;
    assert!(listed(&ctx.organizations.list().await.unwrap(), id));
}

#[tokio::test]
async fn test_recover_failure_keeps_organization_deleted() {
    let ctx = setup();
    let id = create_organization(&ctx, "acme").await;
    let key = OrganizationKey::Id(id);
    ctx.organizations.soft_delete(&key).await.unwrap();

    ctx.store
        .fail_on(StoreOperation::SetDeletedAt(OrganizationTable::Details))
        .await;
    let err = ctx.organizations.recover(&key).await.unwrap_err();
    assert!(matches!(err, AppError::Transaction { .. }));

    let markers = ctx.store.deleted_markers(id).await.unwrap();
    assert!(markers.iter().all(Option::is_some));
}

#[tokio::test]
async fn test_hard_delete_failure_keeps_rows() {
    let ctx = setup();
    let id = create_organization(&ctx, "acme").await;
    let group_id = create_group(
        &ctx,
        id,
        "gold",
        vec![PermissionEntry::new(ACCESS_LEVEL, "CAN_LOGIN", "yes")],
    )
    .await;

    ctx.store
        .fail_on(StoreOperation::PurgeOrganizationRow(OrganizationTable::Organizations))
        .await;
    let err = ctx
        .organizations
        .hard_delete(&OrganizationKey::Id(id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Transaction { .. }));

    assert!(ctx.store.deleted_markers(id).await.is_some());
    assert!(ctx.store.has_subscriber_group(group_id).await);
    assert_eq!(ctx.store.permission_count(group_id).await, 1);
}

#[tokio::test]
async fn test_commit_failure_is_a_transaction_error() {
    let ctx = setup();
    ctx.store.fail_on(StoreOperation::Commit).await;

    let err = ctx
        .organizations
        .create(organization_draft("acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Transaction { .. }));

    ctx.store.clear_faults().await;
    assert!(ctx.organizations.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_organization_is_not_found() {
    let ctx = setup();
    let key = OrganizationKey::Id(Uuid::new_v4());

    for err in [
        ctx.organizations.details(&key).await.unwrap_err(),
        ctx.organizations.soft_delete(&key).await.unwrap_err(),
        ctx.organizations.hard_delete(&key).await.unwrap_err(),
        ctx.organizations.recover(&key).await.unwrap_err(),
    ] {
        assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
    }
}
