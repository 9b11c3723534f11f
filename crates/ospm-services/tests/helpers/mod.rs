//! Test helpers: services over an in-memory store.
//!
//! Run from workspace root: `cargo test -p ospm-services`.

#![allow(dead_code)]

use ospm_core::models::{
    OrganizationDetailsDraft, OrganizationDraft, OrganizationOwnerDraft, PermissionEntry,
    SubscriberGroupDraft,
};
use ospm_db::MemoryStore;
use ospm_services::{OrganizationService, SubscriberGroupService};
use uuid::Uuid;

/// Services sharing one store, plus the store itself for fault injection.
pub struct TestContext {
    pub store: MemoryStore,
    pub organizations: OrganizationService<MemoryStore>,
    pub groups: SubscriberGroupService<MemoryStore>,
}

pub fn setup() -> TestContext {
    let store = MemoryStore::new();
    TestContext {
        organizations: OrganizationService::new(store.clone()),
        groups: SubscriberGroupService::new(store.clone()),
        store,
    }
}

/// A draft that passes every creation rule. `tag` keeps unique columns apart.
pub fn organization_draft(tag: &str) -> OrganizationDraft {
    OrganizationDraft {
        details: OrganizationDetailsDraft {
            name: format!("org-{}", tag),
            email: format!("contact@{}.example", tag),
            ..Default::default()
        },
        owner: OrganizationOwnerDraft {
            owner_type: "legal".to_string(),
            name: format!("owner-{}", tag),
            email: format!("owner@{}.example", tag),
            mobile: format!("+1-555-{}", tag),
            legal_national_id: format!("NID-{}", tag),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn group_draft(name: &str, permissions: Vec<PermissionEntry>) -> SubscriberGroupDraft {
    SubscriberGroupDraft {
        name: name.to_string(),
        description: format!("{} subscribers", name),
        permissions,
    }
}

pub async fn create_organization(ctx: &TestContext, tag: &str) -> Uuid {
    ctx.organizations
        .create(organization_draft(tag))
        .await
        .expect("Failed to create organization")
}

pub async fn create_group(
    ctx: &TestContext,
    organization_id: Uuid,
    name: &str,
    permissions: Vec<PermissionEntry>,
) -> Uuid {
    ctx.groups
        .create(organization_id, group_draft(name, permissions))
        .await
        .expect("Failed to create subscriber group")
}
