//! Domain models for organizations, subscriber groups and permissions

pub mod organization;
pub mod permission;
pub mod subscriber_group;

pub use organization::{
    NewOrganization, NewOrganizationDetails, NewOrganizationOwner, Organization,
    OrganizationDetails, OrganizationDetailsDraft, OrganizationDraft, OrganizationKey,
    OrganizationOwner, OrganizationOwnerDraft, OrganizationProfile, OrganizationSummary,
    OwnerType, Visibility,
};
pub use permission::{Permission, PermissionEntry, PermissionSet};
pub use subscriber_group::{
    NewSubscriberGroup, SubscriberGroup, SubscriberGroupDetail, SubscriberGroupDraft,
    SubscriberGroupSummary, SubscriberGroupUpdate,
};

/// Empty strings are stored as NULL so optional unique columns never collide on "".
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
