//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use ospm_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OSPM API",
        version = "0.1.0",
        description = "Organization and subscriber group management. Soft delete, hard delete, recovery and listing deleted organizations are restricted to whitelisted client addresses. All resource endpoints are versioned under /api/v1/."
    ),
    paths(
        // Organizations
        handlers::organizations::list_organizations,
        handlers::organizations::get_organization_profile,
        handlers::organizations::create_organization,
        handlers::organizations::delete_organization,
        handlers::organizations::recover_organization,
        // Subscriber groups
        handlers::subscriber_groups::list_subscriber_groups,
        handlers::subscriber_groups::create_subscriber_group,
        handlers::subscriber_groups::get_subscriber_group,
        handlers::subscriber_groups::update_subscriber_group,
        handlers::subscriber_groups::delete_subscriber_group,
        // Health
        handlers::health::health_check,
    ),
    components(schemas(
        error::ErrorResponse,
        models::OrganizationDraft,
        models::OrganizationDetailsDraft,
        models::OrganizationOwnerDraft,
        models::OrganizationProfile,
        models::OrganizationSummary,
        models::OwnerType,
        models::SubscriberGroupDraft,
        models::SubscriberGroupUpdate,
        models::SubscriberGroupDetail,
        models::SubscriberGroupSummary,
        models::Permission,
        models::PermissionEntry,
        models::PermissionSet,
        handlers::organizations::OrganizationCreatedResponse,
        handlers::organizations::OrganizationDeletedResponse,
        handlers::organizations::OrganizationRecoveredResponse,
        handlers::organizations::DeletionMode,
        handlers::subscriber_groups::SubscriberGroupCreatedResponse,
        handlers::health::HealthCheckResponse,
    )),
    tags(
        (name = "organizations", description = "Organization lifecycle"),
        (name = "subscriber-groups", description = "Subscriber groups and their permissions"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
