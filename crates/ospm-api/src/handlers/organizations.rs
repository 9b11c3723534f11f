//! Organization lifecycle handlers
//!
//! Listing every organization, soft deleting, hard deleting and recovering are
//! guarded by the IP policy gate; the caller's address comes from
//! [`ClientIp`].

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{HttpAppError, ValidatedJson, ValidatedQuery};
use crate::middleware::ClientIp;
use crate::state::AppState;
use ospm_core::models::{OrganizationDraft, OrganizationKey, OrganizationProfile, OrganizationSummary};
use ospm_core::{AppError, OperationKind};
use ospm_db::Store;
use ospm_services::RecoverOutcome;

/// Identifies one organization by id or by name. The id wins when both are given.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrganizationLookup {
    /// Organization ID
    pub id: Option<String>,
    /// Organization name
    pub name: Option<String>,
}

impl OrganizationLookup {
    pub fn key(&self) -> Result<OrganizationKey, AppError> {
        let id = self.id.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let name = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match (id, name) {
            (Some(id), _) => Ok(OrganizationKey::Id(Uuid::parse_str(id)?)),
            (None, Some(name)) => Ok(OrganizationKey::Name(name.to_string())),
            (None, None) => Err(AppError::InvalidInput(
                "Either organization ID or name must be provided".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrganizationsQuery {
    /// Include soft-deleted organizations (whitelisted clients only)
    #[serde(default)]
    pub list_all: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteOrganizationQuery {
    /// Deletion mode: `soft` or `hard`
    pub mode: Option<String>,
    /// Organization ID
    pub id: Option<String>,
    /// Organization name
    pub name: Option<String>,
}

/// How an organization is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeletionMode {
    Soft,
    Hard,
}

impl DeletionMode {
    fn parse(mode: Option<&str>) -> Result<Self, AppError> {
        match mode.map(str::trim) {
            Some("soft") => Ok(DeletionMode::Soft),
            Some("hard") => Ok(DeletionMode::Hard),
            _ => Err(AppError::InvalidInput(
                "the deletion mode should be provided. valid values are: soft/hard".to_string(),
            )),
        }
    }

    fn operation(self) -> OperationKind {
        match self {
            DeletionMode::Soft => OperationKind::SoftDelete,
            DeletionMode::Hard => OperationKind::HardDelete,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationCreatedResponse {
    pub message: String,
    pub organization_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationDeletedResponse {
    pub message: String,
    pub organization_id: Uuid,
    pub mode: DeletionMode,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationRecoveredResponse {
    pub message: String,
    pub organization_id: Uuid,
    /// False when the organization was not deleted in the first place
    pub recovered: bool,
}

/// List organizations
#[utoipa::path(
    get,
    path = "/api/v1/organizations",
    params(ListOrganizationsQuery),
    responses(
        (status = 200, description = "Organizations ordered by name", body = Vec<OrganizationSummary>),
        (status = 403, description = "Client may not list soft-deleted organizations"),
        (status = 500, description = "Internal server error")
    ),
    tag = "organizations"
)]
#[tracing::instrument(skip(state))]
pub async fn list_organizations<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    client_ip: ClientIp,
    ValidatedQuery(query): ValidatedQuery<ListOrganizationsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let organizations = if query.list_all {
        state
            .policy
            .check(OperationKind::ListAll, client_ip.as_str())?;
        state.organizations.list_all().await?
    } else {
        state.organizations.list().await?
    };

    Ok(Json(organizations))
}

/// Get an organization profile by ID or name
#[utoipa::path(
    get,
    path = "/api/v1/organizations/profile",
    params(OrganizationLookup),
    responses(
        (status = 200, description = "Organization profile", body = OrganizationProfile),
        (status = 400, description = "Neither ID nor name given, or malformed ID"),
        (status = 404, description = "Organization not found")
    ),
    tag = "organizations"
)]
#[tracing::instrument(skip(state))]
pub async fn get_organization_profile<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedQuery(lookup): ValidatedQuery<OrganizationLookup>,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = lookup.key()?;
    let profile = state.organizations.details(&key).await?;
    Ok(Json(profile))
}

/// Create an organization
#[utoipa::path(
    post,
    path = "/api/v1/organizations",
    request_body = OrganizationDraft,
    responses(
        (status = 201, description = "Organization created", body = OrganizationCreatedResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Name, email or mobile already in use"),
        (status = 500, description = "Internal server error")
    ),
    tag = "organizations"
)]
#[tracing::instrument(skip(state, draft))]
pub async fn create_organization<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ValidatedJson(draft): ValidatedJson<OrganizationDraft>,
) -> Result<impl IntoResponse, HttpAppError> {
    let name = draft.details.name.trim().to_string();
    let organization_id = state.organizations.create(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrganizationCreatedResponse {
            message: format!("organization {} successfully added", name),
            organization_id,
        }),
    ))
}

/// Soft or hard delete an organization
#[utoipa::path(
    delete,
    path = "/api/v1/organizations",
    params(DeleteOrganizationQuery),
    responses(
        (status = 200, description = "Organization deleted", body = OrganizationDeletedResponse),
        (status = 400, description = "Missing or unknown deletion mode, or no ID or name"),
        (status = 403, description = "Client may not delete organizations in this mode"),
        (status = 404, description = "Organization not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "organizations"
)]
#[tracing::instrument(skip(state))]
pub async fn delete_organization<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    client_ip: ClientIp,
    ValidatedQuery(query): ValidatedQuery<DeleteOrganizationQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mode = DeletionMode::parse(query.mode.as_deref())?;
    state.policy.check(mode.operation(), client_ip.as_str())?;

    let key = OrganizationLookup {
        id: query.id,
        name: query.name,
    }
    .key()?;

    let organization_id = match mode {
        DeletionMode::Soft => state.organizations.soft_delete(&key).await?,
        DeletionMode::Hard => state.organizations.hard_delete(&key).await?,
    };

    Ok(Json(OrganizationDeletedResponse {
        message: "organization successfully deleted".to_string(),
        organization_id,
        mode,
    }))
}

/// Undo the soft delete of an organization
#[utoipa::path(
    patch,
    path = "/api/v1/organizations/recover",
    params(OrganizationLookup),
    responses(
        (status = 200, description = "Organization is live", body = OrganizationRecoveredResponse),
        (status = 403, description = "Client may not recover organizations"),
        (status = 404, description = "Organization not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "organizations"
)]
#[tracing::instrument(skip(state))]
pub async fn recover_organization<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    client_ip: ClientIp,
    ValidatedQuery(lookup): ValidatedQuery<OrganizationLookup>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .policy
        .check(OperationKind::RecoverUndo, client_ip.as_str())?;
    let key = lookup.key()?;

    let response = match state.organizations.recover(&key).await? {
        RecoverOutcome::Recovered(organization_id) => OrganizationRecoveredResponse {
            message: "organization successfully recovered".to_string(),
            organization_id,
            recovered: true,
        },
        RecoverOutcome::AlreadyLive(organization_id) => OrganizationRecoveredResponse {
            message: "organization is not deleted".to_string(),
            organization_id,
            recovered: false,
        },
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_prefers_id() {
        let id = Uuid::new_v4();
        let lookup = OrganizationLookup {
            id: Some(id.to_string()),
            name: Some("acme".to_string()),
        };
        assert_eq!(lookup.key().unwrap(), OrganizationKey::Id(id));
    }

    #[test]
    fn test_lookup_by_name_and_missing_key() {
        let lookup = OrganizationLookup {
            id: Some("  ".to_string()),
            name: Some(" acme ".to_string()),
        };
        assert_eq!(
            lookup.key().unwrap(),
            OrganizationKey::Name("acme".to_string())
        );

        let err = OrganizationLookup::default().key().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_lookup_rejects_malformed_id() {
        let lookup = OrganizationLookup {
            id: Some("not-a-uuid".to_string()),
            name: None,
        };
        assert!(matches!(lookup.key().unwrap_err(), AppError::InvalidInput(_)));
    }

    #[test]
    fn test_deletion_mode_parsing() {
        assert_eq!(DeletionMode::parse(Some("soft")).unwrap(), DeletionMode::Soft);
        assert_eq!(DeletionMode::parse(Some("hard")).unwrap(), DeletionMode::Hard);
        assert_eq!(
            DeletionMode::Hard.operation(),
            OperationKind::HardDelete
        );
        for mode in [None, Some(""), Some("SOFT"), Some("purge")] {
            let err = DeletionMode::parse(mode).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(ref m) if m.contains("soft/hard")));
        }
    }
}
