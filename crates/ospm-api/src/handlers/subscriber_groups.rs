//! Subscriber group handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::parse_id;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use ospm_core::models::{
    SubscriberGroupDetail, SubscriberGroupDraft, SubscriberGroupSummary, SubscriberGroupUpdate,
};
use ospm_db::Store;

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriberGroupCreatedResponse {
    pub message: String,
    pub name: String,
    pub id: Uuid,
}

/// List the subscriber groups of a live organization
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{organization_id}/subscriber-groups",
    params(
        ("organization_id" = Uuid, Path, description = "Organization ID")
    ),
    responses(
        (status = 200, description = "Groups ordered by name", body = Vec<SubscriberGroupSummary>),
        (status = 404, description = "Organization not found")
    ),
    tag = "subscriber-groups"
)]
#[tracing::instrument(skip(state))]
pub async fn list_subscriber_groups<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(organization_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let organization_id = parse_id(&organization_id, "organization ID")?;
    let groups = state.subscriber_groups.list(organization_id).await?;
    Ok(Json(groups))
}

/// Create a subscriber group with its initial permissions
#[utoipa::path(
    post,
    path = "/api/v1/organizations/{organization_id}/subscriber-groups",
    params(
        ("organization_id" = Uuid, Path, description = "Organization ID")
    ),
    request_body = SubscriberGroupDraft,
    responses(
        (status = 201, description = "Subscriber group created", body = SubscriberGroupCreatedResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Organization not found"),
        (status = 409, description = "Group name already used in the organization")
    ),
    tag = "subscriber-groups"
)]
#[tracing::instrument(skip(state, draft))]
pub async fn create_subscriber_group<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(organization_id): Path<String>,
    ValidatedJson(draft): ValidatedJson<SubscriberGroupDraft>,
) -> Result<impl IntoResponse, HttpAppError> {
    let organization_id = parse_id(&organization_id, "organization ID")?;
    let name = draft.name.trim().to_string();
    let id = state
        .subscriber_groups
        .create(organization_id, draft)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriberGroupCreatedResponse {
            message: format!("subscriber group {} successfully added", name),
            name,
            id,
        }),
    ))
}

/// Get a subscriber group with its permissions
#[utoipa::path(
    get,
    path = "/api/v1/subscriber-groups/{id}",
    params(
        ("id" = Uuid, Path, description = "Subscriber group ID")
    ),
    responses(
        (status = 200, description = "Subscriber group", body = SubscriberGroupDetail),
        (status = 404, description = "Subscriber group not found")
    ),
    tag = "subscriber-groups"
)]
#[tracing::instrument(skip(state))]
pub async fn get_subscriber_group<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_id(&id, "subscriber group ID")?;
    let detail = state.subscriber_groups.detail(id).await?;
    Ok(Json(detail))
}

/// Rename a subscriber group and reconcile its permissions
///
/// Incoming permissions are matched on category and name: unknown ones are
/// added, changed values are updated, nothing is removed.
#[utoipa::path(
    patch,
    path = "/api/v1/subscriber-groups/{id}",
    params(
        ("id" = Uuid, Path, description = "Subscriber group ID")
    ),
    request_body = SubscriberGroupUpdate,
    responses(
        (status = 200, description = "Updated subscriber group", body = SubscriberGroupDetail),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Subscriber group not found"),
        (status = 409, description = "Group name already used in the organization")
    ),
    tag = "subscriber-groups"
)]
#[tracing::instrument(skip(state, changes))]
pub async fn update_subscriber_group<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    ValidatedJson(changes): ValidatedJson<SubscriberGroupUpdate>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_id(&id, "subscriber group ID")?;
    let detail = state.subscriber_groups.update(id, changes).await?;
    Ok(Json(detail))
}

/// Delete a subscriber group and its permissions
#[utoipa::path(
    delete,
    path = "/api/v1/subscriber-groups/{id}",
    params(
        ("id" = Uuid, Path, description = "Subscriber group ID")
    ),
    responses(
        (status = 204, description = "Subscriber group deleted"),
        (status = 404, description = "Subscriber group not found")
    ),
    tag = "subscriber-groups"
)]
#[tracing::instrument(skip(state))]
pub async fn delete_subscriber_group<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_id(&id, "subscriber group ID")?;
    state.subscriber_groups.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
