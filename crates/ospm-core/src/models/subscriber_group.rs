use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::permission::{Permission, PermissionEntry, PermissionSet};
use crate::error::AppError;
use crate::validation::validate_permission_entries;

/// The `subscriber_groups` row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SubscriberGroup {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `(id, name)` view used when listing an organization's groups
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SubscriberGroupSummary {
    #[serde(rename = "subscriber_group_id")]
    pub id: Uuid,
    #[serde(rename = "subscriber_group_name")]
    pub name: String,
}

/// A group with its flat permission rows and their fixed-category projection
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriberGroupDetail {
    #[serde(flatten)]
    pub group: SubscriberGroup,
    pub permissions: Vec<Permission>,
    pub permission_set: PermissionSet,
}

impl SubscriberGroupDetail {
    pub fn new(group: SubscriberGroup, permissions: Vec<Permission>) -> Self {
        let permission_set = PermissionSet::project(&permissions);
        Self {
            group,
            permissions,
            permission_set,
        }
    }
}

/// Raw creation request for a subscriber group
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SubscriberGroupDraft {
    #[validate(length(min = 1, message = "subscriber group name can not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "validate_permission_entries"))]
    pub permissions: Vec<PermissionEntry>,
}

/// A validated subscriber group ready to be persisted under `organization_id`.
#[derive(Debug, Clone)]
pub struct NewSubscriberGroup {
    organization_id: Uuid,
    name: String,
    description: String,
    permissions: Vec<PermissionEntry>,
}

impl NewSubscriberGroup {
    pub fn try_new(organization_id: Uuid, draft: SubscriberGroupDraft) -> Result<Self, AppError> {
        let draft = SubscriberGroupDraft {
            name: draft.name.trim().to_string(),
            ..draft
        };
        draft.validate()?;

        Ok(Self {
            organization_id,
            name: draft.name,
            description: draft.description,
            permissions: draft.permissions,
        })
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn permissions(&self) -> &[PermissionEntry] {
        &self.permissions
    }
}

/// Partial update of a subscriber group.
///
/// `None` and `Some("")` both leave the name or description untouched.
/// `permissions: None` skips reconciliation entirely.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct SubscriberGroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_permission_entries"))]
    pub permissions: Option<Vec<PermissionEntry>>,
}

impl SubscriberGroupUpdate {
    /// The new name, if it is non-empty and differs from `current`.
    pub fn name_change(&self, current: &str) -> Option<&str> {
        changed(self.name.as_deref(), current)
    }

    /// The new description, if it is non-empty and differs from `current`.
    pub fn description_change(&self, current: &str) -> Option<&str> {
        changed(self.description.as_deref(), current)
    }
}

fn changed<'a>(incoming: Option<&'a str>, current: &str) -> Option<&'a str> {
    match incoming.map(str::trim) {
        Some(value) if !value.is_empty() && value != current => Some(value),
        _ => None,
    }
}
