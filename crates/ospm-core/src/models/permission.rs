use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const ORGANIZATION_LEVEL: &str = "ORGANIZATION_LEVEL";
pub const ACCESS_LEVEL: &str = "ACCESS_LEVEL";
pub const SUBSCRIBER_LEVEL: &str = "SUBSCRIBER_LEVEL";
pub const PAYMENT_LEVEL: &str = "PAYMENT_LEVEL";
pub const REPORT_LEVEL: &str = "REPORT_LEVEL";

/// A stored permission row. At most one row exists per
/// `(subscriber_group_id, category, name)`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Permission {
    pub id: Uuid,
    pub subscriber_group_id: Uuid,
    #[schema(example = "REPORT_LEVEL")]
    pub category: String,
    #[schema(example = "CAN_VIEW_PAYMENT_HISTORY")]
    pub name: String,
    #[schema(example = "yes")]
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// A permission as submitted by a client, before it is matched against storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionEntry {
    #[schema(example = "REPORT_LEVEL")]
    pub category: String,
    #[schema(example = "CAN_VIEW_PAYMENT_HISTORY")]
    pub name: String,
    #[schema(example = "yes")]
    pub value: String,
}

impl PermissionEntry {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<&Permission> for PermissionEntry {
    fn from(permission: &Permission) -> Self {
        Self {
            category: permission.category.clone(),
            name: permission.name.clone(),
            value: permission.value.clone(),
        }
    }
}

/// Fixed-category view of a group's permissions.
///
/// Never stored; the flat permission table is the source of truth. Rows whose
/// category is none of the five known levels land in `other`.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PermissionSet {
    pub organization_level: Vec<PermissionEntry>,
    pub access_level: Vec<PermissionEntry>,
    pub subscriber_level: Vec<PermissionEntry>,
    pub payment_level: Vec<PermissionEntry>,
    pub report_level: Vec<PermissionEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<PermissionEntry>,
}

impl PermissionSet {
    pub fn project(permissions: &[Permission]) -> Self {
        let mut set = PermissionSet::default();
        for permission in permissions {
            let bucket = match permission.category.as_str() {
                ORGANIZATION_LEVEL => &mut set.organization_level,
                ACCESS_LEVEL => &mut set.access_level,
                SUBSCRIBER_LEVEL => &mut set.subscriber_level,
                PAYMENT_LEVEL => &mut set.payment_level,
                REPORT_LEVEL => &mut set.report_level,
                _ => &mut set.other,
            };
            bucket.push(PermissionEntry::from(permission));
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, name: &str, value: &str) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            subscriber_group_id: Uuid::nil(),
            category: category.to_string(),
            name: name.to_string(),
            value: value.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn projection_buckets_by_category() {
        let rows = vec![
            row(REPORT_LEVEL, "CAN_VIEW_PAYMENT_HISTORY", "yes"),
            row(PAYMENT_LEVEL, "CAN_PAY", "no"),
            row(REPORT_LEVEL, "CAN_EXPORT", "yes"),
            row("BETA", "CAN_TRY", "yes"),
        ];

        let set = PermissionSet::project(&rows);
        assert_eq!(set.report_level.len(), 2);
        assert_eq!(set.report_level[0].name, "CAN_VIEW_PAYMENT_HISTORY");
        assert_eq!(set.payment_level, vec![PermissionEntry::new(PAYMENT_LEVEL, "CAN_PAY", "no")]);
        assert!(set.access_level.is_empty());
        assert_eq!(set.other.len(), 1);
    }
}
