use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Legal form of an organization owner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "owner_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    Legal,
    Individual,
}

impl FromStr for OwnerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legal" => Ok(OwnerType::Legal),
            "individual" => Ok(OwnerType::Individual),
            _ => Err(anyhow::anyhow!("Invalid owner type: {}", s)),
        }
    }
}

impl Display for OwnerType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OwnerType::Legal => write!(f, "legal"),
            OwnerType::Individual => write!(f, "individual"),
        }
    }
}

/// Whether lookups see soft-deleted rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only rows whose `deleted_at` is NULL
    Live,
    /// Soft-deleted rows too
    IncludeDeleted,
}

/// How a caller addresses an organization: by id, or by its unique details name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationKey {
    Id(Uuid),
    Name(String),
}

impl Display for OrganizationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OrganizationKey::Id(id) => write!(f, "id {}", id),
            OrganizationKey::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

/// The `organizations` row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Organization {
    pub id: Uuid,
    pub balance: Decimal,
    pub allow_negative_balance: bool,
    pub negative_balance_threshold: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// The `organization_details` row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrganizationDetails {
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// The `organization_owners` row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrganizationOwner {
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    #[serde(rename = "type")]
    pub owner_type: OwnerType,
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: String,
    pub mobile: String,
    pub phone: Option<String>,
    pub legal_national_id: String,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An organization together with its details and owner rows.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrganizationProfile {
    #[serde(flatten)]
    pub organization: Organization,
    pub details: OrganizationDetails,
    pub owner: OrganizationOwner,
}

impl OrganizationProfile {
    pub fn id(&self) -> Uuid {
        self.organization.id
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn is_soft_deleted(&self) -> bool {
        self.organization.deleted_at.is_some()
    }
}

/// `(id, name)` view used by the list endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrganizationSummary {
    #[serde(rename = "organization_id")]
    pub id: Uuid,
    #[serde(rename = "organization_name")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Raw creation request. Nothing here is trusted until it has passed
/// [`NewOrganization::try_from`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct OrganizationDraft {
    pub balance: Decimal,
    pub allow_negative_balance: bool,
    pub negative_balance_threshold: Decimal,
    pub details: OrganizationDetailsDraft,
    pub owner: OrganizationOwnerDraft,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct OrganizationDetailsDraft {
    pub name: String,
    pub address: String,
    pub email: String,
    pub mobile: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct OrganizationOwnerDraft {
    #[serde(rename = "type")]
    pub owner_type: String,
    pub name: String,
    pub address: String,
    pub email: String,
    pub mobile: String,
    pub phone: String,
    pub legal_national_id: String,
}

/// A creation request that satisfies every creation rule.
///
/// The only way to obtain one is `NewOrganization::try_from(draft)`, so a
/// store never sees an organization with a non-zero opening balance.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub(crate) details: NewOrganizationDetails,
    pub(crate) owner: NewOrganizationOwner,
}

impl NewOrganization {
    pub fn details(&self) -> &NewOrganizationDetails {
        &self.details
    }

    pub fn owner(&self) -> &NewOrganizationOwner {
        &self.owner
    }

    /// Opening balance, threshold and overdraft flag are fixed at creation.
    pub fn opening_balance(&self) -> Decimal {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone)]
pub struct NewOrganizationDetails {
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrganizationOwner {
    pub owner_type: OwnerType,
    pub name: Option<String>,
    pub address: Option<String>,
    pub email: String,
    pub mobile: String,
    pub phone: Option<String>,
    pub legal_national_id: String,
}
