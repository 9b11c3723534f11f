use chrono::{DateTime, Utc};
use ospm_core::models::{
    NewOrganization, Organization, OrganizationDetails, OrganizationKey, OrganizationOwner,
    OrganizationProfile, OrganizationSummary, Visibility,
};
use sqlx::{PgConnection, Postgres};
use uuid::Uuid;

use crate::db::error::{StoreError, StoreResult};
use crate::db::store::OrganizationTable;

const ORGANIZATION_COLUMNS: &str = "id, balance, allow_negative_balance, negative_balance_threshold, created_at, updated_at, deleted_at";
const DETAILS_COLUMNS: &str = "organization_id, name, address, email, mobile, phone, deleted_at";
const OWNER_COLUMNS: &str = "organization_id, type AS owner_type, name, address, email, mobile, phone, legal_national_id, deleted_at";

#[tracing::instrument(skip(conn), fields(db.table = "organizations", db.operation = "select"))]
pub(super) async fn find(
    conn: &mut PgConnection,
    key: &OrganizationKey,
    visibility: Visibility,
) -> StoreResult<OrganizationProfile> {
    let live_only = visibility == Visibility::Live;

    let id = match key {
        OrganizationKey::Id(id) => {
            sqlx::query_scalar::<Postgres, Uuid>(
                "SELECT id FROM organizations WHERE id = $1 AND (NOT $2 OR deleted_at IS NULL)",
            )
            .bind(id)
            .bind(live_only)
            .fetch_optional(&mut *conn)
            .await?
        }
        OrganizationKey::Name(name) => {
            sqlx::query_scalar::<Postgres, Uuid>(
                "SELECT organization_id FROM organization_details WHERE name = $1 AND (NOT $2 OR deleted_at IS NULL)",
            )
            .bind(name)
            .bind(live_only)
            .fetch_optional(&mut *conn)
            .await?
        }
    }
    .ok_or_else(|| StoreError::not_found("organization", key))?;

    let organization = sqlx::query_as::<Postgres, Organization>(&format!(
        "SELECT {} FROM organizations WHERE id = $1",
        ORGANIZATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StoreError::not_found("organization", key))?;

    let details = sqlx::query_as::<Postgres, OrganizationDetails>(&format!(
        "SELECT {} FROM organization_details WHERE organization_id = $1",
        DETAILS_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StoreError::not_found("organization details", id))?;

    let owner = sqlx::query_as::<Postgres, OrganizationOwner>(&format!(
        "SELECT {} FROM organization_owners WHERE organization_id = $1",
        OWNER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StoreError::not_found("organization owner", id))?;

    Ok(OrganizationProfile {
        organization,
        details,
        owner,
    })
}

#[tracing::instrument(skip(conn), fields(db.table = "organizations", db.operation = "select"))]
pub(super) async fn list(
    conn: &mut PgConnection,
    visibility: Visibility,
) -> StoreResult<Vec<OrganizationSummary>> {
    let organizations = sqlx::query_as::<Postgres, OrganizationSummary>(
        r#"
        SELECT o.id, d.name, o.deleted_at
        FROM organizations o
        JOIN organization_details d ON d.organization_id = o.id
        WHERE (NOT $1 OR o.deleted_at IS NULL)
        ORDER BY d.name
        "#,
    )
    .bind(visibility == Visibility::Live)
    .fetch_all(&mut *conn)
    .await?;

    Ok(organizations)
}

#[tracing::instrument(
    skip(conn, organization),
    fields(db.table = "organizations", db.operation = "insert", organization.name = %organization.details().name)
)]
pub(super) async fn insert(
    conn: &mut PgConnection,
    organization: &NewOrganization,
) -> StoreResult<Uuid> {
    let id = Uuid::new_v4();
    let opening = organization.opening_balance();

    sqlx::query(
        r#"
        INSERT INTO organizations (id, balance, allow_negative_balance, negative_balance_threshold)
        VALUES ($1, $2, FALSE, $3)
        "#,
    )
    .bind(id)
    .bind(opening)
    .bind(opening)
    .execute(&mut *conn)
    .await?;

    let details = organization.details();
    sqlx::query(
        r#"
        INSERT INTO organization_details (organization_id, name, address, email, mobile, phone)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(&details.name)
    .bind(&details.address)
    .bind(&details.email)
    .bind(&details.mobile)
    .bind(&details.phone)
    .execute(&mut *conn)
    .await?;

    let owner = organization.owner();
    sqlx::query(
        r#"
        INSERT INTO organization_owners
            (organization_id, type, name, address, email, mobile, phone, legal_national_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(owner.owner_type)
    .bind(&owner.name)
    .bind(&owner.address)
    .bind(&owner.email)
    .bind(&owner.mobile)
    .bind(&owner.phone)
    .bind(&owner.legal_national_id)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

#[tracing::instrument(skip(conn), fields(db.table = table.table_name(), db.operation = "update"))]
pub(super) async fn set_deleted_at(
    conn: &mut PgConnection,
    table: OrganizationTable,
    organization_id: Uuid,
    deleted_at: Option<DateTime<Utc>>,
) -> StoreResult<u64> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET deleted_at = $2 WHERE {} = $1",
        table.table_name(),
        table.key_column()
    ))
    .bind(organization_id)
    .bind(deleted_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

#[tracing::instrument(skip(conn), fields(db.table = table.table_name(), db.operation = "delete"))]
pub(super) async fn purge(
    conn: &mut PgConnection,
    table: OrganizationTable,
    organization_id: Uuid,
) -> StoreResult<u64> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = $1",
        table.table_name(),
        table.key_column()
    ))
    .bind(organization_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
