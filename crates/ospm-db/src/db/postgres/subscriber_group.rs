use ospm_core::models::{NewSubscriberGroup, SubscriberGroup, SubscriberGroupSummary};
use sqlx::{PgConnection, Postgres};
use uuid::Uuid;

use crate::db::error::{StoreError, StoreResult};

#[tracing::instrument(skip(conn), fields(db.table = "subscriber_groups", db.operation = "select", db.record_id = %id))]
pub(super) async fn find(conn: &mut PgConnection, id: Uuid) -> StoreResult<SubscriberGroup> {
    sqlx::query_as::<Postgres, SubscriberGroup>(
        r#"
        SELECT id, organization_id, name, description, created_at, updated_at
        FROM subscriber_groups
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StoreError::not_found("subscriber group", id))
}

#[tracing::instrument(skip(conn), fields(db.table = "subscriber_groups", db.operation = "select"))]
pub(super) async fn list(
    conn: &mut PgConnection,
    organization_id: Uuid,
) -> StoreResult<Vec<SubscriberGroupSummary>> {
    let groups = sqlx::query_as::<Postgres, SubscriberGroupSummary>(
        "SELECT id, name FROM subscriber_groups WHERE organization_id = $1 ORDER BY name",
    )
    .bind(organization_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(groups)
}

#[tracing::instrument(skip(conn, group), fields(db.table = "subscriber_groups", db.operation = "insert", group.name = %group.name()))]
pub(super) async fn insert(conn: &mut PgConnection, group: &NewSubscriberGroup) -> StoreResult<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO subscriber_groups (id, organization_id, name, description)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(group.organization_id())
    .bind(group.name())
    .bind(group.description())
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

#[tracing::instrument(skip(conn), fields(db.table = "subscriber_groups", db.operation = "update", db.record_id = %id))]
pub(super) async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE subscriber_groups
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("subscriber group", id));
    }

    Ok(())
}

#[tracing::instrument(skip(conn), fields(db.table = "subscriber_groups", db.operation = "delete", db.record_id = %id))]
pub(super) async fn delete(conn: &mut PgConnection, id: Uuid) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM subscriber_groups WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
