use ospm_core::models::{Permission, PermissionEntry};
use sqlx::{PgConnection, Postgres};
use uuid::Uuid;

use crate::db::error::{StoreError, StoreResult};

#[tracing::instrument(skip(conn), fields(db.table = "permissions", db.operation = "select"))]
pub(super) async fn list(
    conn: &mut PgConnection,
    subscriber_group_id: Uuid,
) -> StoreResult<Vec<Permission>> {
    let permissions = sqlx::query_as::<Postgres, Permission>(
        r#"
        SELECT id, subscriber_group_id, category, name, value, created_at
        FROM permissions
        WHERE subscriber_group_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(subscriber_group_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(permissions)
}

#[tracing::instrument(skip(conn), fields(db.table = "permissions", db.operation = "insert"))]
pub(super) async fn insert(
    conn: &mut PgConnection,
    subscriber_group_id: Uuid,
    entry: &PermissionEntry,
) -> StoreResult<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO permissions (id, subscriber_group_id, category, name, value)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(subscriber_group_id)
    .bind(&entry.category)
    .bind(&entry.name)
    .bind(&entry.value)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

#[tracing::instrument(skip(conn), fields(db.table = "permissions", db.operation = "update", db.record_id = %permission_id))]
pub(super) async fn update_value(
    conn: &mut PgConnection,
    permission_id: Uuid,
    value: &str,
) -> StoreResult<()> {
    let result = sqlx::query("UPDATE permissions SET value = $2 WHERE id = $1")
        .bind(permission_id)
        .bind(value)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("permission", permission_id));
    }

    Ok(())
}

#[tracing::instrument(skip(conn), fields(db.table = "permissions", db.operation = "delete"))]
pub(super) async fn delete_for_group(
    conn: &mut PgConnection,
    subscriber_group_id: Uuid,
) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM permissions WHERE subscriber_group_id = $1")
        .bind(subscriber_group_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
