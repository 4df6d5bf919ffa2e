/*
 * Responsibility
 * - users テーブル向け SQLx 操作
 * - PgPool を受け取り CRUD を提供
 * - 値はすべて bind で渡す (入力フィルタは多層防御の一層にすぎない)
 * - email の一意制約違反は RepoError::Conflict
 */
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn list(
    db: &PgPool,
    name_filter: Option<&str>,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<UserRow>> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, name, email, created_at, updated_at
        FROM users
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(name_filter)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn create(db: &PgPool, name: &str, email: &str) -> RepoResult<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (name, email)
        VALUES ($1, $2)
        RETURNING id, name, email, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(email)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn get(db: &PgPool, user_id: i64) -> RepoResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, name, email, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn update(
    db: &PgPool,
    user_id: i64,
    name: Option<&str>,
    email: Option<&str>,
) -> RepoResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            updated_at = now()
        WHERE id = $1
        RETURNING id, name, email, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(email)
    .fetch_optional(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
