/*
 * Responsibility
 * - roles / user_roles の参照のみ (トークン発行時のロール解決)
 * - 割り当ての管理 (INSERT/DELETE) はこのサービスの責務外
 */
use sqlx::PgPool;

use crate::repos::error::RepoResult;

#[derive(Clone, Debug)]
pub struct RoleRepo {
    pool: PgPool,
}

impl RoleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Role names assigned to a user, sorted for stable token payloads.
    pub async fn list_names_for_user(&self, user_id: i64) -> RepoResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT roles.name
            FROM roles
            JOIN user_roles ON user_roles.role_id = roles.id
            WHERE user_roles.user_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }
}
