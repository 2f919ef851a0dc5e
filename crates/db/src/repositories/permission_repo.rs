//! Repository for `permissions` and `users_permissions`.

use marquee_core::permissions::Permissions;
use marquee_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

/// Provides permission lookups and grants.
pub struct PermissionRepo;

impl PermissionRepo {
    /// All permission codes held by a user.
    pub async fn get_all_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Permissions, sqlx::Error> {
        let codes = sqlx::query_scalar::<_, String>(
            "SELECT permissions.code
             FROM permissions
             INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
             WHERE users_permissions.user_id = $1
             ORDER BY permissions.code",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(Permissions::from(codes))
    }

    /// Grant the given codes to a user. Unknown codes and existing grants are
    /// ignored. Returns the number of new grants.
    pub async fn add_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: DbId,
        codes: &[&str],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users_permissions (user_id, permission_id)
             SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(codes)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
