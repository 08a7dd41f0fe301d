use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::TokenRecord;

impl TokenRecord {
    /// Persist a freshly issued pair at login.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        access_token: &str,
        refresh_token: &str,
    ) -> anyhow::Result<TokenRecord> {
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            INSERT INTO tokens (user_id, access_token, refresh_token)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, access_token, refresh_token, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .bind(refresh_token)
        .fetch_one(db)
        .await?;
        Ok(record)
    }

    /// Lookup by access-token value; `None` means the session was revoked.
    pub async fn find_by_access(db: &PgPool, access_token: &str) -> anyhow::Result<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT id, user_id, access_token, refresh_token, created_at, updated_at
            FROM tokens
            WHERE access_token = $1
            "#,
        )
        .bind(access_token)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    pub async fn find_by_refresh(
        db: &PgPool,
        refresh_token: &str,
    ) -> anyhow::Result<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT id, user_id, access_token, refresh_token, created_at, updated_at
            FROM tokens
            WHERE refresh_token = $1
            "#,
        )
        .bind(refresh_token)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// Replace the pair in the same row, keyed by the old refresh-token
    /// value. Returns `None` when the row vanished in between (a logout
    /// winning the race); last writer wins.
    pub async fn rotate(
        db: &PgPool,
        old_refresh_token: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> anyhow::Result<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            UPDATE tokens
            SET access_token = $2, refresh_token = $3, updated_at = now()
            WHERE refresh_token = $1
            RETURNING id, user_id, access_token, refresh_token, created_at, updated_at
            "#,
        )
        .bind(old_refresh_token)
        .bind(access_token)
        .bind(refresh_token)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// Revocation-by-deletion. Returns how many rows went away; zero is not
    /// an error, logout is idempotent.
    pub async fn delete_by_access(db: &PgPool, access_token: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM tokens
            WHERE access_token = $1
            "#,
        )
        .bind(access_token)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
