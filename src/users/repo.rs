use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::users::repo_types::{Profile, Role, User, UserWithProfile};

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Executor-generic so registration can run inside a transaction
    /// together with the profile insert.
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_email<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

impl Profile {
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        user_id: Uuid,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        address: &str,
        city: &str,
    ) -> anyhow::Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO user_details (user_id, first_name, last_name, phone_number, address, city)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, first_name, last_name, phone_number, address, city,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(phone_number)
        .bind(address)
        .bind(city)
        .fetch_one(db)
        .await?;
        Ok(profile)
    }

    pub async fn update_by_user<'e>(
        db: impl PgExecutor<'e>,
        user_id: Uuid,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        address: &str,
        city: &str,
    ) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE user_details
            SET first_name = $2, last_name = $3, phone_number = $4,
                address = $5, city = $6, updated_at = now()
            WHERE user_id = $1
            RETURNING id, user_id, first_name, last_name, phone_number, address, city,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(phone_number)
        .bind(address)
        .bind(city)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    pub async fn delete_by_user<'e>(db: impl PgExecutor<'e>, user_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM user_details
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}

impl UserWithProfile {
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<UserWithProfile>> {
        let rows = sqlx::query_as::<_, UserWithProfile>(
            r#"
            SELECT u.id, u.email, u.role,
                   d.first_name, d.last_name, d.phone_number, d.address, d.city,
                   u.created_at, u.updated_at
            FROM user_details d
            JOIN users u ON u.id = d.user_id
            ORDER BY u.created_at
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_user_id(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserWithProfile>> {
        let row = sqlx::query_as::<_, UserWithProfile>(
            r#"
            SELECT u.id, u.email, u.role,
                   d.first_name, d.last_name, d.phone_number, d.address, d.city,
                   u.created_at, u.updated_at
            FROM user_details d
            JOIN users u ON u.id = d.user_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}
