use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Access level of an identity. Stored as the `user_role` enum in Postgres,
/// serialized as "Admin"/"User" in JSON and JWT claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// Identity record: the authentication half of an account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, never exposed in JSON
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Profile record: personal details owned by exactly one identity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub city: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Identity joined with its profile, as returned by the admin listing routes.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserWithProfile {
    pub id: Uuid, // identity id
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub city: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
