use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Persisted token pair for one active session. The row is the source of
/// truth for "is this token still active": logout deletes it, refresh
/// rewrites it in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
