use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::{Profile, Role, User};

/// Request body for registration: credentials plus the profile fields.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub city: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of an identity returned to clients.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Returned by registration: the created identity and its profile.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: PublicUser,
    pub details: Profile,
}

/// Returned by login: the identity plus the freshly persisted token pair.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Returned by refresh: the rotated token pair.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
