use serde::Deserialize;

use crate::users::repo_types::Role;

/// Admin-created account: register payload plus an optional role.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub city: String,
}

/// Editable identity + profile fields.
#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
    pub city: String,
}
