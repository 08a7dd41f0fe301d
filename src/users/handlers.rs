use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::dto::{PublicUser, RegisterResponse};
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::response::{success, Success};
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, EditUserRequest};
use crate::users::repo_types::{Profile, User, UserWithProfile};
use crate::validation::{ensure, validate_create, validate_edit};

#[instrument(skip(state))]
pub async fn get_all_users(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Success<Vec<UserWithProfile>>>), ApiError> {
    let result = UserWithProfile::list_all(&state.db).await?;
    if result.is_empty() {
        return Err(ApiError::not_found("No users found"));
    }
    Ok(success(
        StatusCode::OK,
        result,
        "Users retrieved successfully",
    ))
}

#[instrument(skip(state))]
pub async fn get_one_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Success<UserWithProfile>>), ApiError> {
    let row = UserWithProfile::find_by_user_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(success(StatusCode::OK, row, "Success"))
}

/// Admin-side account creation. Same path as registration, plus an optional
/// role (defaults to User).
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Success<RegisterResponse>>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    ensure(validate_create(&payload))?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or_default();

    let mut tx = state.db.begin().await?;
    let user = User::create(&mut *tx, &payload.email, &hash, role).await?;
    let details = Profile::create(
        &mut *tx,
        user.id,
        &payload.first_name,
        &payload.last_name,
        &payload.phone_number,
        &payload.address,
        &payload.city,
    )
    .await?;
    tx.commit().await?;

    info!(user_id = %user.id, role = ?user.role, "user created by admin");
    Ok(success(
        StatusCode::CREATED,
        RegisterResponse {
            user: PublicUser::from(&user),
            details,
        },
        "Success",
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<EditUserRequest>,
) -> Result<(StatusCode, Json<Success<UserWithProfile>>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    ensure(validate_edit(&payload))?;

    if UserWithProfile::find_by_user_id(&state.db, id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("User not found"));
    }

    let existing = User::find_by_email(&state.db, &payload.email).await?;
    if email_taken_by_other(existing.as_ref(), id) {
        warn!(email = %payload.email, "email already registered to another user");
        return Err(ApiError::conflict("Email already registered"));
    }

    let mut tx = state.db.begin().await?;
    User::update_email(&mut *tx, id, &payload.email).await?;
    Profile::update_by_user(
        &mut *tx,
        id,
        &payload.first_name,
        &payload.last_name,
        &payload.phone_number,
        &payload.address,
        &payload.city,
    )
    .await?;
    tx.commit().await?;

    let updated = UserWithProfile::find_by_user_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = %id, "user updated");
    Ok(success(StatusCode::OK, updated, "Success"))
}

/// True when the email row belongs to someone other than the user being
/// edited; a user keeping their own email is not a conflict.
fn email_taken_by_other(existing: Option<&User>, user_id: Uuid) -> bool {
    existing.map(|u| u.id != user_id).unwrap_or(false)
}

/// Deletes the profile first, then the identity: the store does not cascade,
/// the caller does. Success even when nothing matched.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Success<Option<User>>>), ApiError> {
    let mut tx = state.db.begin().await?;
    Profile::delete_by_user(&mut *tx, id).await?;
    let deleted = User::delete(&mut *tx, id).await?;
    tx.commit().await?;

    if let Some(user) = &deleted {
        info!(user_id = %user.id, "user deleted");
    }
    Ok(success(StatusCode::OK, deleted, "User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Role;
    use time::OffsetDateTime;

    fn make_user(id: Uuid) -> User {
        User {
            id,
            email: "taken@example.com".into(),
            password_hash: "hash".into(),
            role: Role::User,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn email_conflict_only_when_owned_by_someone_else() {
        let editing = Uuid::new_v4();
        let other = Uuid::new_v4();

        // No row with that email: free to take.
        assert!(!email_taken_by_other(None, editing));
        // The user keeps their own email: not a conflict.
        assert!(!email_taken_by_other(Some(&make_user(editing)), editing));
        // Another user owns it: conflict.
        assert!(email_taken_by_other(Some(&make_user(other)), editing));
    }
}
