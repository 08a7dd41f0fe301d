use axum::extract::{FromRef, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::{debug, info, instrument, warn};

use crate::auth::dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse, TokenPair};
use crate::auth::jwt::JwtKeys;
use crate::auth::middleware::bearer_token;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::TokenRecord;
use crate::error::ApiError;
use crate::response::{success, Success};
use crate::state::AppState;
use crate::users::repo_types::{Profile, Role, User};
use crate::validation::{ensure, validate_login, validate_register};

/// Registration creates Identity + Profile and issues no token; the caller
/// still has to log in.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Success<RegisterResponse>>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    ensure(validate_register(&payload))?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;

    // Both writes in one transaction so a failed profile insert cannot
    // leave an orphaned identity behind.
    let mut tx = state.db.begin().await?;
    let user = User::create(&mut *tx, &payload.email, &hash, Role::User).await?;
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

    info!(user_id = %user.id, email = %user.email, "user registered");
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
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<Success<LoginResponse>>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    ensure(validate_login(&payload))?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::not_found("Email not found")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&user)?;
    let refresh_token = keys.sign_refresh(&user, &access_token)?;
    TokenRecord::create(&state.db, user.id, &access_token, &refresh_token).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(success(
        StatusCode::OK,
        LoginResponse {
            user: PublicUser::from(&user),
            access_token,
            refresh_token,
        },
        "Login Successfully",
    ))
}

/// Rotates the pair in place, keyed by the presented refresh token. The
/// bearer here is the refresh token itself.
#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Success<TokenPair>>), ApiError> {
    let token = bearer_token(&headers)?.to_string();

    // Store lookup first: a pair deleted by logout must not refresh even
    // while its signature is still good.
    if TokenRecord::find_by_refresh(&state.db, &token)
        .await?
        .is_none()
    {
        warn!("refresh token has no store record");
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&token)
        .map_err(|_| ApiError::unauthorized("Token Expired"))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "refresh subject no longer exists");
            ApiError::unauthorized("Unauthorized")
        })?;

    let access_token = keys.sign_access(&user)?;
    let refresh_token = keys.sign_refresh(&user, &access_token)?;

    let rotated =
        TokenRecord::rotate(&state.db, &token, &access_token, &refresh_token).await?;
    if rotated.is_none() {
        // A concurrent logout removed the row between lookup and update;
        // last writer wins.
        warn!(user_id = %user.id, "token record gone before rotation");
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    info!(user_id = %user.id, "token pair rotated");
    Ok(success(
        StatusCode::OK,
        TokenPair {
            access_token,
            refresh_token,
        },
        "Token Refreshed",
    ))
}

/// Deletes the session record. Idempotent: logging out twice is still a
/// success.
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Success<serde_json::Value>>), ApiError> {
    let token = bearer_token(&headers).map_err(|_| ApiError::unauthorized("Unauthorized"))?;

    let removed = TokenRecord::delete_by_access(&state.db, token).await?;
    if removed == 0 {
        debug!("logout token already absent");
    }

    Ok(success(
        StatusCode::OK,
        serde_json::Value::Null,
        "Logout Successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn login_response_hides_password_hash() {
        let response = LoginResponse {
            user: PublicUser {
                id: Uuid::new_v4(),
                email: "test@example.com".into(),
                role: Role::User,
            },
            access_token: "a.b.c".into(),
            refresh_token: "d.e.f".into(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("access_token"));
        assert!(!json.contains("password"));
    }
}
