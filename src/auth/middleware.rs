use axum::extract::{FromRef, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::{Claims, JwtKeys, TokenKind};
use crate::auth::repo_types::TokenRecord;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::{Role, User};

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::User];

/// Decoded identity attached to the request by `verify_access_token` and
/// consumed by the role check and handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

impl From<&Claims> for CurrentUser {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
            role: claims.role,
        }
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header"))
}

/// Core validity rule for an access token: a row still in the token store
/// AND a good signature AND an access-kind token. The store check comes
/// first, so a logged-out token fails even while its signature is valid.
pub fn validate_access_token(
    keys: &JwtKeys,
    token: &str,
    record: Option<&TokenRecord>,
) -> Result<Claims, ApiError> {
    if record.is_none() {
        warn!("access token has no store record (revoked or never issued)");
        return Err(ApiError::unauthorized("Unauthorized"));
    }
    let claims = keys
        .verify(token)
        .map_err(|_| ApiError::unauthorized("Token Expired"))?;
    if claims.kind != TokenKind::Access {
        return Err(ApiError::unauthorized("Access token required"));
    }
    Ok(claims)
}

/// First gate for protected routes: `validate_access_token` plus a live
/// identity loaded from the store.
pub async fn verify_access_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?.to_string();

    let record = TokenRecord::find_by_access(&state.db, &token).await?;
    let keys = JwtKeys::from_ref(&state);
    let claims = validate_access_token(&keys, &token, record.as_ref())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            ApiError::unauthorized("Unauthorized")
        })?;

    req.extensions_mut().insert(CurrentUser::from(&user));
    Ok(next.run(req).await)
}

/// Second gate: role membership. Reuses the identity the first gate put in
/// the request extensions; routes gated by role alone (the refresh route,
/// whose bearer is a refresh token) fall back to decoding the bearer here.
/// An empty allowed set means no restriction.
pub async fn check_role(
    state: AppState,
    allowed: &'static [Role],
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if allowed.is_empty() {
        return Ok(next.run(req).await);
    }

    let role = match req.extensions().get::<CurrentUser>() {
        Some(current) => current.role,
        None => {
            let token = bearer_token(req.headers())?.to_string();
            let keys = JwtKeys::from_ref(&state);
            let claims = keys
                .verify(&token)
                .map_err(|_| ApiError::unauthorized("Token Expired"))?;
            let current = CurrentUser::from(&claims);
            let role = current.role;
            req.extensions_mut().insert(current);
            role
        }
    };

    if !allowed.contains(&role) {
        warn!(role = ?role, "caller lacks required role");
        return Err(ApiError::forbidden("Forbidden"));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use time::OffsetDateTime;
    use tower::ServiceExt;

    fn make_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".into(),
            password_hash: "hash".into(),
            role,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn make_record(user_id: Uuid, access: &str) -> TokenRecord {
        TokenRecord {
            id: Uuid::new_v4(),
            user_id,
            access_token: access.into(),
            refresh_token: "refresh".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    /// Router gated by `check_role` alone, the way the refresh route is.
    fn role_gate_app(allowed: &'static [Role]) -> Router {
        let state = AppState::fake();
        let gate = axum::middleware::from_fn(move |req: Request, next: Next| {
            let st = state.clone();
            async move { check_role(st, allowed, req, next).await }
        });
        Router::new().route("/", get(|| async { "ok" })).layer(gate)
    }

    fn current(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "x@y.co".into(),
            role,
        }
    }

    #[tokio::test]
    async fn revoked_token_rejected_despite_valid_signature() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(&make_user(Role::User)).expect("sign");

        // Signature and expiry are fine, but logout already deleted the row.
        let err = validate_access_token(&keys, &token, None).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn live_record_and_valid_signature_accepted() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user = make_user(Role::Admin);
        let token = keys.sign_access(&user).expect("sign");
        let record = make_record(user.id, &token);

        let claims = validate_access_token(&keys, &token, Some(&record)).expect("valid");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn refresh_token_rejected_at_access_gate() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user = make_user(Role::User);
        let token = keys.sign_refresh(&user, "paired-access").expect("sign");
        let record = make_record(user.id, &token);

        let err = validate_access_token(&keys, &token, Some(&record)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn check_role_rejects_wrong_role_from_context() {
        let app = role_gate_app(ADMIN_ONLY);
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.extensions_mut().insert(current(Role::User));

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn check_role_passes_allowed_role_from_context() {
        let app = role_gate_app(ADMIN_ONLY);
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.extensions_mut().insert(current(Role::Admin));

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn check_role_empty_allowed_is_unrestricted() {
        let app = role_gate_app(&[]);
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn check_role_requires_bearer_when_no_context() {
        let app = role_gate_app(ANY_ROLE);
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn check_role_decodes_bearer_when_no_context() {
        // fake() always yields the same secret, so a token signed here
        // verifies inside the gate.
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(&make_user(Role::User)).expect("sign");

        let app = role_gate_app(ADMIN_ONLY);
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bearer_token_extracts_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn bearer_token_accepts_lowercase_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer tok"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "tok");
    }

    #[test]
    fn bearer_token_rejects_missing_header() {
        let headers = HeaderMap::new();
        let err = bearer_token(&headers).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn current_user_from_claims_keeps_role() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "x@y.co".into(),
            role: Role::Admin,
            jti: Uuid::new_v4(),
            iat: 0,
            exp: 0,
            iss: "i".into(),
            aud: "a".into(),
            kind: TokenKind::Access,
            access: None,
        };
        let current = CurrentUser::from(&claims);
        assert_eq!(current.id, claims.sub);
        assert_eq!(current.role, Role::Admin);
    }
}
