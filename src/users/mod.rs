use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::auth::middleware::{check_role, verify_access_token, ADMIN_ONLY};
use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

/// Admin-only user management. Both gates run per request: token
/// verification first (outermost), role check second.
pub fn router(state: AppState) -> Router<AppState> {
    let admin_gate = {
        let st = state.clone();
        middleware::from_fn(move |req: Request, next: Next| {
            let st = st.clone();
            async move { check_role(st, ADMIN_ONLY, req, next).await }
        })
    };
    let verify = middleware::from_fn_with_state(state, verify_access_token);

    Router::new()
        .route("/users/all", get(handlers::get_all_users))
        .route("/user/:id", get(handlers::get_one_user))
        .route("/user/create", post(handlers::create_user))
        .route("/user/edit/:id", patch(handlers::update_user))
        .route("/user/delete/:id", delete(handlers::delete_user))
        .route_layer(admin_gate)
        .route_layer(verify)
}
