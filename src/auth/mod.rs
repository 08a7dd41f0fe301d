use axum::extract::Request;
use axum::middleware::{from_fn, Next};
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
pub mod repo_types;

use self::middleware::{check_role, ANY_ROLE};

pub fn router(state: AppState) -> Router<AppState> {
    // The refresh bearer is a refresh token with no access-token store row,
    // so the route is gated by the role check alone; that check decodes the
    // bearer itself when no identity was attached upstream.
    let refresh_gate = {
        let st = state;
        from_fn(move |req: Request, next: Next| {
            let st = st.clone();
            async move { check_role(st, ANY_ROLE, req, next).await }
        })
    };

    Router::new()
        .route("/register", get(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route(
            "/refresh-token",
            get(handlers::refresh).route_layer(refresh_gate),
        )
}
