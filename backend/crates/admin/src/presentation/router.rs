//! Admin Router

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};

use crate::domain::notifier::Notifier;
use crate::domain::repository::AdminStore;
use crate::presentation::handlers::{self, AdminAppState};
use crate::presentation::middleware::{require_admin, require_super_admin};

/// Create the admin router for any store and notifier
///
/// Mount under `/api/admins`.
pub fn admin_router<R, N>(state: AdminAppState<R, N>) -> Router
where
    R: AdminStore,
    N: Notifier,
{
    let super_admin = Router::new()
        .route("/create-admin", post(handlers::create_admin::<R, N>))
        .route("/", get(handlers::list_admins::<R, N>))
        .route(
            "/{id}",
            put(handlers::update_admin::<R, N>).delete(handlers::delete_admin::<R, N>),
        )
        .route_layer(from_fn(require_super_admin));

    let protected = Router::new()
        .route(
            "/me",
            get(handlers::get_me::<R, N>).put(handlers::update_me::<R, N>),
        )
        .merge(super_admin)
        .route_layer(from_fn_with_state(state.clone(), require_admin::<R, N>));

    Router::new()
        .route("/login", post(handlers::login::<R, N>))
        .route("/verify-otp", post(handlers::verify_otp::<R, N>))
        .route("/logout", get(handlers::logout::<R, N>))
        .merge(protected)
        .with_state(state)
}
