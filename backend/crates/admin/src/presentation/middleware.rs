//! Admin Middleware
//!
//! Access guard and role gate for protected routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::cookie::{extract_cookie, set_cookie_header};

use crate::application::authorize::{AccessCredentials, AuthorizeUseCase, require_role};
use crate::application::token::AdminClaims;
use crate::domain::notifier::Notifier;
use crate::domain::repository::AdminStore;
use crate::domain::value_object::admin_role::AdminRole;
use crate::presentation::handlers::{AdminAppState, access_cookie_value};

/// Middleware that requires a valid (or silently refreshable) access token
///
/// Inserts [`AdminClaims`] into the request extensions. A refreshed access
/// token is written back as a new access cookie on the response.
pub async fn require_admin<R, N>(
    State(state): State<AdminAppState<R, N>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: AdminStore,
    N: Notifier,
{
    let config = &state.config;
    let headers = req.headers();
    let access_token = extract_cookie(headers, &config.access_cookie_name);
    let refresh_token = extract_cookie(headers, &config.refresh_cookie_name);
    let refresh_token_id = extract_cookie(headers, &config.refresh_id_cookie_name);

    let use_case = AuthorizeUseCase::new(state.repo.clone(), state.tokens.clone());

    let authorized = use_case
        .execute(AccessCredentials {
            access_token: access_token.as_deref(),
            refresh_token: refresh_token.as_deref(),
            refresh_token_id: refresh_token_id.as_deref(),
        })
        .await
        .map_err(IntoResponse::into_response)?;

    req.extensions_mut().insert(authorized.principal);

    let mut response = next.run(req).await;

    if let Some(token) = authorized.refreshed_access_token {
        match set_cookie_header(&config.access_cookie(), &access_cookie_value(&token)) {
            Some(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            None => tracing::error!("Refreshed access token is not a valid header value"),
        }
    }

    Ok(response)
}

/// Middleware that requires the `SUPER_ADMIN` role
///
/// Must run inside [`require_admin`].
pub async fn require_super_admin(req: Request<Body>, next: Next) -> Result<Response, Response> {
    require_role(req.extensions().get::<AdminClaims>(), AdminRole::SuperAdmin)
        .map_err(IntoResponse::into_response)?;

    Ok(next.run(req).await)
}
