//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse};
use kernel::id::AdminId;
use kernel::response::ApiResponse;
use platform::cookie::extract_cookie;
use std::sync::Arc;

use crate::application::config::AdminAuthConfig;
use crate::application::manage_admins::{
    AdminListQuery, CreateAdminInput, ManageAdminsUseCase, ProfileChanges,
};
use crate::application::sign_in::{SignInInput, SignInUseCase};
use crate::application::sign_out::SignOutUseCase;
use crate::application::token::{AdminClaims, TokenService};
use crate::application::verify_otp::{VerifyOtpInput, VerifyOtpUseCase};
use crate::domain::notifier::Notifier;
use crate::domain::repository::AdminStore;
use crate::error::{AdminError, AdminResult};
use crate::presentation::dto::{
    AdminListResponse, AdminResponse, CreateAdminRequest, ListAdminsQuery, LoginRequest,
    LoginResponse, UpdateAdminRequest, UpdateMeRequest, VerifyOtpRequest, VerifyOtpResponse,
};

/// Shared state for admin handlers
#[derive(Clone)]
pub struct AdminAppState<R, N>
where
    R: AdminStore,
    N: Notifier,
{
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AdminAuthConfig>,
}

impl<R, N> AdminAppState<R, N>
where
    R: AdminStore,
    N: Notifier,
{
    fn manage_admins(&self) -> ManageAdminsUseCase<R> {
        ManageAdminsUseCase::new(self.repo.clone(), self.config.clone())
    }
}

/// The access cookie carries `Bearer <jwt>` with the space percent-encoded
pub(crate) fn access_cookie_value(bearer_token: &str) -> String {
    bearer_token.replacen(' ', "%20", 1)
}

fn parse_admin_id(raw: &str) -> AdminResult<AdminId> {
    raw.parse()
        .map_err(|_| AdminError::Validation("id must be a valid UUID".to_string()))
}

// ============================================================================
// Login / OTP / Logout
// ============================================================================

/// POST /api/admins/login
pub async fn login<R, N>(
    State(state): State<AdminAppState<R, N>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AdminResult<ApiResponse<LoginResponse>>
where
    R: AdminStore,
    N: Notifier,
{
    let Json(req) = payload?;

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let challenge = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(ApiResponse::success(
        "OTP sent to email",
        LoginResponse {
            session_id: challenge.session_id,
            email: challenge.email.as_str().to_string(),
        },
    ))
}

/// POST /api/admins/verify-otp
pub async fn verify_otp<R, N>(
    State(state): State<AdminAppState<R, N>>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> AdminResult<impl IntoResponse>
where
    R: AdminStore,
    N: Notifier,
{
    let Json(req) = payload?;

    let use_case = VerifyOtpUseCase::new(
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let issued = use_case
        .execute(VerifyOtpInput {
            session_id: req.session_id,
            otp: req.otp,
        })
        .await?;

    let config = &state.config;
    let cookies = AppendHeaders([
        (
            header::SET_COOKIE,
            config
                .access_cookie()
                .build_set_cookie(&access_cookie_value(&issued.access_token)),
        ),
        (
            header::SET_COOKIE,
            config
                .refresh_cookie()
                .build_set_cookie(&issued.refresh_token.token),
        ),
        (
            header::SET_COOKIE,
            config
                .refresh_id_cookie()
                .build_set_cookie(&issued.refresh_token.id.to_string()),
        ),
    ]);

    Ok((
        cookies,
        ApiResponse::success("OTP verified", VerifyOtpResponse::from(issued)),
    ))
}

/// GET /api/admins/logout
///
/// Always succeeds and always clears the cookies.
pub async fn logout<R, N>(
    State(state): State<AdminAppState<R, N>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: AdminStore,
    N: Notifier,
{
    let config = &state.config;
    let refresh_token = extract_cookie(&headers, &config.refresh_cookie_name);
    let refresh_token_id = extract_cookie(&headers, &config.refresh_id_cookie_name);

    let use_case = SignOutUseCase::new(state.repo.clone());
    if let Err(e) = use_case
        .execute(refresh_token_id.as_deref(), refresh_token.as_deref())
        .await
    {
        tracing::error!(error = %e, "Failed to revoke refresh token on logout");
    }

    (
        AppendHeaders([
            (header::SET_COOKIE, config.access_cookie().build_delete_cookie()),
            (header::SET_COOKIE, config.refresh_cookie().build_delete_cookie()),
            (header::SET_COOKIE, config.refresh_id_cookie().build_delete_cookie()),
        ]),
        ApiResponse::message("Logout successful"),
    )
}

// ============================================================================
// Own Profile
// ============================================================================

/// GET /api/admins/me
pub async fn get_me<R, N>(
    State(state): State<AdminAppState<R, N>>,
    Extension(principal): Extension<AdminClaims>,
) -> AdminResult<ApiResponse<AdminResponse>>
where
    R: AdminStore,
    N: Notifier,
{
    let admin = state.manage_admins().get(principal.id).await?;

    Ok(ApiResponse::success(
        "Admin fetched successfully",
        AdminResponse::from(admin),
    ))
}

/// PUT /api/admins/me
pub async fn update_me<R, N>(
    State(state): State<AdminAppState<R, N>>,
    Extension(principal): Extension<AdminClaims>,
    payload: Result<Json<UpdateMeRequest>, JsonRejection>,
) -> AdminResult<ApiResponse<AdminResponse>>
where
    R: AdminStore,
    N: Notifier,
{
    let Json(req) = payload?;

    let changes = ProfileChanges {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        country: req.country,
        city: req.city,
        role: None,
    };

    let admin = state.manage_admins().update_me(principal.id, changes).await?;

    Ok(ApiResponse::success(
        "Admin updated successfully",
        AdminResponse::from(admin),
    ))
}

// ============================================================================
// Super Admin
// ============================================================================

/// POST /api/admins/create-admin
pub async fn create_admin<R, N>(
    State(state): State<AdminAppState<R, N>>,
    payload: Result<Json<CreateAdminRequest>, JsonRejection>,
) -> AdminResult<impl IntoResponse>
where
    R: AdminStore,
    N: Notifier,
{
    let Json(req) = payload?;

    let admin = state
        .manage_admins()
        .create(CreateAdminInput {
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            country: req.country,
            city: req.city,
            role: req.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success("Admin created successfully", AdminResponse::from(admin)),
    ))
}

/// GET /api/admins
pub async fn list_admins<R, N>(
    State(state): State<AdminAppState<R, N>>,
    query: Result<Query<ListAdminsQuery>, QueryRejection>,
) -> AdminResult<ApiResponse<AdminListResponse>>
where
    R: AdminStore,
    N: Notifier,
{
    let Query(query) = query?;

    let page = state
        .manage_admins()
        .list(AdminListQuery {
            page: query.page,
            limit: query.limit,
            search: query.search,
            role: query.role,
        })
        .await?;

    Ok(ApiResponse::success(
        "Admins fetched successfully",
        AdminListResponse::from(page),
    ))
}

/// PUT /api/admins/{id}
pub async fn update_admin<R, N>(
    State(state): State<AdminAppState<R, N>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAdminRequest>, JsonRejection>,
) -> AdminResult<ApiResponse<AdminResponse>>
where
    R: AdminStore,
    N: Notifier,
{
    let Json(req) = payload?;

    let id = parse_admin_id(&id)?;

    let changes = ProfileChanges {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        country: req.country,
        city: req.city,
        role: req.role,
    };

    let admin = state.manage_admins().update(id, changes).await?;

    Ok(ApiResponse::success(
        "Admin updated successfully",
        AdminResponse::from(admin),
    ))
}

/// DELETE /api/admins/{id}
pub async fn delete_admin<R, N>(
    State(state): State<AdminAppState<R, N>>,
    Extension(principal): Extension<AdminClaims>,
    Path(id): Path<String>,
) -> AdminResult<ApiResponse<()>>
where
    R: AdminStore,
    N: Notifier,
{
    let id = parse_admin_id(&id)?;

    state.manage_admins().delete(principal.id, id).await?;

    Ok(ApiResponse::message("Admin deleted successfully"))
}
