//! Account routes: registration, login, self-service and administration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Json, Router,
};

use taskflow_core::UserId;

use crate::app::dto::{self, AccountResponse, ChangePasswordRequest, CredentialsRequest, TokenResponse, UpdateRoleRequest};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, ApiPath};
use crate::app::routes::blocking;
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/me", get(me))
        .route("/me/password", patch(change_password))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", delete(delete_user))
        .route("/admin/users/:id/role", put(update_role))
        .route("/admin/users/:id/lock", post(lock_user))
        .route("/admin/users/:id/unlock", post(unlock_user))
}

/// POST /api/users/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = blocking(move || Ok(services.accounts.register(&body.email, &body.password)?)).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// POST /api/users/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let issued = blocking(move || Ok(services.accounts.login(&body.email, &body.password)?)).await?;
    Ok(Json(issued.into()))
}

/// GET /api/users/me
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<AccountResponse>, ApiError> {
    Ok(Json(services.accounts.me(ctx.principal())?.into()))
}

/// PATCH /api/users/me/password
pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    blocking(move || {
        services
            .accounts
            .change_password(ctx.principal(), &body.old_password, &body.new_password)?;
        Ok(())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/admin/users
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    Ok(Json(dto::many(services.accounts.list_users(ctx.principal())?)))
}

/// PUT /api/users/admin/users/:id/role
pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<UpdateRoleRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    Ok(Json(services.accounts.update_role(ctx.principal(), id, body.role)?.into()))
}

/// POST /api/users/admin/users/:id/lock
pub async fn lock_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<AccountResponse>, ApiError> {
    Ok(Json(services.accounts.set_locked(ctx.principal(), id, true)?.into()))
}

/// POST /api/users/admin/users/:id/unlock
pub async fn unlock_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<AccountResponse>, ApiError> {
    Ok(Json(services.accounts.set_locked(ctx.principal(), id, false)?.into()))
}

/// DELETE /api/users/admin/users/:id
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<AccountResponse>, ApiError> {
    Ok(Json(services.accounts.delete_user(ctx.principal(), id)?.into()))
}
