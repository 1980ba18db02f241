use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, routing::get, Json, Router};

use taskflow_core::CommentId;

use crate::app::dto::{CommentRequest, CommentResponse};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, ApiPath};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new().route("/:id", get(get_comment).put(update_comment).delete(delete_comment))
}

/// GET /api/comments/:id
pub async fn get_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<CommentId>,
) -> Result<Json<CommentResponse>, ApiError> {
    Ok(Json(services.comments.get(ctx.principal(), id)?.into()))
}

/// PUT /api/comments/:id
pub async fn update_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<CommentId>,
    ApiJson(body): ApiJson<CommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    Ok(Json(services.comments.update(ctx.principal(), id, body.text)?.into()))
}

/// DELETE /api/comments/:id
pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<CommentId>,
) -> Result<StatusCode, ApiError> {
    services.comments.delete(ctx.principal(), id)?;
    Ok(StatusCode::NO_CONTENT)
}
