//! Task routes, plus the comment collection of a task.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use taskflow_core::{TaskId, UserId};
use taskflow_infra::{ExecutorChange, TaskFilter};

use crate::app::dto::{
    self, CommentRequest, CommentResponse, CreateTaskRequest, PatchTaskRequest, SetStatusRequest, TaskListQuery,
    TaskResponse, UpdateTaskRequest,
};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, ApiPath, ApiQuery};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_task).get(list_tasks))
        .route("/my", get(list_my_tasks))
        .route(
            "/:id",
            get(get_task).put(update_task).patch(patch_task).delete(delete_task),
        )
        .route("/:id/assign/:user_id", post(assign_executor))
        .route("/:id/status", put(set_status))
        .route("/:id/status/next", post(advance_status))
        .route("/:id/comments", get(list_comments).post(create_comment))
}

/// POST /api/tasks
pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(body): ApiJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (draft, executor) = body.into_parts();
    let task = services.tasks.create(ctx.principal(), draft, executor.as_deref())?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// GET /api/tasks?status=&user=&due_from=&due_to=
pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiQuery(query): ApiQuery<TaskListQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let filter = TaskFilter::from(query);
    Ok(Json(dto::many(services.tasks.list(ctx.principal(), &filter)?)))
}

/// GET /api/tasks/my
pub async fn list_my_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    Ok(Json(dto::many(services.tasks.list_mine(ctx.principal())?)))
}

/// GET /api/tasks/:id
pub async fn get_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<TaskResponse>, ApiError> {
    Ok(Json(services.tasks.get(ctx.principal(), id)?.into()))
}

/// PUT /api/tasks/:id
pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(body): ApiJson<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let (edit, executor) = body.into_parts();
    let change = ExecutorChange::from_field(executor.as_deref());
    Ok(Json(services.tasks.update(ctx.principal(), id, edit, change)?.into()))
}

/// PATCH /api/tasks/:id
pub async fn patch_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(body): ApiJson<PatchTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let (patch, executor) = body.into_parts();
    let change = ExecutorChange::from_field(executor.as_deref());
    Ok(Json(services.tasks.patch(ctx.principal(), id, patch, change)?.into()))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<StatusCode, ApiError> {
    services.tasks.delete(ctx.principal(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/tasks/:id/assign/:user_id
pub async fn assign_executor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath((id, user_id)): ApiPath<(TaskId, UserId)>,
) -> Result<Json<TaskResponse>, ApiError> {
    Ok(Json(services.tasks.assign_executor(ctx.principal(), id, user_id)?.into()))
}

/// PUT /api/tasks/:id/status
pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(body): ApiJson<SetStatusRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    Ok(Json(services.tasks.set_status(ctx.principal(), id, body.status)?.into()))
}

/// POST /api/tasks/:id/status/next
pub async fn advance_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<TaskResponse>, ApiError> {
    Ok(Json(services.tasks.advance_status(ctx.principal(), id)?.into()))
}

/// GET /api/tasks/:id/comments
pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    Ok(Json(dto::many(services.comments.list_for_task(ctx.principal(), id)?)))
}

/// POST /api/tasks/:id/comments
pub async fn create_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(body): ApiJson<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = services.comments.create(ctx.principal(), id, body.text)?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}
