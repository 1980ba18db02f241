use axum::{routing::post, Router};

use crate::app::errors::ApiError;

pub mod comments;
pub mod system;
pub mod tasks;
pub mod users;

/// `/api` endpoints that run without the principal middleware, so a stale
/// credential cannot block registering or logging in.
pub fn public_router() -> Router {
    Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
}

/// `/api` endpoints that receive a [`RequestContext`](crate::context::RequestContext).
pub fn router() -> Router {
    Router::new()
        .nest("/users", users::router())
        .nest("/tasks", tasks::router())
        .nest("/comments", comments::router())
}

/// Run a blocking or CPU-heavy service call off the async workers.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(anyhow::Error::new(e)))?
}
