use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use taskflow_auth::PrincipalResolver;
use taskflow_infra::ServiceError;

use crate::app::errors::ApiError;
use crate::context::RequestContext;

#[derive(Clone, Debug)]
pub struct AuthState {
    pub resolver: PrincipalResolver,
}

/// Resolve the caller once per request and attach a [`RequestContext`].
///
/// Missing or invalid credentials yield an anonymous context; protected
/// handlers reject it later with `AUTH-001`. A valid token whose account no
/// longer exists is rejected here.
pub async fn principal_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    // A header that is not valid visible ASCII cannot carry a bearer token.
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let resolver = state.resolver.clone();
    let resolved = tokio::task::spawn_blocking(move || resolver.resolve(header.as_deref())).await;

    let ctx = match resolved {
        Ok(Ok(Some(principal))) => RequestContext::authenticated(principal),
        Ok(Ok(None)) => RequestContext::anonymous(),
        Ok(Err(e)) => return ApiError::from(ServiceError::from(e)).into_response(),
        Err(join) => return ApiError::internal(anyhow::Error::new(join)).into_response(),
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}
