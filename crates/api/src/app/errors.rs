//! Error responses.
//!
//! Handlers and middleware return [`ApiError`]. It only sets the status and
//! stashes an [`ErrorPayload`] in the response extensions; [`error_envelope`]
//! turns that into the JSON body once the request path is known.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use taskflow_core::FieldError;
use taskflow_infra::{ResourceKind, ServiceError};

#[derive(Debug, Clone)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub text: String,
    pub details: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub error: &'static str,
    pub message: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
    pub details: Vec<FieldError>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    payload: ErrorPayload,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, text: impl Into<String>) -> Self {
        Self {
            status,
            payload: ErrorPayload {
                code,
                text: text.into(),
                details: Vec::new(),
            },
        }
    }

    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.payload.details = details;
        self
    }

    pub fn validation(text: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VAL-001", text).with_details(details)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "unexpected failure");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "SYS-001", "Unexpected internal error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.payload.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut res = self.status.into_response();
        res.extensions_mut().insert(self.payload);
        res
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        use ServiceError as E;

        match err {
            E::NotAuthenticated => ApiError::new(StatusCode::UNAUTHORIZED, "AUTH-001", "Authentication required"),
            E::InvalidCredentials => ApiError::new(StatusCode::UNAUTHORIZED, "AUTH-001", "Invalid email or password"),
            E::Forbidden { resource, .. } => match resource {
                ResourceKind::Task => {
                    ApiError::new(StatusCode::FORBIDDEN, "TASK-002", "Not allowed to perform this action on the task")
                }
                ResourceKind::Comment => ApiError::new(
                    StatusCode::FORBIDDEN,
                    "CMT-002",
                    "Not allowed to perform this action on the comment",
                ),
                ResourceKind::UserDirectory => {
                    ApiError::new(StatusCode::FORBIDDEN, "AUTH-002", "Administrator role required")
                }
            },
            E::TaskNotFound(id) => ApiError::new(StatusCode::NOT_FOUND, "TASK-001", format!("Task {id} not found")),
            E::CommentNotFound(id) => {
                ApiError::new(StatusCode::NOT_FOUND, "CMT-001", format!("Comment {id} not found"))
            }
            E::UserNotFound(who) => ApiError::new(StatusCode::NOT_FOUND, "USR-002", format!("User {who} not found")),
            E::PrincipalNotFound(who) => ApiError::new(
                StatusCode::NOT_FOUND,
                "USR-002",
                format!("Authenticated user {who} not found"),
            ),
            E::DuplicateIdentity(who) => {
                ApiError::new(StatusCode::CONFLICT, "USR-001", format!("User {who} is already registered"))
            }
            E::WrongPassword => ApiError::new(StatusCode::BAD_REQUEST, "USR-003", "Current password is incorrect"),
            E::PasswordUnchanged => ApiError::new(
                StatusCode::CONFLICT,
                "USR-004",
                "New password must differ from the current one",
            ),
            E::InvalidDateRange { start, end } => ApiError::new(
                StatusCode::BAD_REQUEST,
                "TASK-003",
                format!("Invalid date range: {start} is after {end}"),
            ),
            E::Validation(fields) => ApiError::validation("Validation failed", fields),
            E::Internal(e) => ApiError::internal(e),
        }
    }
}

/// Render stashed [`ErrorPayload`]s as the JSON error envelope.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut res = next.run(req).await;

    let Some(payload) = res.extensions_mut().remove::<ErrorPayload>() else {
        return res;
    };

    let status = res.status();
    let body = ErrorEnvelope {
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("Error"),
        message: format!("{}: {}", payload.code, payload.text),
        path,
        timestamp: Utc::now(),
        details: payload.details,
    };
    (status, Json(body)).into_response()
}
