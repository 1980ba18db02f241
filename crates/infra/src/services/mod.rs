//! Request pipeline services.
//!
//! Every operation takes the optional acting principal and follows the same
//! order: authenticate (401), load the target (404), ask the policy (403),
//! mutate. Checks on existing entities run inside the store's write lock.

pub mod comments;
pub mod tasks;
pub mod users;

#[cfg(test)]
pub(crate) mod tests_support;

use chrono::NaiveDate;
use thiserror::Error;

use taskflow_auth::{AuthorizationPolicy, Decision, DenialReason, Principal, ResolveError, Resource};
use taskflow_core::{CommentId, DomainError, FieldError, TaskId};

use crate::store::StoreError;

pub use comments::CommentService;
pub use tasks::{ExecutorChange, TaskFilter, TaskService};
pub use users::AccountService;

/// What a denied operation targeted; selects the error code at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Task,
    Comment,
    UserDirectory,
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ResourceKind::Task => "task",
            ResourceKind::Comment => "comment",
            ResourceKind::UserDirectory => "user directory",
        })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{resource}: {reason}")]
    Forbidden { resource: ResourceKind, reason: DenialReason },

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("comment not found: {0}")]
    CommentNotFound(CommentId),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("authenticated principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("identity already registered: {0}")]
    DuplicateIdentity(String),

    #[error("current password is incorrect")]
    WrongPassword,

    #[error("new password must differ from the current one")]
    PasswordUnchanged,

    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate(key) => ServiceError::DuplicateIdentity(key),
            other => ServiceError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(fields) => ServiceError::Validation(fields),
            DomainError::InvalidId(msg) => ServiceError::Validation(vec![FieldError::new("id", msg)]),
        }
    }
}

impl From<ResolveError> for ServiceError {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::PrincipalNotFound(identity) => ServiceError::PrincipalNotFound(identity),
            ResolveError::Lookup(e) => ServiceError::Internal(anyhow::Error::new(e)),
        }
    }
}

/// First pipeline step: an active principal or 401.
pub fn authenticate(principal: Option<&Principal>) -> ServiceResult<&Principal> {
    match principal {
        Some(p) if p.is_active() => Ok(p),
        Some(p) => {
            tracing::warn!(identity = %p.identity, "inactive principal treated as unauthenticated");
            Err(ServiceError::NotAuthenticated)
        }
        None => Err(ServiceError::NotAuthenticated),
    }
}

/// Ask the policy; a denial becomes the matching `ServiceError`.
pub(crate) fn authorize<R: Resource>(
    principal: &Principal,
    resource: &R,
    op: R::Operation,
    kind: ResourceKind,
) -> ServiceResult<()> {
    match AuthorizationPolicy::decide(Some(principal), resource, op) {
        Decision::Allow => Ok(()),
        Decision::Deny(DenialReason::NotAuthenticated) => Err(ServiceError::NotAuthenticated),
        Decision::Deny(reason) => {
            tracing::warn!(identity = %principal.identity, resource = %kind, ?op, %reason, "operation denied");
            Err(ServiceError::Forbidden { resource: kind, reason })
        }
    }
}
