//! Ownership- and role-based authorization decisions.
//!
//! Every protected operation is decided by [`AuthorizationPolicy::decide`]
//! against an immutable snapshot of the target resource. The policy is pure:
//! no I/O, no logging, no clock.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("not the owner of the resource")]
    NotOwner,

    #[error("insufficient role")]
    InsufficientRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenialReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn allow_if(ok: bool, otherwise: DenialReason) -> Self {
        if ok { Decision::Allow } else { Decision::Deny(otherwise) }
    }
}

/// Something an operation can be authorized against.
///
/// Implementors carry only the ownership facts needed to decide. `rule` is
/// only consulted for an active, authenticated principal.
pub trait Resource {
    type Operation: Copy + core::fmt::Debug;

    fn rule(&self, principal: &Principal, op: Self::Operation) -> Decision;
}

pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    pub fn decide<R: Resource>(principal: Option<&Principal>, resource: &R, op: R::Operation) -> Decision {
        match principal {
            Some(p) if p.is_active() => resource.rule(p, op),
            _ => Decision::Deny(DenialReason::NotAuthenticated),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tasks
// ─────────────────────────────────────────────────────────────────────────────

/// The task collection, for operations with no specific target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBoardOp {
    Create,
    List,
}

impl Resource for TaskBoard {
    type Operation = TaskBoardOp;

    fn rule(&self, _principal: &Principal, _op: TaskBoardOp) -> Decision {
        Decision::Allow
    }
}

/// Ownership facts of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub author: String,
    pub executor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOp {
    Read,
    Edit,
    Delete,
    AssignExecutor,
    ChangeStatus,
}

impl TaskSnapshot {
    fn is_author(&self, p: &Principal) -> bool {
        p.is(&self.author)
    }

    fn is_executor(&self, p: &Principal) -> bool {
        self.executor.as_deref().is_some_and(|e| p.is(e))
    }
}

impl Resource for TaskSnapshot {
    type Operation = TaskOp;

    fn rule(&self, p: &Principal, op: TaskOp) -> Decision {
        let ok = match op {
            TaskOp::Read => true,
            TaskOp::Edit | TaskOp::Delete => self.is_author(p) || p.role.is_admin(),
            TaskOp::AssignExecutor => self.is_author(p),
            TaskOp::ChangeStatus => {
                self.is_author(p) || self.is_executor(p) || p.role.is_admin()
            }
        };
        Decision::allow_if(ok, DenialReason::NotOwner)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Comments
// ─────────────────────────────────────────────────────────────────────────────

/// The comments of one task, for operations with no specific comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentThread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentThreadOp {
    Create,
    List,
}

impl Resource for CommentThread {
    type Operation = CommentThreadOp;

    fn rule(&self, _principal: &Principal, _op: CommentThreadOp) -> Decision {
        Decision::Allow
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSnapshot {
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOp {
    Read,
    Edit,
    Delete,
}

impl Resource for CommentSnapshot {
    type Operation = CommentOp;

    fn rule(&self, p: &Principal, op: CommentOp) -> Decision {
        let ok = match op {
            CommentOp::Read => true,
            // Admins may remove comments but never reword them.
            CommentOp::Edit => p.is(&self.author),
            CommentOp::Delete => p.is(&self.author) || p.role.is_admin(),
        };
        Decision::allow_if(ok, DenialReason::NotOwner)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct UserDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDirectoryOp {
    List,
    UpdateRole,
    Lock,
    Delete,
}

impl Resource for UserDirectory {
    type Operation = UserDirectoryOp;

    fn rule(&self, p: &Principal, _op: UserDirectoryOp) -> Decision {
        Decision::allow_if(p.role.at_least_as_privileged(Role::Admin), DenialReason::InsufficientRole)
    }
}
