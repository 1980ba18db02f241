use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use taskflow_auth::{IssuedToken, Role, UserAccount};
use taskflow_core::{CommentId, TaskId, UserId};
use taskflow_infra::TaskFilter;
use taskflow_tasks::{Comment, Priority, Status, Task, TaskDraft, TaskEdit, TaskPatch};

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for TokenResponse {
    fn from(t: IssuedToken) -> Self {
        Self {
            token: t.token,
            token_type: "Bearer",
            issued_at: t.issued_at,
            expires_at: t.expires_at,
        }
    }
}

/// Account as shown to clients; never includes the password hash.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub enabled: bool,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAccount> for AccountResponse {
    fn from(a: UserAccount) -> Self {
        Self {
            id: a.id,
            email: a.email,
            role: a.role,
            enabled: a.enabled,
            locked: a.locked,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tasks
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    /// Executor email.
    pub executor: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl CreateTaskRequest {
    pub fn into_parts(self) -> (TaskDraft, Option<String>) {
        let draft = TaskDraft {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        };
        (draft, self.executor)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    /// Absent keeps, empty clears, an email sets.
    pub executor: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl UpdateTaskRequest {
    pub fn into_parts(self) -> (TaskEdit, Option<String>) {
        let edit = TaskEdit {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        };
        (edit, self.executor)
    }
}

#[derive(Debug, Deserialize)]
pub struct PatchTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub executor: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl PatchTaskRequest {
    pub fn into_parts(self) -> (TaskPatch, Option<String>) {
        let patch = TaskPatch {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
        };
        (patch, self.executor)
    }
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: Status,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<Status>,
    pub user: Option<String>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}

impl From<TaskListQuery> for TaskFilter {
    fn from(q: TaskListQuery) -> Self {
        TaskFilter {
            status: q.status,
            user: q.user,
            due_from: q.due_from,
            due_to: q.due_to,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub author: String,
    pub executor: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        Self {
            id: t.id_typed(),
            title: t.title().to_string(),
            description: t.description().map(str::to_string),
            status: t.status(),
            priority: t.priority(),
            author: t.author().to_string(),
            executor: t.executor().map(str::to_string),
            due_date: t.due_date(),
            created_at: t.created_at(),
            updated_at: t.updated_at(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Comments
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: CommentId,
    pub task_id: TaskId,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id_typed(),
            task_id: c.task_id(),
            author: c.author().to_string(),
            text: c.text().to_string(),
            created_at: c.created_at(),
            updated_at: c.updated_at(),
        }
    }
}

pub fn many<T, R: From<T>>(items: Vec<T>) -> Vec<R> {
    items.into_iter().map(R::from).collect()
}
