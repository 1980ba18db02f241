use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use taskflow_auth::{Principal, TaskBoard, TaskBoardOp, TaskOp, normalize_email};
use taskflow_core::{TaskId, UserId};
use taskflow_tasks::{Comment, Status, Task, TaskDraft, TaskEdit, TaskPatch};

use super::{ResourceKind, ServiceError, ServiceResult, authenticate, authorize};
use crate::store::{InMemoryStore, InMemoryUserStore};

/// How an edit treats the executor field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExecutorChange {
    #[default]
    Keep,
    Clear,
    Set(String),
}

impl ExecutorChange {
    /// Absent keeps, blank clears, anything else names the new executor.
    pub fn from_field(field: Option<&str>) -> Self {
        match field {
            None => ExecutorChange::Keep,
            Some(s) if s.trim().is_empty() => ExecutorChange::Clear,
            Some(s) => ExecutorChange::Set(s.to_string()),
        }
    }
}

/// Conjunctive listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<Status>,
    /// Author or executor.
    pub user: Option<String>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}

impl TaskFilter {
    fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status() == s)
            && self.user.as_deref().is_none_or(|u| task.involves(u))
            && match (self.due_from, self.due_to) {
                (None, None) => true,
                (from, to) => task.is_due_between(from.unwrap_or(NaiveDate::MIN), to.unwrap_or(NaiveDate::MAX)),
            }
    }
}

#[derive(Debug, Clone)]
pub struct TaskService {
    tasks: Arc<InMemoryStore<Task>>,
    comments: Arc<InMemoryStore<Comment>>,
    users: Arc<InMemoryUserStore>,
}

impl TaskService {
    pub fn new(
        tasks: Arc<InMemoryStore<Task>>,
        comments: Arc<InMemoryStore<Comment>>,
        users: Arc<InMemoryUserStore>,
    ) -> Self {
        Self { tasks, comments, users }
    }

    pub fn create(&self, principal: Option<&Principal>, draft: TaskDraft, executor: Option<&str>) -> ServiceResult<Task> {
        let p = authenticate(principal)?;
        authorize(p, &TaskBoard, TaskBoardOp::Create, ResourceKind::Task)?;

        let executor = match ExecutorChange::from_field(executor) {
            ExecutorChange::Set(email) => Some(self.existing_identity(&email)?),
            ExecutorChange::Keep | ExecutorChange::Clear => None,
        };

        let task = Task::create(draft, p.identity.clone(), executor, Utc::now())?;
        self.tasks.insert(task.clone())?;
        tracing::info!(task_id = %task.id_typed(), author = %p.identity, "task created");
        Ok(task)
    }

    pub fn get(&self, principal: Option<&Principal>, id: TaskId) -> ServiceResult<Task> {
        let p = authenticate(principal)?;
        let task = self.tasks.get(id)?.ok_or(ServiceError::TaskNotFound(id))?;
        authorize(p, &task.snapshot(), TaskOp::Read, ResourceKind::Task)?;
        Ok(task)
    }

    /// Tasks matching `filter`, oldest first.
    pub fn list(&self, principal: Option<&Principal>, filter: &TaskFilter) -> ServiceResult<Vec<Task>> {
        let p = authenticate(principal)?;
        authorize(p, &TaskBoard, TaskBoardOp::List, ResourceKind::Task)?;

        if let (Some(start), Some(end)) = (filter.due_from, filter.due_to) {
            if start > end {
                return Err(ServiceError::InvalidDateRange { start, end });
            }
        }

        let filter = TaskFilter {
            user: filter.user.as_deref().map(normalize_email),
            ..filter.clone()
        };
        let mut found = self.tasks.filter(|t| filter.matches(t))?;
        found.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id_typed().cmp(&b.id_typed()))
        });
        Ok(found)
    }

    pub fn list_by_status(&self, principal: Option<&Principal>, status: Status) -> ServiceResult<Vec<Task>> {
        self.list(
            principal,
            &TaskFilter {
                status: Some(status),
                ..TaskFilter::default()
            },
        )
    }

    /// Tasks the given identity authored or executes.
    pub fn list_by_user(&self, principal: Option<&Principal>, email: &str) -> ServiceResult<Vec<Task>> {
        self.list(
            principal,
            &TaskFilter {
                user: Some(email.to_string()),
                ..TaskFilter::default()
            },
        )
    }

    pub fn list_due_between(
        &self,
        principal: Option<&Principal>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<Vec<Task>> {
        self.list(
            principal,
            &TaskFilter {
                due_from: Some(start),
                due_to: Some(end),
                ..TaskFilter::default()
            },
        )
    }

    /// Tasks the caller executes.
    pub fn list_mine(&self, principal: Option<&Principal>) -> ServiceResult<Vec<Task>> {
        let p = authenticate(principal)?;
        let mine = self.list(principal, &TaskFilter::default())?;
        Ok(mine.into_iter().filter(|t| t.executor() == Some(p.identity.as_str())).collect())
    }

    /// Full edit.
    pub fn update(
        &self,
        principal: Option<&Principal>,
        id: TaskId,
        edit: TaskEdit,
        executor: ExecutorChange,
    ) -> ServiceResult<Task> {
        let p = authenticate(principal)?;
        let updated = self
            .tasks
            .try_update(id, |task| {
                authorize(p, &task.snapshot(), TaskOp::Edit, ResourceKind::Task)?;
                let executor = self.resolve_change(&executor)?;
                task.apply_edit(edit, Utc::now())?;
                if let Some(executor) = executor {
                    task.set_executor(executor, Utc::now());
                }
                Ok::<_, ServiceError>(task.clone())
            })?
            .ok_or(ServiceError::TaskNotFound(id))?;

        tracing::info!(task_id = %id, by = %p.identity, "task updated");
        Ok(updated)
    }

    /// Partial edit.
    pub fn patch(
        &self,
        principal: Option<&Principal>,
        id: TaskId,
        patch: TaskPatch,
        executor: ExecutorChange,
    ) -> ServiceResult<Task> {
        let p = authenticate(principal)?;
        let updated = self
            .tasks
            .try_update(id, |task| {
                authorize(p, &task.snapshot(), TaskOp::Edit, ResourceKind::Task)?;
                let executor = self.resolve_change(&executor)?;
                task.apply_patch(patch, Utc::now())?;
                if let Some(executor) = executor {
                    task.set_executor(executor, Utc::now());
                }
                Ok::<_, ServiceError>(task.clone())
            })?
            .ok_or(ServiceError::TaskNotFound(id))?;

        tracing::info!(task_id = %id, by = %p.identity, "task patched");
        Ok(updated)
    }

    /// Delete the task and its comments.
    pub fn delete(&self, principal: Option<&Principal>, id: TaskId) -> ServiceResult<()> {
        let p = authenticate(principal)?;
        self.tasks
            .try_remove(id, |task| authorize(p, &task.snapshot(), TaskOp::Delete, ResourceKind::Task))?
            .ok_or(ServiceError::TaskNotFound(id))?;

        let dropped = self.comments.remove_where(|c| c.task_id() == id)?;
        tracing::info!(task_id = %id, by = %p.identity, comments = dropped, "task deleted");
        Ok(())
    }

    pub fn assign_executor(&self, principal: Option<&Principal>, id: TaskId, user_id: UserId) -> ServiceResult<Task> {
        let p = authenticate(principal)?;
        let updated = self
            .tasks
            .try_update(id, |task| {
                authorize(p, &task.snapshot(), TaskOp::AssignExecutor, ResourceKind::Task)?;
                let executor = self
                    .users
                    .get(user_id)?
                    .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))?;
                task.set_executor(Some(executor.email), Utc::now());
                Ok::<_, ServiceError>(task.clone())
            })?
            .ok_or(ServiceError::TaskNotFound(id))?;

        tracing::info!(task_id = %id, executor = ?updated.executor(), "executor assigned");
        Ok(updated)
    }

    /// Set any status; not restricted to the happy path.
    pub fn set_status(&self, principal: Option<&Principal>, id: TaskId, status: Status) -> ServiceResult<Task> {
        let p = authenticate(principal)?;
        let updated = self
            .tasks
            .try_update(id, |task| {
                authorize(p, &task.snapshot(), TaskOp::ChangeStatus, ResourceKind::Task)?;
                task.set_status(status, Utc::now());
                Ok::<_, ServiceError>(task.clone())
            })?
            .ok_or(ServiceError::TaskNotFound(id))?;

        tracing::info!(task_id = %id, %status, by = %p.identity, "task status set");
        Ok(updated)
    }

    pub fn advance_status(&self, principal: Option<&Principal>, id: TaskId) -> ServiceResult<Task> {
        let p = authenticate(principal)?;
        let updated = self
            .tasks
            .try_update(id, |task| {
                authorize(p, &task.snapshot(), TaskOp::ChangeStatus, ResourceKind::Task)?;
                task.advance_status(Utc::now());
                Ok::<_, ServiceError>(task.clone())
            })?
            .ok_or(ServiceError::TaskNotFound(id))?;

        tracing::info!(task_id = %id, status = %updated.status(), by = %p.identity, "task status advanced");
        Ok(updated)
    }

    fn existing_identity(&self, email: &str) -> ServiceResult<String> {
        let email = normalize_email(email);
        match self.users.find_by_email(&email)? {
            Some(account) => Ok(account.email),
            None => Err(ServiceError::UserNotFound(email)),
        }
    }

    /// `None` keeps the executor; `Some(None)` clears it.
    fn resolve_change(&self, change: &ExecutorChange) -> ServiceResult<Option<Option<String>>> {
        match change {
            ExecutorChange::Keep => Ok(None),
            ExecutorChange::Clear => Ok(Some(None)),
            ExecutorChange::Set(email) => Ok(Some(Some(self.existing_identity(email)?))),
        }
    }
}
