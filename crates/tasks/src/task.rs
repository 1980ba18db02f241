use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use taskflow_auth::TaskSnapshot;
use taskflow_core::{DomainResult, Entity, TaskId, Validator};

use crate::{Priority, Status};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Fields chosen by the creator of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

/// Full replacement of the editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEdit {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

/// Partial edit: only `Some` fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
}

/// A tracked unit of work.
///
/// `author` is fixed at creation. People are referenced by identity (email).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    status: Status,
    priority: Priority,
    author: String,
    executor: Option<String>,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub fn create(draft: TaskDraft, author: String, executor: Option<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_text(&draft.title, draft.description.as_deref())?;

        Ok(Self {
            id: TaskId::new(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            status: draft.status.unwrap_or_default(),
            priority: draft.priority.unwrap_or_default(),
            author,
            executor,
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn executor(&self) -> Option<&str> {
        self.executor.as_deref()
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Ownership facts for authorization.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            author: self.author.clone(),
            executor: self.executor.clone(),
        }
    }

    /// Author or executor.
    pub fn involves(&self, identity: &str) -> bool {
        self.author == identity || self.executor.as_deref() == Some(identity)
    }

    pub fn is_due_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.due_date.is_some_and(|d| start <= d && d <= end)
    }

    pub fn apply_edit(&mut self, edit: TaskEdit, now: DateTime<Utc>) -> DomainResult<()> {
        validate_text(&edit.title, edit.description.as_deref())?;

        self.title = edit.title.trim().to_string();
        self.description = edit.description;
        self.status = edit.status;
        self.priority = edit.priority;
        self.due_date = edit.due_date;
        self.touch(now);
        Ok(())
    }

    pub fn apply_patch(&mut self, patch: TaskPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let title = patch.title.as_deref().unwrap_or(&self.title);
        let description = patch.description.as_deref().or(self.description.as_deref());
        validate_text(title, description)?;

        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        self.touch(now);
        Ok(())
    }

    pub fn set_executor(&mut self, executor: Option<String>, now: DateTime<Utc>) {
        self.executor = executor;
        self.touch(now);
    }

    pub fn set_status(&mut self, status: Status, now: DateTime<Utc>) {
        self.status = status;
        self.touch(now);
    }

    /// Move along the happy path; returns the resulting status.
    pub fn advance_status(&mut self, now: DateTime<Utc>) -> Status {
        let next = self.status.next_status();
        if next != self.status {
            self.set_status(next, now);
        }
        self.status
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> TaskId {
        self.id
    }
}

fn validate_text(title: &str, description: Option<&str>) -> DomainResult<()> {
    let mut v = Validator::new();
    v.check(!title.trim().is_empty(), "title", "must not be blank")
        .check(
            title.trim().chars().count() <= MAX_TITLE_CHARS,
            "title",
            "must be at most 100 characters",
        )
        .check(
            description.is_none_or(|d| d.chars().count() <= MAX_DESCRIPTION_CHARS),
            "description",
            "must be at most 1000 characters",
        );
    v.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            ..TaskDraft::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn create_applies_defaults() {
        let t = Task::create(draft("  Write report "), "a@x.io".into(), None, t0()).unwrap();
        assert_eq!(t.title(), "Write report");
        assert_eq!(t.status(), Status::Waiting);
        assert_eq!(t.priority(), Priority::Medium);
        assert_eq!(t.author(), "a@x.io");
        assert_eq!(t.executor(), None);
        assert_eq!(t.created_at(), t.updated_at());
    }

    #[test]
    fn create_rejects_blank_and_oversized_text() {
        assert!(Task::create(draft("   "), "a".into(), None, t0()).is_err());
        assert!(Task::create(draft(&"x".repeat(101)), "a".into(), None, t0()).is_err());

        let mut long = draft("ok");
        long.description = Some("d".repeat(1001));
        let err = Task::create(long, "a".into(), None, t0()).unwrap_err();
        assert_eq!(err.fields()[0].field, "description");
    }

    #[test]
    fn snapshot_carries_ownership() {
        let t = Task::create(draft("t"), "a".into(), Some("b".into()), t0()).unwrap();
        assert_eq!(
            t.snapshot(),
            TaskSnapshot {
                author: "a".into(),
                executor: Some("b".into())
            }
        );
        assert!(t.involves("a") && t.involves("b") && !t.involves("c"));
    }

    #[test]
    fn edit_replaces_fields_and_touches() {
        let mut t = Task::create(draft("t"), "a".into(), None, t0()).unwrap();
        let later = t0() + chrono::Duration::minutes(5);
        t.apply_edit(
            TaskEdit {
                title: "new".into(),
                description: None,
                status: Status::OnHold,
                priority: Priority::Low,
                due_date: Some(date(2025, 7, 1)),
            },
            later,
        )
        .unwrap();
        assert_eq!(t.title(), "new");
        assert_eq!(t.status(), Status::OnHold);
        assert_eq!(t.updated_at(), later);
        assert_eq!(t.created_at(), t0());
    }

    #[test]
    fn failed_patch_leaves_task_untouched() {
        let mut t = Task::create(draft("t"), "a".into(), None, t0()).unwrap();
        let before = t.clone();
        let patch = TaskPatch {
            title: Some(" ".into()),
            status: Some(Status::Completed),
            ..TaskPatch::default()
        };
        assert!(t.apply_patch(patch, t0()).is_err());
        assert_eq!(t, before);
    }

    #[test]
    fn patch_changes_only_present_fields() {
        let mut t = Task::create(draft("t"), "a".into(), None, t0()).unwrap();
        t.apply_patch(
            TaskPatch {
                priority: Some(Priority::High),
                ..TaskPatch::default()
            },
            t0(),
        )
        .unwrap();
        assert_eq!(t.title(), "t");
        assert_eq!(t.priority(), Priority::High);
        assert_eq!(t.status(), Status::Waiting);
    }

    #[test]
    fn advance_follows_happy_path_and_stops() {
        let mut t = Task::create(draft("t"), "a".into(), None, t0()).unwrap();
        assert_eq!(t.advance_status(t0()), Status::InProgress);
        assert_eq!(t.advance_status(t0()), Status::InReview);
        assert_eq!(t.advance_status(t0()), Status::Completed);
        assert_eq!(t.advance_status(t0()), Status::Completed);
    }

    #[test]
    fn due_window_is_inclusive() {
        let mut d = draft("t");
        d.due_date = Some(date(2025, 6, 30));
        let t = Task::create(d, "a".into(), None, t0()).unwrap();
        assert!(t.is_due_between(date(2025, 6, 30), date(2025, 6, 30)));
        assert!(!t.is_due_between(date(2025, 7, 1), date(2025, 7, 2)));

        let undated = Task::create(draft("u"), "a".into(), None, t0()).unwrap();
        assert!(!undated.is_due_between(date(2000, 1, 1), date(2100, 1, 1)));
    }
}
