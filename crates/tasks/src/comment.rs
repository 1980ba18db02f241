use chrono::{DateTime, Utc};

use taskflow_auth::CommentSnapshot;
use taskflow_core::{CommentId, DomainResult, Entity, TaskId, Validator};

pub const MAX_COMMENT_CHARS: usize = 2000;

/// A remark on a task. Task and author never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    id: CommentId,
    task_id: TaskId,
    author: String,
    text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn create(task_id: TaskId, author: String, text: String, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_text(&text)?;
        Ok(Self {
            id: CommentId::new(),
            task_id,
            author,
            text,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> CommentId {
        self.id
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn snapshot(&self) -> CommentSnapshot {
        CommentSnapshot {
            author: self.author.clone(),
        }
    }

    pub fn edit(&mut self, text: String, now: DateTime<Utc>) -> DomainResult<()> {
        validate_text(&text)?;
        self.text = text;
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> CommentId {
        self.id
    }
}

fn validate_text(text: &str) -> DomainResult<()> {
    let mut v = Validator::new();
    v.check(!text.trim().is_empty(), "text", "must not be blank").check(
        text.chars().count() <= MAX_COMMENT_CHARS,
        "text",
        "must be at most 2000 characters",
    );
    v.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_limits() {
        let task = TaskId::new();
        assert!(Comment::create(task, "a".into(), " \n".into(), Utc::now()).is_err());
        assert!(Comment::create(task, "a".into(), "x".repeat(2001), Utc::now()).is_err());
        assert!(Comment::create(task, "a".into(), "x".repeat(2000), Utc::now()).is_ok());
    }

    #[test]
    fn edit_keeps_author_and_task() {
        let task = TaskId::new();
        let mut c = Comment::create(task, "a".into(), "first".into(), Utc::now()).unwrap();
        let id = c.id();
        c.edit("second".into(), Utc::now()).unwrap();
        assert_eq!(c.text(), "second");
        assert_eq!(c.author(), "a");
        assert_eq!(c.task_id(), task);
        assert_eq!(c.id(), id);
        assert_eq!(c.snapshot().author, "a");
    }

    #[test]
    fn rejected_edit_keeps_text() {
        let mut c = Comment::create(TaskId::new(), "a".into(), "first".into(), Utc::now()).unwrap();
        assert!(c.edit(String::new(), Utc::now()).is_err());
        assert_eq!(c.text(), "first");
    }
}
