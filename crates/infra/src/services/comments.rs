use std::sync::Arc;

use chrono::Utc;

use taskflow_auth::{CommentOp, CommentThread, CommentThreadOp, Principal};
use taskflow_core::{CommentId, TaskId};
use taskflow_tasks::{Comment, Task};

use super::{ResourceKind, ServiceError, ServiceResult, authenticate, authorize};
use crate::store::InMemoryStore;

#[derive(Debug, Clone)]
pub struct CommentService {
    tasks: Arc<InMemoryStore<Task>>,
    comments: Arc<InMemoryStore<Comment>>,
}

impl CommentService {
    pub fn new(tasks: Arc<InMemoryStore<Task>>, comments: Arc<InMemoryStore<Comment>>) -> Self {
        Self { tasks, comments }
    }

    pub fn create(&self, principal: Option<&Principal>, task_id: TaskId, text: String) -> ServiceResult<Comment> {
        let p = authenticate(principal)?;

        // Insert under the task read guard; task deletion sweeps comments only
        // after the task is gone.
        let comment = self
            .tasks
            .read_with(task_id, |_task| {
                authorize(p, &CommentThread, CommentThreadOp::Create, ResourceKind::Comment)?;
                let comment = Comment::create(task_id, p.identity.clone(), text, Utc::now())?;
                self.comments.insert(comment.clone())?;
                Ok::<_, ServiceError>(comment)
            })?
            .ok_or(ServiceError::TaskNotFound(task_id))?;

        tracing::info!(comment_id = %comment.id_typed(), %task_id, author = %p.identity, "comment created");
        Ok(comment)
    }

    /// Comments of a task, oldest first.
    pub fn list_for_task(&self, principal: Option<&Principal>, task_id: TaskId) -> ServiceResult<Vec<Comment>> {
        let p = authenticate(principal)?;
        if self.tasks.get(task_id)?.is_none() {
            return Err(ServiceError::TaskNotFound(task_id));
        }
        authorize(p, &CommentThread, CommentThreadOp::List, ResourceKind::Comment)?;

        let mut found = self.comments.filter(|c| c.task_id() == task_id)?;
        found.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id_typed().cmp(&b.id_typed()))
        });
        Ok(found)
    }

    pub fn get(&self, principal: Option<&Principal>, id: CommentId) -> ServiceResult<Comment> {
        let p = authenticate(principal)?;
        let comment = self.comments.get(id)?.ok_or(ServiceError::CommentNotFound(id))?;
        authorize(p, &comment.snapshot(), CommentOp::Read, ResourceKind::Comment)?;
        Ok(comment)
    }

    pub fn update(&self, principal: Option<&Principal>, id: CommentId, text: String) -> ServiceResult<Comment> {
        let p = authenticate(principal)?;
        let updated = self
            .comments
            .try_update(id, |comment| {
                authorize(p, &comment.snapshot(), CommentOp::Edit, ResourceKind::Comment)?;
                comment.edit(text, Utc::now())?;
                Ok::<_, ServiceError>(comment.clone())
            })?
            .ok_or(ServiceError::CommentNotFound(id))?;

        tracing::info!(comment_id = %id, by = %p.identity, "comment updated");
        Ok(updated)
    }

    pub fn delete(&self, principal: Option<&Principal>, id: CommentId) -> ServiceResult<()> {
        let p = authenticate(principal)?;
        self.comments
            .try_remove(id, |comment| {
                authorize(p, &comment.snapshot(), CommentOp::Delete, ResourceKind::Comment)
            })?
            .ok_or(ServiceError::CommentNotFound(id))?;

        tracing::info!(comment_id = %id, by = %p.identity, "comment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests_support::*;
    use taskflow_auth::{DenialReason, Role};
    use taskflow_tasks::TaskDraft;

    fn task_by(w: &World, p: &Principal) -> TaskId {
        let draft = TaskDraft {
            title: "T".into(),
            ..TaskDraft::default()
        };
        w.tasks.create(Some(p), draft, None).unwrap().id_typed()
    }

    fn not_owner(err: &ServiceError) -> bool {
        matches!(
            err,
            ServiceError::Forbidden {
                resource: ResourceKind::Comment,
                reason: DenialReason::NotOwner
            }
        )
    }

    #[test]
    fn anyone_authenticated_may_comment_on_existing_task() {
        let w = World::new();
        let a = w.user("a@x.io", Role::User);
        let g = w.user("g@x.io", Role::Guest);
        let t = task_by(&w, &a);

        let c = w.comments.create(Some(&g), t, "looks good".into()).unwrap();
        assert_eq!(c.author(), "g@x.io");
        assert!(matches!(
            w.comments.create(Some(&g), TaskId::new(), "x".into()),
            Err(ServiceError::TaskNotFound(_))
        ));
        assert!(matches!(
            w.comments.create(None, t, "x".into()),
            Err(ServiceError::NotAuthenticated)
        ));
    }

    #[test]
    fn admin_deletes_but_cannot_edit_foreign_comment() {
        let w = World::new();
        let a = w.user("a@x.io", Role::User);
        let admin = w.user("root@x.io", Role::Admin);
        let t = task_by(&w, &a);
        let c = w.comments.create(Some(&a), t, "original".into()).unwrap();

        let err = w.comments.update(Some(&admin), c.id_typed(), "reworded".into()).unwrap_err();
        assert!(not_owner(&err));
        assert_eq!(w.comments.get(Some(&a), c.id_typed()).unwrap().text(), "original");

        w.comments.delete(Some(&admin), c.id_typed()).unwrap();
        assert!(matches!(
            w.comments.get(Some(&a), c.id_typed()),
            Err(ServiceError::CommentNotFound(_))
        ));
    }

    #[test]
    fn author_edits_and_strangers_cannot_delete() {
        let w = World::new();
        let a = w.user("a@x.io", Role::User);
        let m = w.user("m@x.io", Role::Moderator);
        let t = task_by(&w, &a);
        let c = w.comments.create(Some(&a), t, "v1".into()).unwrap();

        assert_eq!(w.comments.update(Some(&a), c.id_typed(), "v2".into()).unwrap().text(), "v2");
        assert!(not_owner(&w.comments.delete(Some(&m), c.id_typed()).unwrap_err()));
        assert!(matches!(
            w.comments.update(Some(&a), c.id_typed(), "  ".into()),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn list_is_scoped_to_the_task() {
        let w = World::new();
        let a = w.user("a@x.io", Role::User);
        let t1 = task_by(&w, &a);
        let t2 = task_by(&w, &a);
        w.comments.create(Some(&a), t1, "one".into()).unwrap();
        w.comments.create(Some(&a), t1, "two".into()).unwrap();
        w.comments.create(Some(&a), t2, "other".into()).unwrap();

        let listed = w.comments.list_for_task(Some(&a), t1).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|c| c.task_id() == t1));
        assert!(matches!(
            w.comments.list_for_task(Some(&a), TaskId::new()),
            Err(ServiceError::TaskNotFound(_))
        ));
    }
}
