//! `taskflow-tasks`: the task tracking domain.
//!
//! Tasks move through a [`Status`] lifecycle and collect [`Comment`]s. Both
//! expose ownership snapshots consumed by the authorization policy.

pub mod comment;
pub mod priority;
pub mod status;
pub mod task;

pub use comment::Comment;
pub use priority::{Priority, UnknownPriorityError};
pub use status::{Status, UnknownStatusError};
pub use task::{Task, TaskDraft, TaskEdit, TaskPatch};
