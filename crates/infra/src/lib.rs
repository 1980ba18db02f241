//! Infrastructure layer: in-memory stores and the request pipeline services.

pub mod services;
pub mod store;

pub use services::{
    AccountService, CommentService, ExecutorChange, ResourceKind, ServiceError, ServiceResult, TaskFilter,
    TaskService,
};
pub use store::{InMemoryStore, InMemoryUserStore, StoreError};
