use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use taskflow_auth::{Argon2Hasher, Principal, PrincipalStore, Role, TokenService, UserAccount};
use taskflow_tasks::Comment;

use super::{AccountService, CommentService, TaskService};
use crate::store::{InMemoryStore, InMemoryUserStore};

/// Fully wired services over fresh stores.
pub(crate) struct World {
    pub users: Arc<InMemoryUserStore>,
    pub comment_store: Arc<InMemoryStore<Comment>>,
    pub token_service: Arc<TokenService>,
    pub tasks: TaskService,
    pub comments: CommentService,
    pub accounts: AccountService,
}

impl World {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let task_store = Arc::new(InMemoryStore::new());
        let comment_store = Arc::new(InMemoryStore::new());
        let token_service =
            Arc::new(TokenService::new("services-test-secret-0123456789abcdef", Duration::from_secs(600)).unwrap());
        let hasher = Arc::new(Argon2Hasher::with_cost(256, 1, 1).unwrap());

        Self {
            tasks: TaskService::new(task_store.clone(), comment_store.clone(), users.clone()),
            comments: CommentService::new(task_store, comment_store.clone()),
            accounts: AccountService::new(users.clone(), hasher, token_service.clone()),
            users,
            comment_store,
            token_service,
        }
    }

    /// Insert an account directly and return its principal.
    pub fn user(&self, email: &str, role: Role) -> Principal {
        let mut account = UserAccount::register(email.into(), "unused".into(), Utc::now());
        account.role = role;
        self.users.insert_unique(account).unwrap();
        self.principal(email)
    }

    pub fn principal(&self, email: &str) -> Principal {
        self.users.find_principal(email).unwrap().unwrap()
    }
}
