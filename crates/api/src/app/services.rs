//! Store and service wiring.

use std::sync::Arc;

use anyhow::Context;

use taskflow_auth::{Argon2Hasher, PrincipalResolver, TokenService};
use taskflow_infra::{AccountService, CommentService, InMemoryStore, InMemoryUserStore, TaskService};

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct AppServices {
    pub accounts: AccountService,
    pub tasks: TaskService,
    pub comments: CommentService,
    pub resolver: PrincipalResolver,
}

pub fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.jwt_ttl).context("invalid token settings")?);
    let hasher = Arc::new(
        Argon2Hasher::with_cost(config.argon2_m_cost, config.argon2_t_cost, 1).context("invalid argon2 settings")?,
    );

    let users = Arc::new(InMemoryUserStore::new());
    let tasks = Arc::new(InMemoryStore::new());
    let comments = Arc::new(InMemoryStore::new());

    let services = AppServices {
        accounts: AccountService::new(users.clone(), hasher, tokens.clone()),
        tasks: TaskService::new(tasks.clone(), comments.clone(), users.clone()),
        comments: CommentService::new(tasks, comments),
        resolver: PrincipalResolver::new(tokens, users),
    };

    if let Some(admin) = &config.admin {
        services
            .accounts
            .ensure_admin(&admin.email, &admin.password)
            .context("failed to bootstrap admin account")?;
    }

    Ok(services)
}
