use std::sync::Arc;

use chrono::Utc;

use taskflow_auth::{
    IssuedToken, PasswordHasher, Principal, Role, TokenService, UserAccount, UserDirectory, UserDirectoryOp,
    normalize_email, validate_new_password, validate_registration,
};
use taskflow_core::UserId;

use super::{ResourceKind, ServiceError, ServiceResult, authenticate, authorize};
use crate::store::InMemoryUserStore;

/// Registration, login, self-service and account administration.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<InMemoryUserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl core::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(users: Arc<InMemoryUserStore>, hasher: Arc<dyn PasswordHasher>, tokens: Arc<TokenService>) -> Self {
        Self { users, hasher, tokens }
    }

    pub fn register(&self, email: &str, password: &str) -> ServiceResult<UserAccount> {
        let email = normalize_email(email);
        validate_registration(&email, password)?;

        if self.users.find_by_email(&email)?.is_some() {
            return Err(ServiceError::DuplicateIdentity(email));
        }

        let hash = self.hasher.hash(password).map_err(anyhow::Error::new)?;
        let account = UserAccount::register(email, hash, Utc::now());
        // Uniqueness is re-checked under the write lock.
        self.users.insert_unique(account.clone())?;

        tracing::info!(user_id = %account.id, email = %account.email, "account registered");
        Ok(account)
    }

    /// Unknown email, wrong password and a disabled or locked account are
    /// indistinguishable to the caller.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<IssuedToken> {
        let email = normalize_email(email);
        let Some(account) = self.users.find_by_email(&email)? else {
            tracing::warn!(%email, "login failed: unknown account");
            return Err(ServiceError::InvalidCredentials);
        };

        if !account.can_log_in() {
            tracing::warn!(%email, "login failed: account disabled or locked");
            return Err(ServiceError::InvalidCredentials);
        }

        if !self.hasher.verify(password, &account.password_hash) {
            tracing::warn!(%email, "login failed: bad password");
            return Err(ServiceError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&account.email).map_err(anyhow::Error::new)?;
        tracing::info!(%email, expires_at = %issued.expires_at, "login succeeded");
        Ok(issued)
    }

    pub fn me(&self, principal: Option<&Principal>) -> ServiceResult<UserAccount> {
        let p = authenticate(principal)?;
        self.users
            .find_by_email(&p.identity)?
            .ok_or_else(|| ServiceError::PrincipalNotFound(p.identity.clone()))
    }

    pub fn change_password(&self, principal: Option<&Principal>, old: &str, new: &str) -> ServiceResult<()> {
        let p = authenticate(principal)?;
        validate_new_password("new_password", new)?;

        let account = self.me(Some(p))?;
        if !self.hasher.verify(old, &account.password_hash) {
            return Err(ServiceError::WrongPassword);
        }
        if old == new {
            return Err(ServiceError::PasswordUnchanged);
        }

        let hash = self.hasher.hash(new).map_err(anyhow::Error::new)?;
        let verified_hash = account.password_hash;
        self.users
            .try_update_by_email(&p.identity, |acc| {
                // Lost a race with another password change.
                if acc.password_hash != verified_hash {
                    return Err(ServiceError::WrongPassword);
                }
                acc.password_hash = hash;
                acc.updated_at = Utc::now();
                Ok(())
            })?
            .ok_or_else(|| ServiceError::PrincipalNotFound(p.identity.clone()))?;

        tracing::info!(email = %p.identity, "password changed");
        Ok(())
    }

    pub fn list_users(&self, principal: Option<&Principal>) -> ServiceResult<Vec<UserAccount>> {
        let p = authenticate(principal)?;
        authorize(p, &UserDirectory, UserDirectoryOp::List, ResourceKind::UserDirectory)?;
        Ok(self.users.list()?)
    }

    pub fn update_role(&self, principal: Option<&Principal>, user_id: UserId, role: Role) -> ServiceResult<UserAccount> {
        let p = authenticate(principal)?;
        authorize(p, &UserDirectory, UserDirectoryOp::UpdateRole, ResourceKind::UserDirectory)?;

        let updated = self.mutate(user_id, |acc| acc.role = role)?;
        tracing::info!(%user_id, %role, by = %p.identity, "role updated");
        Ok(updated)
    }

    pub fn set_locked(&self, principal: Option<&Principal>, user_id: UserId, locked: bool) -> ServiceResult<UserAccount> {
        let p = authenticate(principal)?;
        authorize(p, &UserDirectory, UserDirectoryOp::Lock, ResourceKind::UserDirectory)?;

        let updated = self.mutate(user_id, |acc| acc.locked = locked)?;
        tracing::info!(%user_id, locked, by = %p.identity, "lock state changed");
        Ok(updated)
    }

    pub fn delete_user(&self, principal: Option<&Principal>, user_id: UserId) -> ServiceResult<UserAccount> {
        let p = authenticate(principal)?;
        authorize(p, &UserDirectory, UserDirectoryOp::Delete, ResourceKind::UserDirectory)?;

        let removed = self
            .users
            .try_remove(user_id, |_| Ok::<_, ServiceError>(()))?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))?;
        tracing::info!(%user_id, email = %removed.email, by = %p.identity, "account deleted");
        Ok(removed)
    }

    /// Make sure an administrator account exists for `email`.
    ///
    /// An existing account is promoted and unlocked; its password is kept.
    pub fn ensure_admin(&self, email: &str, password: &str) -> ServiceResult<UserAccount> {
        let email = normalize_email(email);
        let promoted = self.users.try_update_by_email(&email, |acc| {
            acc.role = Role::Admin;
            acc.enabled = true;
            acc.locked = false;
            acc.updated_at = Utc::now();
            Ok::<_, ServiceError>(acc.clone())
        })?;
        if let Some(account) = promoted {
            tracing::info!(%email, "existing account promoted to admin");
            return Ok(account);
        }

        let mut account = self.register(&email, password)?;
        account = self.mutate(account.id, |acc| acc.role = Role::Admin)?;
        tracing::info!(%email, "admin account bootstrapped");
        Ok(account)
    }

    fn mutate(&self, user_id: UserId, change: impl FnOnce(&mut UserAccount)) -> ServiceResult<UserAccount> {
        self.users
            .try_update(user_id, |acc| {
                change(acc);
                acc.updated_at = Utc::now();
                Ok::<_, ServiceError>(acc.clone())
            })?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests_support::*;
    use taskflow_auth::{DenialReason, PrincipalResolver, ResolveError, TokenVerifier};
    use taskflow_tasks::TaskDraft;

    #[test]
    fn register_normalizes_and_rejects_duplicates() {
        let w = World::new();
        let acc = w.accounts.register("  Alice@Example.com ", "password1").unwrap();
        assert_eq!(acc.email, "alice@example.com");
        assert_eq!(acc.role, Role::User);
        assert_ne!(acc.password_hash, "password1");

        assert!(matches!(
            w.accounts.register("alice@example.COM", "password2"),
            Err(ServiceError::DuplicateIdentity(_))
        ));
        assert!(matches!(
            w.accounts.register("bob@example.com", "short"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn login_issues_token_for_the_account() {
        let w = World::new();
        w.accounts.register("a@x.io", "password1").unwrap();
        let issued = w.accounts.login("A@X.IO", "password1").unwrap();
        assert_eq!(
            w.token_service.subject_of_at(&issued.token, issued.issued_at).unwrap(),
            "a@x.io"
        );
    }

    #[test]
    fn login_failures_all_look_the_same() {
        let w = World::new();
        let acc = w.accounts.register("a@x.io", "password1").unwrap();
        assert!(matches!(w.accounts.login("a@x.io", "wrong-pass"), Err(ServiceError::InvalidCredentials)));
        assert!(matches!(w.accounts.login("nobody@x.io", "password1"), Err(ServiceError::InvalidCredentials)));

        let admin = w.user("root@x.io", Role::Admin);
        w.accounts.set_locked(Some(&admin), acc.id, true).unwrap();
        assert!(matches!(w.accounts.login("a@x.io", "password1"), Err(ServiceError::InvalidCredentials)));

        w.accounts.set_locked(Some(&admin), acc.id, false).unwrap();
        assert!(w.accounts.login("a@x.io", "password1").is_ok());
    }

    #[test]
    fn change_password_checks_old_then_sameness() {
        let w = World::new();
        w.accounts.register("a@x.io", "password1").unwrap();
        let p = w.principal("a@x.io");

        assert!(matches!(
            w.accounts.change_password(Some(&p), "nope-nope", "password2"),
            Err(ServiceError::WrongPassword)
        ));
        assert!(matches!(
            w.accounts.change_password(Some(&p), "password1", "password1"),
            Err(ServiceError::PasswordUnchanged)
        ));
        assert!(matches!(
            w.accounts.change_password(Some(&p), "password1", "short"),
            Err(ServiceError::Validation(_))
        ));

        w.accounts.change_password(Some(&p), "password1", "password2").unwrap();
        assert!(w.accounts.login("a@x.io", "password2").is_ok());
        assert!(w.accounts.login("a@x.io", "password1").is_err());
    }

    #[test]
    fn me_requires_an_existing_account() {
        let w = World::new();
        let ghost = Principal::active("ghost@x.io", Role::User);
        assert!(matches!(w.accounts.me(Some(&ghost)), Err(ServiceError::PrincipalNotFound(_))));
        assert!(matches!(w.accounts.me(None), Err(ServiceError::NotAuthenticated)));
    }

    #[test]
    fn directory_is_admin_only_and_denial_precedes_lookup() {
        let w = World::new();
        let m = w.user("m@x.io", Role::Moderator);
        let admin = w.user("root@x.io", Role::Admin);

        let err = w.accounts.update_role(Some(&m), UserId::new(), Role::Admin).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Forbidden {
                resource: ResourceKind::UserDirectory,
                reason: DenialReason::InsufficientRole
            }
        ));
        assert!(matches!(
            w.accounts.update_role(Some(&admin), UserId::new(), Role::Admin),
            Err(ServiceError::UserNotFound(_))
        ));
        assert_eq!(w.accounts.list_users(Some(&admin)).unwrap().len(), 2);
    }

    #[test]
    fn role_update_and_delete() {
        let w = World::new();
        let admin = w.user("root@x.io", Role::Admin);
        let acc = w.accounts.register("a@x.io", "password1").unwrap();

        let promoted = w.accounts.update_role(Some(&admin), acc.id, Role::Moderator).unwrap();
        assert_eq!(promoted.role, Role::Moderator);
        assert_eq!(w.principal("a@x.io").role, Role::Moderator);

        w.accounts.delete_user(Some(&admin), acc.id).unwrap();
        assert!(w.users.find_by_email("a@x.io").unwrap().is_none());
        assert!(matches!(
            w.accounts.delete_user(Some(&admin), acc.id),
            Err(ServiceError::UserNotFound(_))
        ));
    }

    #[test]
    fn deleted_identity_cannot_be_claimed_again() {
        let w = World::new();
        let admin = w.user("root@x.io", Role::Admin);
        let victim = w.accounts.register("victim@x.io", "password1").unwrap();
        let old_token = w.accounts.login("victim@x.io", "password1").unwrap();
        let task = w
            .tasks
            .create(Some(&w.principal("victim@x.io")), TaskDraft { title: "T".into(), ..TaskDraft::default() }, None)
            .unwrap();

        w.accounts.delete_user(Some(&admin), victim.id).unwrap();

        assert!(matches!(
            w.accounts.register("VICTIM@x.io", "password2"),
            Err(ServiceError::DuplicateIdentity(ref e)) if e == "victim@x.io"
        ));
        assert!(w.users.find_by_email("victim@x.io").unwrap().is_none());

        let resolver = PrincipalResolver::new(w.token_service.clone(), w.users.clone());
        assert!(matches!(
            resolver.resolve(Some(&format!("Bearer {}", old_token.token))),
            Err(ResolveError::PrincipalNotFound(_))
        ));

        let kept = w.tasks.get(Some(&admin), task.id_typed()).unwrap();
        assert_eq!(kept.author(), "victim@x.io");
    }

    #[test]
    fn ensure_admin_creates_or_promotes() {
        let w = World::new();
        let created = w.accounts.ensure_admin("boss@x.io", "password1").unwrap();
        assert_eq!(created.role, Role::Admin);

        w.accounts.register("later@x.io", "password1").unwrap();
        let promoted = w.accounts.ensure_admin("later@x.io", "ignored-password").unwrap();
        assert_eq!(promoted.role, Role::Admin);
        assert!(w.accounts.login("later@x.io", "password1").is_ok());
    }
}
