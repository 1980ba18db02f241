use std::collections::HashSet;
use std::sync::RwLock;

use taskflow_auth::{LookupError, Principal, PrincipalStore, UserAccount};
use taskflow_core::UserId;

use super::{InMemoryStore, StoreError};

/// Accounts, unique by email.
///
/// Emails of deleted accounts are retired and cannot be registered again.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    accounts: InMemoryStore<UserAccount>,
    // Lock order: `retired` before `accounts`.
    retired: RwLock<HashSet<String>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless another account owns, or once owned, the email.
    pub fn insert_unique(&self, account: UserAccount) -> Result<(), StoreError> {
        let retired = self.retired.read().map_err(|_| StoreError::Poisoned)?;
        let mut map = self.accounts.write()?;
        if retired.contains(&account.email) || map.values().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate(account.email));
        }
        map.insert(account.id, account);
        Ok(())
    }

    pub fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        self.accounts.get(id)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.accounts.read()?.values().find(|a| a.email == email).cloned())
    }

    /// Every account, oldest first.
    pub fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        let mut all = self.accounts.filter(|_| true)?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    pub fn try_update<T, X>(&self, id: UserId, f: impl FnOnce(&mut UserAccount) -> Result<T, X>) -> Result<Option<T>, X>
    where
        X: From<StoreError>,
    {
        self.accounts.try_update(id, f)
    }

    pub fn try_update_by_email<T, X>(
        &self,
        email: &str,
        f: impl FnOnce(&mut UserAccount) -> Result<T, X>,
    ) -> Result<Option<T>, X>
    where
        X: From<StoreError>,
    {
        let mut map = self.accounts.write()?;
        let Some(current) = map.values().find(|a| a.email == email) else {
            return Ok(None);
        };

        let mut working = current.clone();
        let out = f(&mut working)?;
        map.insert(working.id, working);
        Ok(Some(out))
    }

    /// Remove the account and retire its email.
    pub fn try_remove<X>(&self, id: UserId, check: impl FnOnce(&UserAccount) -> Result<(), X>) -> Result<Option<UserAccount>, X>
    where
        X: From<StoreError>,
    {
        let mut retired = self.retired.write().map_err(|_| StoreError::Poisoned)?;
        let removed = self.accounts.try_remove(id, check)?;
        if let Some(account) = &removed {
            retired.insert(account.email.clone());
        }
        Ok(removed)
    }
}

impl PrincipalStore for InMemoryUserStore {
    fn find_principal(&self, identity: &str) -> Result<Option<Principal>, LookupError> {
        self.find_by_email(identity)
            .map(|found| found.map(|a| a.principal()))
            .map_err(|e| LookupError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use taskflow_auth::Role;

    fn account(email: &str) -> UserAccount {
        UserAccount::register(email.into(), "hash".into(), Utc::now())
    }

    #[test]
    fn email_is_unique() {
        let store = InMemoryUserStore::new();
        store.insert_unique(account("a@x.io")).unwrap();
        assert_eq!(
            store.insert_unique(account("a@x.io")),
            Err(StoreError::Duplicate("a@x.io".into()))
        );
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn removed_email_is_retired() {
        let store = InMemoryUserStore::new();
        let acc = account("a@x.io");
        let id = acc.id;
        store.insert_unique(acc).unwrap();

        let removed: Result<_, StoreError> = store.try_remove(id, |_| Ok(()));
        assert_eq!(removed.unwrap().unwrap().email, "a@x.io");
        assert_eq!(
            store.insert_unique(account("a@x.io")),
            Err(StoreError::Duplicate("a@x.io".into()))
        );
        assert!(store.find_principal("a@x.io").unwrap().is_none());
    }

    #[test]
    fn principal_reflects_account_flags() {
        let store = InMemoryUserStore::new();
        let mut acc = account("m@x.io");
        acc.role = Role::Moderator;
        acc.locked = true;
        store.insert_unique(acc).unwrap();

        let p = store.find_principal("m@x.io").unwrap().unwrap();
        assert_eq!(p.role, Role::Moderator);
        assert!(!p.is_active());
        assert!(store.find_principal("nobody@x.io").unwrap().is_none());
    }

    #[test]
    fn update_by_email_commits() {
        let store = InMemoryUserStore::new();
        store.insert_unique(account("a@x.io")).unwrap();
        let out: Result<Option<()>, StoreError> = store.try_update_by_email("a@x.io", |a| {
            a.role = Role::Admin;
            Ok(())
        });
        assert_eq!(out, Ok(Some(())));
        assert_eq!(store.find_by_email("a@x.io").unwrap().unwrap().role, Role::Admin);
    }
}
