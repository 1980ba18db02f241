use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use taskflow_core::Entity;

use super::StoreError;

/// Entity map keyed by id.
#[derive(Debug)]
pub struct InMemoryStore<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<E::Id, E>>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<E::Id, E>>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl<E: Entity + Clone> InMemoryStore<E> {
    pub fn get(&self, id: E::Id) -> Result<Option<E>, StoreError> {
        Ok(self.read()?.get(&id).cloned())
    }

    pub fn insert(&self, entity: E) -> Result<(), StoreError> {
        self.write()?.insert(entity.id(), entity);
        Ok(())
    }

    /// All entities matching `keep`, in unspecified order.
    pub fn filter(&self, keep: impl Fn(&E) -> bool) -> Result<Vec<E>, StoreError> {
        Ok(self.read()?.values().filter(|e| keep(e)).cloned().collect())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Run `f` against the entity while holding the read lock.
    ///
    /// `Ok(None)` when the id is unknown; `f` is not called then.
    pub fn read_with<T, X>(&self, id: E::Id, f: impl FnOnce(&E) -> Result<T, X>) -> Result<Option<T>, X>
    where
        X: From<StoreError>,
    {
        let map = self.read()?;
        map.get(&id).map(f).transpose()
    }

    /// Check-and-mutate under a single write lock.
    ///
    /// `f` works on a copy that replaces the stored entity only when `f`
    /// returns `Ok`. `Ok(None)` when the id is unknown.
    pub fn try_update<T, X>(&self, id: E::Id, f: impl FnOnce(&mut E) -> Result<T, X>) -> Result<Option<T>, X>
    where
        X: From<StoreError>,
    {
        let mut map = self.write()?;
        let Some(current) = map.get(&id) else {
            return Ok(None);
        };

        let mut working = current.clone();
        let out = f(&mut working)?;
        map.insert(id, working);
        Ok(Some(out))
    }

    /// Check-and-remove under a single write lock.
    pub fn try_remove<X>(&self, id: E::Id, check: impl FnOnce(&E) -> Result<(), X>) -> Result<Option<E>, X>
    where
        X: From<StoreError>,
    {
        let mut map = self.write()?;
        let Some(current) = map.get(&id) else {
            return Ok(None);
        };

        check(current)?;
        Ok(map.remove(&id))
    }

    /// Drop every entity matching `doomed`; returns how many were removed.
    pub fn remove_where(&self, doomed: impl Fn(&E) -> bool) -> Result<usize, StoreError> {
        let mut map = self.write()?;
        let before = map.len();
        map.retain(|_, e| !doomed(e));
        Ok(before - map.len())
    }
}
