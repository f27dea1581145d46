//! Typed collections over a [`LocalStore`].
//!
//! Read faults are not fatal: a failed or undecodable read falls back to the
//! last blob this cache successfully read or wrote for the same key, and to
//! the empty default when there is none. The strict `try_*` variants only
//! use the last-good blob and otherwise return the error, so read-modify-write
//! callers never write an empty default over data they could not read.

use crate::{keys, LocalStore, StorageResult};
use rega_types::{Document, Person, PoolEntry, Role, User, UserId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Typed access to the local replica.
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn LocalStore>,
    last_good: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            last_good: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The underlying raw store.
    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    // ── Generic access ───────────────────────────────────────────

    /// Reads and decodes `key`. On failure, falls back to the last-good blob
    /// for the key if one exists.
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.read_fresh(key) {
            Ok(value) => Ok(value),
            Err(e) => match self.last_good_value(key) {
                Some(value) => {
                    warn!("Reading {key} failed ({e}), using last loaded value");
                    Ok(Some(value))
                }
                None => Err(e),
            },
        }
    }

    /// Like [`try_load`](Self::try_load) but never fails: with no last-good
    /// value the default is returned.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.try_load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Reading {key} failed ({e}), using empty default");
                T::default()
            }
        }
    }

    /// Serializes `value` and stores it under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.put(key, &bytes)?;
        self.remember(key, bytes);
        debug!("Saved {key}");
        Ok(())
    }

    fn read_fresh<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(bytes) = self.store.get(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(&bytes)?;
        self.remember(key, bytes);
        Ok(Some(value))
    }

    fn remember(&self, key: &str, bytes: Vec<u8>) {
        if let Ok(mut last_good) = self.last_good.lock() {
            last_good.insert(key.to_string(), bytes);
        }
    }

    fn last_good_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let last_good = self.last_good.lock().ok()?;
        let bytes = last_good.get(key)?;
        serde_json::from_slice(bytes).ok()
    }

    // ── Persons ──────────────────────────────────────────────────

    pub fn load_persons(&self) -> Vec<Person> {
        self.load_or_default(keys::PERSONS)
    }

    pub fn try_load_persons(&self) -> StorageResult<Vec<Person>> {
        Ok(self.try_load(keys::PERSONS)?.unwrap_or_default())
    }

    pub fn save_persons(&self, persons: &[Person]) -> StorageResult<()> {
        self.save(keys::PERSONS, persons)
    }

    // ── Users ────────────────────────────────────────────────────

    pub fn load_users(&self) -> Vec<User> {
        self.load_or_default(keys::USERS)
    }

    pub fn save_users(&self, users: &[User]) -> StorageResult<()> {
        self.save(keys::USERS, users)
    }

    /// Looks a user up in the cached collection, then in the cached
    /// Registrador profile.
    pub fn find_user(&self, id: &UserId) -> Option<User> {
        self.load_users()
            .into_iter()
            .find(|u| &u.id == id)
            .or_else(|| self.load_registrador().filter(|u| &u.id == id))
    }

    /// Replaces (or appends) one user in the cached collection.
    pub fn upsert_user(&self, user: &User) -> StorageResult<()> {
        let mut users: Vec<User> = self.try_load(keys::USERS)?.unwrap_or_default();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => users.push(user.clone()),
        }
        self.save_users(&users)?;
        if self.load_registrador().is_some_and(|r| r.id == user.id) {
            self.save_registrador(user)?;
        }
        Ok(())
    }

    pub fn load_registrador(&self) -> Option<User> {
        self.load_or_default(keys::REGISTRADOR)
    }

    pub fn save_registrador(&self, user: &User) -> StorageResult<()> {
        self.save(keys::REGISTRADOR, user)
    }

    // ── Reference data ───────────────────────────────────────────

    pub fn load_departments(&self) -> Vec<Document> {
        self.load_or_default(keys::DEPARTMENTS)
    }

    pub fn save_departments(&self, departments: &[Document]) -> StorageResult<()> {
        self.save(keys::DEPARTMENTS, departments)
    }

    pub fn load_pool_entries(&self) -> Vec<PoolEntry> {
        self.load_or_default(keys::CONFIG)
    }

    pub fn save_pool_entries(&self, entries: &[PoolEntry]) -> StorageResult<()> {
        self.save(keys::CONFIG, entries)
    }

    // ── Session scalars ──────────────────────────────────────────

    pub fn current_user_id(&self) -> Option<UserId> {
        self.load_or_default(keys::CURRENT_USER_ID)
    }

    pub fn current_role(&self) -> Option<Role> {
        self.load_or_default(keys::CURRENT_ROLE)
    }

    /// Persists the signed-in user and role.
    pub fn save_session(&self, user_id: &UserId, role: Role) -> StorageResult<()> {
        self.save(keys::CURRENT_USER_ID, user_id)?;
        self.save(keys::CURRENT_ROLE, &role)
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache").finish_non_exhaustive()
    }
}

impl From<Arc<dyn LocalStore>> for LocalCache {
    fn from(store: Arc<dyn LocalStore>) -> Self {
        Self::new(store)
    }
}
