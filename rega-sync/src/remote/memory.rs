//! In-process document store.
//!
//! Used by tests and demos in place of the real backend. Supports simple
//! fault injection: going offline, rejecting specific documents, and losing
//! the connection after a number of inserts.

use super::DocumentStore;
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use rega_types::Document;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// A document store held in memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    offline: AtomicBool,
    /// `(field, value)` pairs whose inserts are refused.
    rejections: Mutex<Vec<(String, Value)>>,
    /// Inserts allowed before the store starts failing with network errors.
    insert_budget: Mutex<Option<usize>>,
    inserts: AtomicUsize,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds documents to `collection` as-is.
    pub fn seed(&self, collection: &str, documents: impl IntoIterator<Item = Document>) {
        if let Ok(mut collections) = self.collections.lock() {
            collections
                .entry(collection.to_string())
                .or_default()
                .extend(documents);
        }
    }

    /// Snapshot of a collection.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .ok()
            .and_then(|c| c.get(collection).cloned())
            .unwrap_or_default()
    }

    /// Makes every call fail with a network error while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Refuses inserts of documents whose `field` equals `value`.
    pub fn reject_inserts_where(&self, field: &str, value: impl Into<Value>) {
        if let Ok(mut rejections) = self.rejections.lock() {
            rejections.push((field.to_string(), value.into()));
        }
    }

    /// Lets `n` more inserts through, then fails with network errors.
    pub fn fail_after_inserts(&self, n: usize) {
        if let Ok(mut budget) = self.insert_budget.lock() {
            *budget = Some(n);
        }
    }

    /// Clears every injected fault.
    pub fn heal(&self) {
        self.set_offline(false);
        if let Ok(mut rejections) = self.rejections.lock() {
            rejections.clear();
        }
        if let Ok(mut budget) = self.insert_budget.lock() {
            *budget = None;
        }
    }

    /// Number of successful inserts so far.
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> SyncResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SyncError::Network("connection refused".into()));
        }
        Ok(())
    }

    fn lock(&self) -> SyncResult<MutexGuard<'_, HashMap<String, Vec<Document>>>> {
        self.collections
            .lock()
            .map_err(|_| SyncError::Remote("store lock poisoned".into()))
    }

    fn is_rejected(&self, data: &Value) -> bool {
        self.rejections.lock().is_ok_and(|rejections| {
            rejections
                .iter()
                .any(|(field, value)| data.get(field) == Some(value))
        })
    }

    fn take_insert_budget(&self) -> SyncResult<()> {
        let mut budget = self
            .insert_budget
            .lock()
            .map_err(|_| SyncError::Remote("store lock poisoned".into()))?;
        match budget.as_mut() {
            Some(0) => Err(SyncError::Network("connection reset".into())),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(
        &self,
        collection: &str,
        field: &str,
        equals: &Value,
    ) -> SyncResult<Vec<Document>> {
        self.check_online()?;
        let collections = self.lock()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.field_equals(field, equals))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, data: Value) -> SyncResult<String> {
        self.check_online()?;
        if !data.is_object() {
            return Err(SyncError::Remote("document body must be an object".into()));
        }
        if self.is_rejected(&data) {
            return Err(SyncError::Remote("insert rejected".into()));
        }
        self.take_insert_budget()?;

        let id = uuid::Uuid::now_v7().to_string();
        self.lock()?
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), data));
        self.inserts.fetch_add(1, Ordering::SeqCst);
        debug!("Inserted {collection}/{id}");
        Ok(id)
    }

    async fn get_all(&self, collection: &str) -> SyncResult<Vec<Document>> {
        self.check_online()?;
        Ok(self.lock()?.get(collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> SyncResult<Option<Document>> {
        self.check_online()?;
        Ok(self
            .lock()?
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> SyncResult<()> {
        self.check_online()?;
        let mut collections = self.lock()?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| SyncError::Remote(format!("no document {collection}/{id}")))?;
        match &mut doc.data {
            Value::Object(fields) => fields.extend(patch),
            other => *other = Value::Object(patch),
        }
        Ok(())
    }
}
