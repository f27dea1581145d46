//! Sync engine: reconciles the local `persons` replica with the backend.
//!
//! Two idempotent flows:
//! - **Upload** sends every local record not yet acknowledged, checking the
//!   backend for an existing document with the same `numeroDocumento` first
//!   so a record is never inserted twice.
//! - **Download-merge** pulls the persons visible to the session and merges
//!   them into the local replica by `numeroDocumento`.
//!
//! Both degrade to a no-op report when the device is offline.

use crate::connectivity::Connectivity;
use crate::error::{SyncError, SyncResult};
use crate::remote::DocumentStore;
use crate::session::Session;
use rega_storage::LocalCache;
use rega_types::{Document, Person, PoolEntry, Role, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Configuration for the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Names this device in pass summaries.
    pub device_name: String,
    pub persons_collection: String,
    pub users_collection: String,
    pub departments_collection: String,
    /// Collection holding the global range pool entries.
    pub config_collection: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            device_name: "Rega Device".to_string(),
            persons_collection: "persons".to_string(),
            users_collection: "users".to_string(),
            departments_collection: "departments".to_string(),
            config_collection: "config".to_string(),
        }
    }
}

/// Outcome of an upload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncUpReport {
    /// Records inserted into the backend.
    pub uploaded: usize,
    /// Records the backend already had; marked synced without a new insert.
    pub confirmed: usize,
    /// Records the backend refused. They stay pending for the next pass.
    pub failed: usize,
    /// The pass was skipped because the device is offline.
    pub offline: bool,
}

impl SyncUpReport {
    /// Records that left the pending state in this pass.
    #[must_use]
    pub fn acknowledged(&self) -> usize {
        self.uploaded + self.confirmed
    }
}

/// Outcome of a download-merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncDownReport {
    /// Remote records that changed the local replica
    /// (`added + updated + promoted`).
    pub merged: usize,
    /// Remote records not present locally.
    pub added: usize,
    /// Acknowledged local records overwritten by a newer remote snapshot.
    pub updated: usize,
    /// Pending local records the backend turned out to have already.
    pub promoted: usize,
    /// Pending local records left untouched because the remote copy differs.
    pub kept_local: usize,
    /// Remote documents that could not be decoded.
    pub rejected: usize,
    /// The pass was skipped because the device is offline.
    pub offline: bool,
}

/// Outcome of a directory refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryReport {
    pub users: usize,
    pub departments: usize,
    pub pool_entries: usize,
    pub offline: bool,
}

enum Ack {
    Inserted(String),
    AlreadyPresent(String),
}

/// Releases the busy flag when a pass ends, however it ends.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Reconciles the local replica with the remote document store.
pub struct SyncEngine {
    cache: LocalCache,
    remote: Arc<dyn DocumentStore>,
    connectivity: Arc<dyn Connectivity>,
    config: SyncConfig,
    busy: AtomicBool,
}

impl SyncEngine {
    pub fn new(
        cache: LocalCache,
        remote: Arc<dyn DocumentStore>,
        connectivity: Arc<dyn Connectivity>,
        config: SyncConfig,
    ) -> Self {
        Self {
            cache,
            remote,
            connectivity,
            config,
            busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn device_name(&self) -> &str {
        &self.config.device_name
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Whether a pass is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn begin_pass(&self) -> SyncResult<PassGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SyncError::Busy)?;
        Ok(PassGuard(&self.busy))
    }

    // ── Upload ───────────────────────────────────────────────────

    /// Uploads every pending person.
    ///
    /// A record the backend refuses is counted in `failed` and retried on the
    /// next pass. A network failure aborts the pass without touching any
    /// `isSynced` flag.
    pub async fn sync_up(&self) -> SyncResult<SyncUpReport> {
        let _guard = self.begin_pass()?;
        self.upload_pending().await
    }

    async fn upload_pending(&self) -> SyncResult<SyncUpReport> {
        if !self.connectivity.is_connected().await {
            debug!("Offline, skipping upload");
            return Ok(SyncUpReport {
                offline: true,
                ..Default::default()
            });
        }

        let pending: Vec<Person> = self
            .cache
            .try_load_persons()?
            .into_iter()
            .filter(|p| !p.is_synced)
            .collect();
        let mut report = SyncUpReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let mut acked: HashMap<String, String> = HashMap::new();
        for person in &pending {
            match self.upload_one(person).await {
                Ok(Ack::Inserted(id)) => {
                    report.uploaded += 1;
                    acked.insert(person.numero_documento.clone(), id);
                }
                Ok(Ack::AlreadyPresent(id)) => {
                    report.confirmed += 1;
                    acked.insert(person.numero_documento.clone(), id);
                }
                Err(SyncError::Network(e)) => {
                    warn!(
                        "Upload aborted after {} of {} records: {e}",
                        acked.len(),
                        pending.len()
                    );
                    return Err(SyncError::Network(e));
                }
                Err(e) => {
                    warn!("Upload of document {} failed: {e}", person.numero_documento);
                    report.failed += 1;
                }
            }
        }

        self.commit_flags(&acked)?;
        info!(
            "Upload from {} finished: {} uploaded, {} confirmed, {} failed",
            self.config.device_name, report.uploaded, report.confirmed, report.failed
        );
        Ok(report)
    }

    async fn upload_one(&self, person: &Person) -> SyncResult<Ack> {
        let collection = &self.config.persons_collection;
        let key = Value::String(person.numero_documento.clone());
        let existing = self
            .remote
            .query(collection, "numeroDocumento", &key)
            .await?;
        if let Some(doc) = existing.into_iter().next() {
            debug!("Document {} already on backend as {}", person.numero_documento, doc.id);
            return Ok(Ack::AlreadyPresent(doc.id));
        }

        let mut body = Document::encode(person)?;
        if let Value::Object(fields) = &mut body {
            fields.insert("isSynced".into(), Value::from(1));
        }
        let id = self.remote.insert(collection, body).await?;
        Ok(Ack::Inserted(id))
    }

    /// Re-reads the replica so records added while the pass was suspended
    /// survive, then flags the acknowledged ones.
    fn commit_flags(&self, acked: &HashMap<String, String>) -> SyncResult<()> {
        if acked.is_empty() {
            return Ok(());
        }
        let mut persons = self.cache.try_load_persons()?;
        for person in persons.iter_mut().filter(|p| !p.is_synced) {
            if let Some(id) = acked.get(&person.numero_documento) {
                person.mark_synced(Some(id.clone()));
            }
        }
        self.cache.save_persons(&persons)?;
        Ok(())
    }

    // ── Download-merge ───────────────────────────────────────────

    /// Pulls the persons visible to `session` and merges them into the
    /// replica.
    ///
    /// Administradores see every record, Registradores their own, other roles
    /// nothing. A pending local record is never overwritten; it is promoted
    /// when the backend holds identical content.
    pub async fn sync_down(&self, session: &Session) -> SyncResult<SyncDownReport> {
        let _guard = self.begin_pass()?;
        self.download_merge(session).await
    }

    async fn download_merge(&self, session: &Session) -> SyncResult<SyncDownReport> {
        if !self.connectivity.is_connected().await {
            debug!("Offline, skipping download");
            return Ok(SyncDownReport {
                offline: true,
                ..Default::default()
            });
        }

        let collection = &self.config.persons_collection;
        let docs = match session.role {
            Role::Administrador => self.remote.get_all(collection).await?,
            Role::Registrador => {
                let me = Value::String(session.user_id.to_string());
                self.remote.query(collection, "registradoPor", &me).await?
            }
            Role::Usuario | Role::Unassigned => {
                debug!("Role {} downloads no persons", session.role);
                return Ok(SyncDownReport::default());
            }
        };

        let mut report = SyncDownReport::default();
        let mut incoming = Vec::with_capacity(docs.len());
        for doc in &docs {
            match doc.decode::<Person>() {
                Ok(mut person) => {
                    person.is_synced = true;
                    incoming.push(person);
                }
                Err(e) => {
                    warn!("Skipping undecodable person {}: {e}", doc.id);
                    report.rejected += 1;
                }
            }
        }

        let mut local = self.cache.try_load_persons()?;
        Self::merge(&mut local, incoming, &mut report);
        self.cache.save_persons(&local)?;

        report.merged = report.added + report.updated + report.promoted;
        info!(
            "Download to {} finished: {} added, {} updated, {} promoted, {} kept local, {} rejected",
            self.config.device_name,
            report.added,
            report.updated,
            report.promoted,
            report.kept_local,
            report.rejected
        );
        Ok(report)
    }

    fn merge(local: &mut Vec<Person>, incoming: Vec<Person>, report: &mut SyncDownReport) {
        let mut index: HashMap<String, usize> = local
            .iter()
            .enumerate()
            .map(|(i, p)| (p.numero_documento.clone(), i))
            .collect();

        for remote in incoming {
            let Some(&i) = index.get(&remote.numero_documento) else {
                index.insert(remote.numero_documento.clone(), local.len());
                local.push(remote);
                report.added += 1;
                continue;
            };

            let current = &mut local[i];
            if current.is_synced {
                if *current != remote {
                    *current = remote;
                    report.updated += 1;
                }
            } else if current.same_content(&remote) {
                current.mark_synced(remote.id);
                report.promoted += 1;
            } else {
                debug!(
                    "Keeping pending local copy of {} over differing remote copy",
                    current.numero_documento
                );
                report.kept_local += 1;
            }
        }
    }

    // ── Combined ─────────────────────────────────────────────────

    /// Download-merge followed by upload, as one pass.
    pub async fn sync(&self, session: &Session) -> SyncResult<(SyncDownReport, SyncUpReport)> {
        let _guard = self.begin_pass()?;
        let down = self.download_merge(session).await?;
        let up = self.upload_pending().await?;
        Ok((down, up))
    }

    /// Downloads `users`, `departments` and the pool entries into the cache.
    pub async fn refresh_directory(&self) -> SyncResult<DirectoryReport> {
        if !self.connectivity.is_connected().await {
            return Ok(DirectoryReport {
                offline: true,
                ..Default::default()
            });
        }

        let users: Vec<User> = self.fetch_decoded(&self.config.users_collection).await?;
        let departments = self
            .remote
            .get_all(&self.config.departments_collection)
            .await?;
        let pool: Vec<PoolEntry> = self.fetch_decoded(&self.config.config_collection).await?;

        self.cache.save_users(&users)?;
        if let Some(profile) = self.cache.load_registrador() {
            if let Some(fresh) = users.iter().find(|u| u.id == profile.id) {
                self.cache.save_registrador(fresh)?;
            }
        }
        self.cache.save_departments(&departments)?;
        self.cache.save_pool_entries(&pool)?;

        let report = DirectoryReport {
            users: users.len(),
            departments: departments.len(),
            pool_entries: pool.len(),
            offline: false,
        };
        info!(
            "Directory refreshed on {}: {} users, {} departments, {} pool entries",
            self.config.device_name, report.users, report.departments, report.pool_entries
        );
        Ok(report)
    }

    /// Every document of `collection` that decodes as `T`.
    pub(crate) async fn fetch_decoded<T: serde::de::DeserializeOwned>(
        &self,
        collection: &str,
    ) -> SyncResult<Vec<T>> {
        let docs = self.remote.get_all(collection).await?;
        Ok(docs
            .iter()
            .filter_map(|doc| match doc.decode() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Skipping undecodable {collection} document {}: {e}", doc.id);
                    None
                }
            })
            .collect())
    }
}
