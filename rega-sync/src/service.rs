//! Field operations exposed to the UI layer.
//!
//! [`FieldService`] composes the local cache, the remote store, the
//! allocator and the sync engine for one signed-in [`Session`]. Operations
//! that commit to the backend (role and range assignment, pool selection)
//! need connectivity; registration and sequencing work offline.

use crate::connectivity::Connectivity;
use crate::engine::{DirectoryReport, SyncConfig, SyncDownReport, SyncEngine, SyncUpReport};
use crate::error::{SyncError, SyncResult};
use crate::remote::DocumentStore;
use crate::session::Session;
use rega_alloc::{NumberSequencer, RangeAllocator};
use rega_storage::LocalCache;
use rega_types::{
    Document, GlobalRangePool, Person, PersonDraft, PoolEntry, Range, RangeCatalogue, Role,
    RoleAssignment, TypesError, User, UserId,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub struct FieldService {
    session: Session,
    cache: LocalCache,
    remote: Arc<dyn DocumentStore>,
    connectivity: Arc<dyn Connectivity>,
    engine: SyncEngine,
    allocator: RangeAllocator,
    merged_this_session: AtomicBool,
    /// Users this service assigned, as committed.
    committed: Mutex<HashMap<UserId, User>>,
}

impl FieldService {
    pub fn new(
        session: Session,
        cache: LocalCache,
        remote: Arc<dyn DocumentStore>,
        connectivity: Arc<dyn Connectivity>,
        config: SyncConfig,
    ) -> Self {
        let engine = SyncEngine::new(
            cache.clone(),
            Arc::clone(&remote),
            Arc::clone(&connectivity),
            config,
        );
        Self {
            session,
            cache,
            remote,
            connectivity,
            engine,
            allocator: RangeAllocator::default(),
            merged_this_session: AtomicBool::new(false),
            committed: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the catalogue offered for specific assignment.
    #[must_use]
    pub fn with_catalogue(mut self, catalogue: RangeCatalogue) -> Self {
        self.allocator = RangeAllocator::new(catalogue);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn catalogue(&self) -> &RangeCatalogue {
        self.allocator.catalogue()
    }

    fn config(&self) -> &SyncConfig {
        self.engine.config()
    }

    fn require_admin(&self, action: &str) -> SyncResult<()> {
        if !self.session.is_administrador() {
            return Err(SyncError::PermissionDenied(format!(
                "{action} requires an Administrador, signed in as {}",
                self.session.role
            )));
        }
        Ok(())
    }

    async fn require_online(&self) -> SyncResult<()> {
        if !self.connectivity.is_connected().await {
            return Err(SyncError::NetworkUnavailable);
        }
        Ok(())
    }

    // ── Range allocation ─────────────────────────────────────────

    /// Grants `registrador_id` the next block of the selected global pool.
    pub async fn allocate_global_range(&self, registrador_id: &UserId) -> SyncResult<Range> {
        self.require_admin("global range allocation")?;
        self.require_online().await?;

        let users = self.user_view().await?;
        let target = Self::find(&users, registrador_id)?;
        let pool = self.global_pool().await?;
        let range = self.allocator.allocate_global(&pool, &users)?;
        self.commit_assignment(target, RoleAssignment::registrador(range))
            .await?;
        Ok(range)
    }

    /// Grants `registrador_id` a catalogue interval, provided no other
    /// Registrador holds an overlapping block.
    pub async fn allocate_specific_range(
        &self,
        registrador_id: &UserId,
        range: Range,
    ) -> SyncResult<()> {
        self.require_admin("specific range allocation")?;
        self.require_online().await?;

        let users = self.user_view().await?;
        let target = Self::find(&users, registrador_id)?;
        let range = self
            .allocator
            .allocate_specific(range, &users, registrador_id)?;
        self.commit_assignment(target, RoleAssignment::registrador(range))
            .await?;
        Ok(())
    }

    /// Sets `user_id`'s role and clears its range fields.
    ///
    /// Allowed for Administradores and for users changing their own role. A
    /// change to the signed-in user is reflected in the session.
    pub async fn clear_role(&mut self, user_id: &UserId, new_role: Role) -> SyncResult<User> {
        if !self.session.is_administrador() && self.session.user_id != *user_id {
            return Err(SyncError::PermissionDenied(format!(
                "{} cannot change the role of {user_id}",
                self.session.user_id
            )));
        }
        self.require_online().await?;

        let users = self.user_view().await?;
        let target = Self::find(&users, user_id)?;
        let updated = self
            .commit_assignment(target, RoleAssignment::declassify(new_role))
            .await?;

        if self.session.user_id == *user_id {
            self.session.role = new_role;
            self.session.persist(&self.cache)?;
        }
        Ok(updated)
    }

    /// The backend's users plus the assignments this service committed.
    ///
    /// Both copies of a user are kept when they differ so that a block known
    /// to either side counts as occupied while backend reads lag. The cached
    /// directory is replaced by the backend's view with this service's
    /// commits laid over it, so copies changed on other devices do not linger.
    async fn user_view(&self) -> SyncResult<Vec<User>> {
        let mut users: Vec<User> = self
            .engine
            .fetch_decoded(&self.config().users_collection)
            .await?;
        let committed = self.committed_users();

        let mut directory = users.clone();
        for user in &committed {
            match directory.iter_mut().find(|u| u.id == user.id) {
                Some(existing) => *existing = user.clone(),
                None => directory.push(user.clone()),
            }
        }
        self.cache.save_users(&directory)?;

        for user in committed {
            if !users.contains(&user) {
                users.push(user);
            }
        }
        Ok(users)
    }

    fn committed_users(&self) -> Vec<User> {
        self.committed
            .lock()
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }

    fn find(users: &[User], id: &UserId) -> SyncResult<User> {
        users
            .iter()
            .find(|u| &u.id == id)
            .cloned()
            .ok_or_else(|| SyncError::UnknownUser(id.clone()))
    }

    /// Writes role and range fields in one update, then mirrors it locally.
    async fn commit_assignment(
        &self,
        mut user: User,
        assignment: RoleAssignment,
    ) -> SyncResult<User> {
        self.remote
            .update(
                &self.config().users_collection,
                user.id.as_str(),
                assignment.to_patch(),
            )
            .await?;
        user.apply(&assignment);
        self.cache.upsert_user(&user)?;
        if let Ok(mut committed) = self.committed.lock() {
            committed.insert(user.id.clone(), user.clone());
        }
        match assignment.range {
            Some(range) => info!("Assigned {range} to {}", user.id),
            None => info!("Set role of {} to {}", user.id, user.role),
        }
        Ok(user)
    }

    // ── Global pool ──────────────────────────────────────────────

    /// The global pool: from the backend when reachable, else the cached
    /// entries. With nothing stored, the standard catalogue with no selection.
    pub async fn global_pool(&self) -> SyncResult<GlobalRangePool> {
        let entries = if self.connectivity.is_connected().await {
            let entries: Vec<PoolEntry> = self
                .engine
                .fetch_decoded(&self.config().config_collection)
                .await?;
            self.cache.save_pool_entries(&entries)?;
            entries
        } else {
            self.cache.load_pool_entries()
        };
        if entries.is_empty() {
            return Ok(GlobalRangePool::standard());
        }
        Ok(GlobalRangePool::from_entries(&entries)?)
    }

    /// Makes `range` the only selected pool interval.
    ///
    /// Seeds the standard candidates when the backend has none. Exactly one
    /// entry ends up selected even when several documents describe the same
    /// interval: an already selected match is kept, otherwise the match with
    /// the lowest id. The previous selection is cleared before the new one is
    /// set.
    pub async fn select_global_pool(&self, range: Range) -> SyncResult<GlobalRangePool> {
        self.require_admin("global pool selection")?;
        self.require_online().await?;

        let collection = &self.config().config_collection;
        let mut entries: Vec<PoolEntry> = self.engine.fetch_decoded(collection).await?;
        if entries.is_empty() {
            entries = self.seed_pool(collection).await?;
        }

        let candidates = entries
            .iter()
            .map(PoolEntry::as_range)
            .collect::<Result<Vec<_>, _>>()?;
        let mut pool = GlobalRangePool::new(candidates);
        pool.select(range)?;

        let chosen = Self::pick_selected(&entries, range)
            .ok_or(SyncError::Types(TypesError::NotACandidate(range)))?;
        let mut turn_on = None;
        let mut turn_off = Vec::new();
        for (i, entry) in entries.iter_mut().enumerate() {
            let wanted = i == chosen;
            if entry.is_selected == wanted {
                continue;
            }
            if wanted {
                turn_on = Some(entry);
            } else {
                turn_off.push(entry);
            }
        }
        for entry in turn_off {
            self.set_selected(collection, entry, false).await?;
        }
        if let Some(entry) = turn_on {
            self.set_selected(collection, entry, true).await?;
        }

        self.cache.save_pool_entries(&entries)?;
        info!("Selected global pool {range}");
        Ok(GlobalRangePool::from_entries(&entries)?)
    }

    /// Index of the entry that should carry the selection for `range`.
    fn pick_selected(entries: &[PoolEntry], range: Range) -> Option<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.start == range.start() && e.end == range.end())
            .min_by(|(_, a), (_, b)| {
                b.is_selected
                    .cmp(&a.is_selected)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|(i, _)| i)
    }

    async fn seed_pool(&self, collection: &str) -> SyncResult<Vec<PoolEntry>> {
        let mut entries = GlobalRangePool::standard().to_entries();
        for entry in &mut entries {
            let id = self
                .remote
                .insert(collection, Document::encode(&*entry)?)
                .await?;
            entry.id = Some(id);
        }
        debug!("Seeded {} pool entries", entries.len());
        Ok(entries)
    }

    async fn set_selected(
        &self,
        collection: &str,
        entry: &mut PoolEntry,
        selected: bool,
    ) -> SyncResult<()> {
        let Some(id) = entry.id.as_deref() else {
            return Err(SyncError::Remote(format!(
                "pool entry {}-{} has no document id",
                entry.start, entry.end
            )));
        };
        let mut patch = Map::new();
        patch.insert("isSelected".into(), Value::from(u8::from(selected)));
        self.remote.update(collection, id, patch).await?;
        entry.is_selected = selected;
        Ok(())
    }

    // ── Sequencing & registration ────────────────────────────────

    /// Next number `registrador_id` would stamp, from the local replica.
    pub fn next_number(&self, registrador_id: &UserId) -> SyncResult<i64> {
        let user = self.cached_user(registrador_id)?;
        let persons = self.cache.load_persons();
        Ok(NumberSequencer::next_number(&user, &persons)?)
    }

    /// Numbers still free in `registrador_id`'s block.
    pub fn remaining_numbers(&self, registrador_id: &UserId) -> SyncResult<i64> {
        let user = self.cached_user(registrador_id)?;
        let persons = self.cache.load_persons();
        Ok(NumberSequencer::remaining(&user, &persons)?)
    }

    fn cached_user(&self, id: &UserId) -> SyncResult<User> {
        self.cache
            .find_user(id)
            .ok_or_else(|| SyncError::UnknownUser(id.clone()))
    }

    /// Registers a person for the signed-in Registrador.
    ///
    /// The record is stamped and stored locally first. Uploading afterwards
    /// is best-effort; the returned record reflects whether it went through.
    pub async fn register_person(&self, draft: PersonDraft) -> SyncResult<Person> {
        if !self.session.is_registrador() {
            return Err(SyncError::PermissionDenied(format!(
                "only Registradores register persons, signed in as {}",
                self.session.role
            )));
        }
        draft.validate()?;
        self.prepare_for_sequencing().await;

        let me = &self.session.user_id;
        let user = self
            .cache
            .find_user(me)
            .ok_or_else(|| SyncError::UnknownUser(me.clone()))?;
        let mut persons = self.cache.try_load_persons()?;
        let document = draft.numero_documento.trim();
        if persons.iter().any(|p| p.numero_documento == document) {
            return Err(SyncError::DuplicateDocument(document.to_string()));
        }

        let number = NumberSequencer::next_number(&user, &persons)?;
        let person = draft.into_person(number, me.clone());
        persons.push(person.clone());
        self.cache.save_persons(&persons)?;
        info!("Registered document {} as number {number}", person.numero_documento);

        match self.engine.sync_up().await {
            Ok(report) => debug!("Post-registration upload: {report:?}"),
            Err(e) => warn!("Post-registration upload failed, record stays pending: {e}"),
        }

        Ok(self
            .cache
            .load_persons()
            .into_iter()
            .find(|p| p.numero_documento == person.numero_documento)
            .unwrap_or(person))
    }

    /// Runs the first download-merge of the session and refreshes the
    /// signed-in user's block. Failures leave the local view as it is.
    async fn prepare_for_sequencing(&self) {
        if !self.connectivity.is_connected().await {
            return;
        }

        let me = &self.session.user_id;
        match self
            .remote
            .get(&self.config().users_collection, me.as_str())
            .await
        {
            Ok(Some(doc)) => match doc.decode::<User>() {
                Ok(fresh) => {
                    if let Err(e) = self.cache.upsert_user(&fresh) {
                        warn!("Could not cache profile of {me}: {e}");
                    }
                }
                Err(e) => warn!("Undecodable profile for {me}: {e}"),
            },
            Ok(None) => {}
            Err(e) => warn!("Could not refresh profile of {me}: {e}"),
        }

        if self.merged_this_session.load(Ordering::SeqCst) {
            return;
        }
        match self.engine.sync_down(&self.session).await {
            Ok(report) if !report.offline => {
                self.merged_this_session.store(true, Ordering::SeqCst);
            }
            Ok(_) => {}
            Err(e) => warn!("Download before registration failed: {e}"),
        }
    }

    /// Records not yet acknowledged by the backend.
    pub fn pending_persons(&self) -> Vec<Person> {
        self.cache
            .load_persons()
            .into_iter()
            .filter(|p| !p.is_synced)
            .collect()
    }

    /// Records the session may see: all of them for an Administrador, own
    /// registrations otherwise.
    pub fn visible_persons(&self) -> Vec<Person> {
        let persons = self.cache.load_persons();
        if self.session.is_administrador() {
            return persons;
        }
        persons
            .into_iter()
            .filter(|p| p.registrado_por == self.session.user_id)
            .collect()
    }

    // ── Sync ─────────────────────────────────────────────────────

    pub async fn sync_up(&self) -> SyncResult<SyncUpReport> {
        self.engine.sync_up().await
    }

    pub async fn sync_down(&self) -> SyncResult<SyncDownReport> {
        let report = self.engine.sync_down(&self.session).await?;
        if !report.offline {
            self.merged_this_session.store(true, Ordering::SeqCst);
        }
        Ok(report)
    }

    pub async fn sync(&self) -> SyncResult<(SyncDownReport, SyncUpReport)> {
        let (down, up) = self.engine.sync(&self.session).await?;
        if !down.offline {
            self.merged_this_session.store(true, Ordering::SeqCst);
        }
        Ok((down, up))
    }

    pub async fn refresh_directory(&self) -> SyncResult<DirectoryReport> {
        self.engine.refresh_directory().await
    }
}
