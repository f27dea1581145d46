use pretty_assertions::assert_eq;
use rega_storage::{
    keys, LocalCache, LocalStore, MemoryStore, SqliteStore, StorageError, StorageResult,
};
use rega_types::{Document, PersonDraft, PoolEntry, Range, Role, User, UserId};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Wraps a memory store and fails reads while `broken` is set.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    broken: AtomicBool,
}

impl FlakyStore {
    fn break_reads(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

impl LocalStore for FlakyStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("disk unplugged".into()));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.inner.put(key, value)
    }
}

fn person(doc: &str, n: i64) -> rega_types::Person {
    PersonDraft {
        numero_documento: doc.into(),
        nombres: "Luis".into(),
        apellidos: "Mora".into(),
        ..Default::default()
    }
    .into_person(n, UserId::new("reg-1"))
}

fn memory_cache() -> LocalCache {
    LocalCache::new(Arc::new(MemoryStore::new()))
}

// ── Typed collections ────────────────────────────────────────────

#[test]
fn empty_store_loads_empty_collections() {
    let cache = memory_cache();
    assert!(cache.load_persons().is_empty());
    assert!(cache.load_users().is_empty());
    assert!(cache.load_departments().is_empty());
    assert!(cache.load_pool_entries().is_empty());
    assert_eq!(cache.load_registrador(), None);
    assert_eq!(cache.current_user_id(), None);
    assert_eq!(cache.current_role(), None);
}

#[test]
fn persons_roundtrip_preserves_order() {
    let cache = memory_cache();
    let persons = vec![person("3", 3), person("1", 1), person("2", 2)];
    cache.save_persons(&persons).unwrap();
    assert_eq!(cache.load_persons(), persons);
}

#[test]
fn departments_are_stored_as_documents() {
    let cache = memory_cache();
    let departments = vec![Document::new("narino", json!({"name": "Nariño"}))];
    cache.save_departments(&departments).unwrap();
    assert_eq!(cache.load_departments(), departments);
}

#[test]
fn pool_entries_use_numeric_flags() {
    let store = Arc::new(MemoryStore::new());
    let cache = LocalCache::new(store.clone());
    let entry = PoolEntry::new(Range::new(1, 100).unwrap(), true);
    cache.save_pool_entries(&[entry.clone()]).unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&store.get(keys::CONFIG).unwrap().unwrap()).unwrap();
    assert_eq!(raw[0]["isSelected"], 1);
    assert_eq!(cache.load_pool_entries(), vec![entry]);
}

#[test]
fn session_scalars_roundtrip() {
    let cache = memory_cache();
    cache
        .save_session(&UserId::new("admin-1"), Role::Administrador)
        .unwrap();
    assert_eq!(cache.current_user_id(), Some(UserId::new("admin-1")));
    assert_eq!(cache.current_role(), Some(Role::Administrador));
}

#[test]
fn upsert_user_replaces_by_id() {
    let cache = memory_cache();
    cache
        .save_users(&[User::new("a"), User::new("b")])
        .unwrap();

    let mut updated = User::new("b");
    updated.role = Role::Usuario;
    cache.upsert_user(&updated).unwrap();
    cache.upsert_user(&User::new("c")).unwrap();

    let users = cache.load_users();
    assert_eq!(users.len(), 3);
    assert_eq!(users[1].role, Role::Usuario);
    assert_eq!(users[2].id, UserId::new("c"));
}

#[test]
fn upsert_user_refreshes_matching_registrador_profile() {
    let cache = memory_cache();
    let mut reg = User::new("reg-1");
    reg.role = Role::Registrador;
    cache.save_registrador(&reg).unwrap();

    reg.number_init = Some(1);
    reg.number_end = Some(100);
    reg.current_number = Some(1);
    cache.upsert_user(&reg).unwrap();

    assert_eq!(cache.load_registrador(), Some(reg.clone()));
    assert_eq!(cache.find_user(&UserId::new("reg-1")), Some(reg));
}

#[test]
fn find_user_falls_back_to_registrador_profile() {
    let cache = memory_cache();
    cache.save_registrador(&User::new("reg-9")).unwrap();
    assert!(cache.find_user(&UserId::new("reg-9")).is_some());
    assert!(cache.find_user(&UserId::new("nobody")).is_none());
}

// ── Fault handling ───────────────────────────────────────────────

#[test]
fn read_fault_without_history_yields_empty() {
    let store = Arc::new(FlakyStore::default());
    store.break_reads();
    let cache = LocalCache::new(store);
    assert!(cache.load_persons().is_empty());
}

#[test]
fn strict_read_fault_without_history_is_an_error() {
    let store = Arc::new(FlakyStore::default());
    store.break_reads();
    let cache = LocalCache::new(store);
    assert!(matches!(
        cache.try_load_persons(),
        Err(StorageError::Unavailable(_))
    ));
}

#[test]
fn read_fault_falls_back_to_last_good_value() {
    let store = Arc::new(FlakyStore::default());
    let cache = LocalCache::new(store.clone());
    let persons = vec![person("10", 1), person("11", 2)];
    cache.save_persons(&persons).unwrap();

    store.break_reads();

    assert_eq!(cache.load_persons(), persons);
    assert_eq!(cache.try_load_persons().unwrap(), persons);
}

#[test]
fn corrupt_blob_falls_back_to_last_good_value() {
    let store = Arc::new(MemoryStore::new());
    let cache = LocalCache::new(store.clone());
    let persons = vec![person("10", 1)];
    cache.save_persons(&persons).unwrap();
    assert_eq!(cache.load_persons(), persons);

    store.put(keys::PERSONS, b"{not json").unwrap();

    assert_eq!(cache.load_persons(), persons);
}

#[test]
fn corrupt_blob_without_history_is_a_serialization_error() {
    let store = Arc::new(MemoryStore::new());
    store.put(keys::PERSONS, b"{not json").unwrap();
    let cache = LocalCache::new(store);
    assert!(matches!(
        cache.try_load_persons(),
        Err(StorageError::Serialization(_))
    ));
    assert!(cache.load_persons().is_empty());
}

#[test]
fn clones_share_last_good_values() {
    let store = Arc::new(FlakyStore::default());
    let cache = LocalCache::new(store.clone());
    let other = cache.clone();
    cache.save_users(&[User::new("u")]).unwrap();
    store.break_reads();
    assert_eq!(other.load_users(), vec![User::new("u")]);
}

// ── Durable replica ──────────────────────────────────────────────

#[test]
fn cache_over_sqlite_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rega.db");
    let persons = vec![person("77", 5)];

    {
        let cache = LocalCache::new(Arc::new(SqliteStore::open(&path).unwrap()));
        cache.save_persons(&persons).unwrap();
        cache
            .save_session(&UserId::new("reg-1"), Role::Registrador)
            .unwrap();
    }

    let cache = LocalCache::new(Arc::new(SqliteStore::open(&path).unwrap()));
    assert_eq!(cache.load_persons(), persons);
    assert_eq!(cache.current_role(), Some(Role::Registrador));
}
