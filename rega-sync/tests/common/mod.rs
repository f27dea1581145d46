//! Shared fixtures for sync tests.

#![allow(dead_code)]

use rega_storage::{LocalCache, MemoryStore};
use rega_sync::remote::MemoryDocumentStore;
use rega_sync::{FieldService, ManualConnectivity, Session, SyncConfig, SyncEngine};
use rega_types::{Document, Person, PersonDraft, Range, Role, RoleAssignment, User, UserId};
use std::sync::Arc;

/// A device: local cache plus handles on the backend and the network switch.
pub struct Fixture {
    pub remote: Arc<MemoryDocumentStore>,
    pub net: Arc<ManualConnectivity>,
    pub cache: LocalCache,
    pub config: SyncConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_remote(Arc::new(MemoryDocumentStore::new()))
    }

    /// A second device sharing `remote`.
    pub fn with_remote(remote: Arc<MemoryDocumentStore>) -> Self {
        Self {
            remote,
            net: Arc::new(ManualConnectivity::new(true)),
            cache: LocalCache::new(Arc::new(MemoryStore::new())),
            config: SyncConfig::default(),
        }
    }

    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            self.cache.clone(),
            self.remote.clone(),
            self.net.clone(),
            self.config.clone(),
        )
    }

    pub fn service(&self, session: Session) -> FieldService {
        FieldService::new(
            session,
            self.cache.clone(),
            self.remote.clone(),
            self.net.clone(),
            self.config.clone(),
        )
    }

    /// Stores `user` on the backend under its own id.
    pub fn seed_user(&self, user: &User) {
        self.remote.seed("users", [user_doc(user)]);
    }

    /// Seeds `user` remotely and signs in as them.
    pub async fn sign_in(&self, user: &User) -> FieldService {
        self.seed_user(user);
        let session = Session::sign_in(
            &user.id,
            &self.cache,
            self.remote.as_ref(),
            self.net.as_ref(),
            &self.config,
        )
        .await
        .unwrap();
        self.service(session)
    }

    pub fn offline(&self) {
        self.net.set_online(false);
    }

    pub fn online(&self) {
        self.net.set_online(true);
    }

    pub fn remote_user(&self, id: &str) -> User {
        self.remote
            .documents("users")
            .into_iter()
            .find(|d| d.id == id)
            .unwrap()
            .decode()
            .unwrap()
    }

    pub fn remote_persons(&self) -> Vec<Document> {
        self.remote.documents("persons")
    }
}

pub fn range(start: i64, end: i64) -> Range {
    Range::new(start, end).unwrap()
}

pub fn user(id: &str, role: Role) -> User {
    let mut user = User::new(id).with_name("Test", id);
    user.role = role;
    user
}

pub fn registrador(id: &str, start: i64, end: i64) -> User {
    let mut user = User::new(id).with_name("Reg", id);
    user.apply(&RoleAssignment::registrador(range(start, end)));
    user
}

pub fn user_doc(user: &User) -> Document {
    Document::new(user.id.as_str(), Document::encode(user).unwrap())
}

pub fn draft(doc: &str) -> PersonDraft {
    PersonDraft {
        numero_documento: doc.to_string(),
        nombres: "María".to_string(),
        apellidos: "Guerrero".to_string(),
        celular: "3001234567".to_string(),
        departamento: "Nariño".to_string(),
        municipio: "Pasto".to_string(),
        vereda: "La Laguna".to_string(),
        ..Default::default()
    }
}

pub fn person(doc: &str, number: i64, by: &str) -> Person {
    draft(doc).into_person(number, UserId::new(by))
}

/// A backend copy of `person` as another device would have uploaded it.
pub fn person_doc(id: &str, person: &Person) -> Document {
    let mut data = Document::encode(person).unwrap();
    data["isSynced"] = 1.into();
    Document::new(id, data)
}
