//! The signed-in user, passed explicitly to every operation that depends on
//! the role.

use crate::connectivity::Connectivity;
use crate::error::{SyncError, SyncResult};
use crate::remote::DocumentStore;
use crate::SyncConfig;
use rega_storage::{LocalCache, StorageResult};
use rega_types::{Role, User, UserId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub role: Role,
}

impl Session {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    #[must_use]
    pub fn is_administrador(&self) -> bool {
        self.role == Role::Administrador
    }

    #[must_use]
    pub fn is_registrador(&self) -> bool {
        self.role == Role::Registrador
    }

    /// The session saved by the last [`persist`](Self::persist), if any.
    #[must_use]
    pub fn restore(cache: &LocalCache) -> Option<Self> {
        let user_id = cache.current_user_id()?;
        let role = cache.current_role()?;
        Some(Self { user_id, role })
    }

    pub fn persist(&self, cache: &LocalCache) -> StorageResult<()> {
        cache.save_session(&self.user_id, self.role)
    }

    /// Starts a session for `user_id`.
    ///
    /// The user record comes from the backend when reachable, otherwise from
    /// the cache. A Registrador's profile is kept locally so numbers can be
    /// stamped offline.
    pub async fn sign_in(
        user_id: &UserId,
        cache: &LocalCache,
        remote: &dyn DocumentStore,
        connectivity: &dyn Connectivity,
        config: &SyncConfig,
    ) -> SyncResult<Self> {
        let mut user = None;
        if connectivity.is_connected().await {
            match remote.get(&config.users_collection, user_id.as_str()).await {
                Ok(Some(doc)) => {
                    let fresh: User = doc.decode()?;
                    cache.upsert_user(&fresh)?;
                    user = Some(fresh);
                }
                Ok(None) => {}
                Err(e) => warn!("Could not fetch user {user_id}, using cached profile: {e}"),
            }
        }
        let user = match user {
            Some(user) => user,
            None => cache
                .find_user(user_id)
                .ok_or_else(|| SyncError::UnknownUser(user_id.clone()))?,
        };

        if user.is_registrador() {
            cache.save_registrador(&user)?;
        }
        let session = Self::new(user.id.clone(), user.role);
        session.persist(cache)?;
        info!("Signed in {} as {}", session.user_id, session.role);
        Ok(session)
    }
}
