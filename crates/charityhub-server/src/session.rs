use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use charityhub_db::Database;
use charityhub_stores::EntityStore;
use charityhub_types::entity::Entity;
use charityhub_types::models::{Advertisement, Charity, Connection, Content, User};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::storage::Storage;

pub type Store<T> = EntityStore<T, Database, Storage>;

/// The stores one signed-in admin works with between requests.
pub struct AdminSession {
    pub charities: Store<Charity>,
    pub advertisements: Store<Advertisement>,
    pub contents: Store<Content>,
    pub users: Store<User>,
    pub connections: Store<Connection>,
}

impl AdminSession {
    pub fn new(db: Arc<Database>, storage: Arc<Storage>) -> Self {
        Self {
            charities: EntityStore::new(db.clone(), storage.clone()),
            advertisements: EntityStore::new(db.clone(), storage.clone()),
            contents: EntityStore::new(db.clone(), storage.clone()),
            users: EntityStore::new(db.clone(), storage.clone()),
            connections: EntityStore::new(db, storage),
        }
    }

    pub fn reset(&mut self) {
        self.charities.reset();
        self.advertisements.reset();
        self.contents.reset();
        self.users.reset();
        self.connections.reset();
    }
}

/// Record types reachable through a session.
pub trait SessionEntity: Entity {
    fn store(session: &mut AdminSession) -> &mut Store<Self>;
}

impl SessionEntity for Charity {
    fn store(session: &mut AdminSession) -> &mut Store<Self> {
        &mut session.charities
    }
}

impl SessionEntity for Advertisement {
    fn store(session: &mut AdminSession) -> &mut Store<Self> {
        &mut session.advertisements
    }
}

impl SessionEntity for Content {
    fn store(session: &mut AdminSession) -> &mut Store<Self> {
        &mut session.contents
    }
}

impl SessionEntity for User {
    fn store(session: &mut AdminSession) -> &mut Store<Self> {
        &mut session.users
    }
}

impl SessionEntity for Connection {
    fn store(session: &mut AdminSession) -> &mut Store<Self> {
        &mut session.connections
    }
}

pub type SharedSession = Arc<AsyncMutex<AdminSession>>;

struct Entry {
    session: SharedSession,
    /// Latest `exp` seen for the user, in seconds since the epoch.
    expires_at: usize,
}

/// Sessions keyed by the token subject. A session lives until logout or
/// until the last token seen for it expires.
#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

impl Sessions {
    pub fn get_or_create(
        &self,
        user_id: &str,
        expires_at: usize,
        db: &Arc<Database>,
        storage: &Arc<Storage>,
    ) -> SharedSession {
        let mut sessions = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        evict_expired(&mut sessions, now());

        let entry = sessions.entry(user_id.to_string()).or_insert_with(|| {
            debug!("Opening admin session for {}", user_id);
            Entry {
                session: Arc::new(AsyncMutex::new(AdminSession::new(db.clone(), storage.clone()))),
                expires_at,
            }
        });
        entry.expires_at = entry.expires_at.max(expires_at);
        entry.session.clone()
    }

    pub fn remove(&self, user_id: &str) -> Option<SharedSession> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
            .map(|entry| entry.session)
    }

    /// Drop every session whose tokens expired before `now`. Returns how many
    /// went away.
    pub fn evict_expired(&self, now: usize) -> usize {
        let mut sessions = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        evict_expired(&mut sessions, now)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn evict_expired(sessions: &mut HashMap<String, Entry>, now: usize) -> usize {
    let before = sessions.len();
    sessions.retain(|user_id, entry| {
        let live = entry.expires_at > now;
        if !live {
            debug!("Session of {} expired", user_id);
        }
        live
    });
    before - sessions.len()
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use charityhub_stores::Attachments;

    const LATER: usize = usize::MAX;

    #[tokio::test]
    async fn sessions_are_per_user_and_reset_clears_all() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let storage = Arc::new(Storage::new(dir.path().to_path_buf(), "http://x").await.unwrap());
        let sessions = Sessions::default();

        let a = sessions.get_or_create("alice", LATER, &db, &storage);
        let a_again = sessions.get_or_create("alice", LATER, &db, &storage);
        let b = sessions.get_or_create("bob", LATER, &db, &storage);
        assert!(Arc::ptr_eq(&a, &a_again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(sessions.len(), 2);

        {
            let mut session = a.lock().await;
            let charity = Charity {
                title: "Shared".into(),
                ..Default::default()
            };
            session.charities.add(&charity, &Attachments::new()).await.unwrap();
            session.charities.fetch_all().await.unwrap();
            session.users.fetch_all().await.unwrap();
            assert_eq!(session.charities.len(), 1);
            session.reset();
            assert!(session.charities.is_empty());
        }

        // Bob sees the same backend but his own in-memory view.
        let mut session = b.lock().await;
        assert!(session.charities.is_empty());
        session.charities.fetch_all().await.unwrap();
        assert_eq!(session.charities.len(), 1);

        assert!(sessions.remove("alice").is_some());
        assert!(sessions.remove("alice").is_none());
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn expired_sessions_are_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open_in_memory().unwrap());
        let storage = Arc::new(Storage::new(dir.path().to_path_buf(), "http://x").await.unwrap());
        let sessions = Sessions::default();

        let base = now();
        let stale = sessions.get_or_create("carol", base + 1_000, &db, &storage);
        sessions.get_or_create("dave", base + 5_000, &db, &storage);
        assert_eq!(sessions.evict_expired(base + 2_000), 1);
        assert_eq!(sessions.len(), 1);

        let fresh = sessions.get_or_create("carol", LATER, &db, &storage);
        assert!(!Arc::ptr_eq(&stale, &fresh));
        assert_eq!(sessions.len(), 2);

        assert_eq!(sessions.evict_expired(base + 10_000), 1);
        assert!(sessions.remove("dave").is_none());
        assert!(sessions.remove("carol").is_some());
    }
}
