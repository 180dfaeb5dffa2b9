// src/store/session_store.rs

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::session::Session;

/// A session slot. `None` once the session has been finalized, so a request
/// that was queued on the lock sees it as gone.
pub type SessionSlot = Arc<Mutex<Option<Session>>>;

/// Server-side registry of running attempts keyed by session token.
///
/// The map lock is only held to look up or remove a slot; work on a single
/// session happens under that slot's own mutex.
#[derive(Clone, Default)]
pub struct SessionStore {
    slots: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly started session and returns its token.
    pub async fn insert(&self, session: Session) -> Uuid {
        let token = session.id();
        self.slots
            .write()
            .await
            .insert(token, Arc::new(Mutex::new(Some(session))));
        token
    }

    pub async fn get(&self, token: Uuid) -> Option<SessionSlot> {
        self.slots.read().await.get(&token).cloned()
    }

    pub async fn remove(&self, token: Uuid) {
        self.slots.write().await.remove(&token);
    }

    /// Snapshot of every registered slot.
    pub async fn all(&self) -> Vec<(Uuid, SessionSlot)> {
        self.slots
            .read()
            .await
            .iter()
            .map(|(token, slot)| (*token, slot.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }
}
