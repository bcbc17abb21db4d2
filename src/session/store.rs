//! In-memory session store keyed by user id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use super::state::{Session, Stage};
use crate::matching::Criteria;

/// Holds every live session.
///
/// Each session sits behind its own mutex; [`SessionStore::lock`] is the only
/// way to mutate one, so events from the same user are applied one at a time
/// while different users proceed independently.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock a user's session, creating an idle one on first contact.
    pub async fn lock(&self, user_id: &str) -> OwnedMutexGuard<Session> {
        let existing = self.sessions.read().await.get(user_id).cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let mut sessions = self.sessions.write().await;
                Arc::clone(sessions.entry(user_id.to_string()).or_insert_with(|| {
                    debug!(user_id, "Creating session");
                    Arc::new(Mutex::new(Session::default()))
                }))
            }
        };
        slot.lock_owned().await
    }

    /// Current stage, if the user has a session.
    pub async fn stage(&self, user_id: &str) -> Option<Stage> {
        let slot = self.sessions.read().await.get(user_id).cloned()?;
        let session = slot.lock().await;
        Some(session.stage())
    }

    /// Current criteria, if the user has a session.
    pub async fn criteria(&self, user_id: &str) -> Option<Criteria> {
        let slot = self.sessions.read().await.get(user_id).cloned()?;
        let session = slot.lock().await;
        Some(session.criteria().clone())
    }

    /// Drop sessions idle for longer than `max_idle`. Returns the removed user
    /// ids.
    ///
    /// A session is kept while anyone else holds its slot: [`SessionStore::lock`]
    /// clones the slot under the map lock, so a caller that is still waiting to
    /// acquire it is never handed a session that is no longer in the store.
    pub async fn prune_idle(&self, max_idle: Duration) -> Vec<String> {
        let max_idle = TimeDelta::from_std(max_idle).unwrap_or(TimeDelta::MAX);
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let mut removed = Vec::new();
        sessions.retain(|user_id, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            let Ok(session) = slot.try_lock() else {
                return true;
            };
            if now - session.last_active() > max_idle {
                removed.push(user_id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
