//! Session record storage keyed by the cookie token
//!
//! This module owns the association `session token -> SessionGameState`:
//! - Record lifecycle (create, overwrite, destroy, expiry)
//! - Revisioned writes so concurrent requests on one session cannot lose updates
//! - Idle expiry with periodic purging
//!
//! The store keeps records as opaque encoded bytes, the way an external
//! key-value store would, so the game layer never shares memory with it.

use crate::error::StoreError;
use async_trait::async_trait;
use log::{debug, info};
use shared::SessionGameState;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A decoded session together with the revision it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub state: SessionGameState,
    /// Incremented on every successful write to the record
    pub revision: u64,
}

/// Storage for per-player game state
///
/// Implementations must make `compare_and_swap` and `remove_if` atomic with
/// respect to every other write on the same token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a live session, refreshing its idle timer. Expired or unknown
    /// tokens yield `None`.
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Unconditionally writes `state`, returning the new revision.
    async fn save(&self, token: &str, state: &SessionGameState) -> Result<u64, StoreError>;

    /// Writes `state` only if the record is still at `expected_revision`.
    async fn compare_and_swap(
        &self,
        token: &str,
        expected_revision: u64,
        state: &SessionGameState,
    ) -> Result<bool, StoreError>;

    /// Destroys the record only if it is still at `expected_revision`.
    async fn remove_if(&self, token: &str, expected_revision: u64) -> Result<bool, StoreError>;

    /// Drops expired records, returning how many were removed.
    async fn purge_expired(&self) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// First characters of a token, enough to correlate log lines without
/// writing the secret itself to the log.
pub fn token_tag(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(6)
        .map(|(index, _)| index)
        .unwrap_or(token.len());
    &token[..end]
}

#[derive(Debug)]
struct StoredSession {
    data: Vec<u8>,
    revision: u64,
    last_seen: Instant,
}

impl StoredSession {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() > ttl
    }

    fn decode(&self) -> Result<SessionGameState, StoreError> {
        Ok(bincode::deserialize(&self.data)?)
    }
}

/// In-process session store with idle expiry
///
/// Records expire after `ttl` without any read or write. Expired records are
/// invisible immediately and physically removed by `purge_expired`.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of records held, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get(token) {
            Some(stored) => stored.is_expired(self.ttl),
            None => return Ok(None),
        };
        if expired {
            sessions.remove(token);
            debug!("Session {} expired on access", token_tag(token));
            return Ok(None);
        }

        match sessions.get_mut(token) {
            Some(stored) => {
                stored.last_seen = Instant::now();
                Ok(Some(SessionRecord {
                    state: stored.decode()?,
                    revision: stored.revision,
                }))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, token: &str, state: &SessionGameState) -> Result<u64, StoreError> {
        let data = bincode::serialize(state)?;
        let mut sessions = self.sessions.write().await;

        let revision = sessions
            .get(token)
            .map(|stored| stored.revision + 1)
            .unwrap_or(1);
        sessions.insert(
            token.to_string(),
            StoredSession {
                data,
                revision,
                last_seen: Instant::now(),
            },
        );

        Ok(revision)
    }

    async fn compare_and_swap(
        &self,
        token: &str,
        expected_revision: u64,
        state: &SessionGameState,
    ) -> Result<bool, StoreError> {
        let data = bincode::serialize(state)?;
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(token) {
            Some(stored)
                if stored.revision == expected_revision && !stored.is_expired(self.ttl) =>
            {
                stored.data = data;
                stored.revision += 1;
                stored.last_seen = Instant::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_if(&self, token: &str, expected_revision: u64) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;

        let matches = sessions
            .get(token)
            .map(|stored| stored.revision == expected_revision && !stored.is_expired(self.ttl))
            .unwrap_or(false);
        if matches {
            sessions.remove(token);
            info!("Session {} destroyed", token_tag(token));
        }

        Ok(matches)
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, stored| !stored.is_expired(ttl));

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Purged {} expired sessions", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemorySessionStore {
        MemorySessionStore::new(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_load_unknown_token() {
        let store = store();
        assert_eq!(store.load("nope").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = store();
        let state = SessionGameState::started(2, 1_000);

        let revision = store.save("tok", &state).await.unwrap();
        assert_eq!(revision, 1);

        let record = store.load("tok").await.unwrap().unwrap();
        assert_eq!(record.state, state);
        assert_eq!(record.revision, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_bumps_revision() {
        let store = store();
        store.save("tok", &SessionGameState::new(0)).await.unwrap();
        let revision = store
            .save("tok", &SessionGameState::started(1, 5))
            .await
            .unwrap();
        assert_eq!(revision, 2);
    }

    #[tokio::test]
    async fn test_compare_and_swap_rejects_stale_revision() {
        let store = store();
        store.save("tok", &SessionGameState::started(1, 0)).await.unwrap();

        let mut first = SessionGameState::started(1, 0);
        first.mark_found(1);
        assert!(store.compare_and_swap("tok", 1, &first).await.unwrap());

        let mut stale = SessionGameState::started(1, 0);
        stale.mark_found(2);
        assert!(!store.compare_and_swap("tok", 1, &stale).await.unwrap());

        let record = store.load("tok").await.unwrap().unwrap();
        assert_eq!(record.revision, 2);
        assert!(record.state.has_found(1));
        assert!(!record.state.has_found(2));
    }

    #[tokio::test]
    async fn test_compare_and_swap_on_missing_session() {
        let store = store();
        let state = SessionGameState::new(0);
        assert!(!store.compare_and_swap("ghost", 1, &state).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_if() {
        let store = store();
        store.save("tok", &SessionGameState::started(1, 0)).await.unwrap();

        assert!(!store.remove_if("tok", 7).await.unwrap());
        assert!(store.remove_if("tok", 1).await.unwrap());
        assert!(!store.remove_if("tok", 1).await.unwrap());
        assert_eq!(store.load("tok").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_invisible_and_purged() {
        let store = MemorySessionStore::new(Duration::from_millis(20));
        store.save("old", &SessionGameState::new(0)).await.unwrap();
        store.save("gone", &SessionGameState::new(0)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        store.save("fresh", &SessionGameState::new(0)).await.unwrap();

        assert_eq!(store.load("old").await.unwrap(), None);
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
        assert!(store.load("fresh").await.unwrap().is_some());
    }

    #[test]
    fn test_token_tag() {
        assert_eq!(token_tag("abcdefghijkl"), "abcdef");
        assert_eq!(token_tag("abc"), "abc");
        assert_eq!(token_tag(""), "");
    }
}
