//! Server-side session storage.
//!
//! Sessions live entirely on the server. The cookie only ever references a
//! [`SessionRecord`] by id, and the record itself stays thin: it points at
//! the principal by provider subject instead of embedding identity data.
//!
//! The same store also tracks pending login state tokens, the one-time values
//! that tie a login initiation to the provider callback that completes it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::Result;

/// How long a pending login may take between the initiation redirect and the
/// provider calling back before its state token lapses.
pub const LOGIN_STATE_TTL: Duration = Duration::from_secs(600);

/// State persisted for one authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// Opaque id the cookie references
    pub id: Uuid,
    /// Provider subject this session authenticates
    pub subject: String,
    /// When the session was established
    pub created_at: DateTime<Utc>,
    /// When the session lapses regardless of activity
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Storage backend for session records and pending login state tokens.
///
/// The in-memory implementation never fails, but the trait surfaces errors so
/// callers already handle outages when an external backend replaces it.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session record.
    async fn insert(&self, record: SessionRecord) -> Result<()>;

    /// Look up a session by id. Unknown ids resolve to `None`.
    async fn get(&self, id: Uuid) -> Result<Option<SessionRecord>>;

    /// Remove a session. Removing an unknown id is not an error, so logout
    /// stays idempotent.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Remember a login state token until the provider calls back.
    async fn put_login_state(&self, state: String) -> Result<()>;

    /// Consume a login state token. Returns `false` when the token is
    /// unknown, expired, or was already consumed.
    async fn consume_login_state(&self, state: &str) -> Result<bool>;
}

/// Process-local store backed by TTL caches.
///
/// Sessions evict at the configured session timeout, pending login states at
/// [`LOGIN_STATE_TTL`]. Restarting the process logs everyone out, which is
/// the accepted trade-off for a single-instance deployment.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<Uuid, SessionRecord>,
    login_states: Cache<String, ()>,
}

impl MemorySessionStore {
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder().time_to_live(session_ttl).build(),
            login_states: Cache::builder().time_to_live(LOGIN_STATE_TTL).build(),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<()> {
        self.sessions.insert(record.id, record).await;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.get(&id).await)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.sessions.invalidate(&id).await;
        Ok(())
    }

    async fn put_login_state(&self, state: String) -> Result<()> {
        self.login_states.insert(state, ()).await;
        Ok(())
    }

    async fn consume_login_state(&self, state: &str) -> Result<bool> {
        Ok(self.login_states.remove(state).await.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            id: Uuid::new_v4(),
            subject: "108417015772".to_string(),
            created_at: now,
            expires_at: now + Duration::from_secs(3600),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let store = MemorySessionStore::new(Duration::from_secs(3600));
        let record = sample_record();

        store.insert(record.clone()).await.unwrap();
        let fetched = store.get(record.id).await.unwrap();

        assert_eq!(fetched, Some(record));
    }

    #[tokio::test]
    async fn test_get_unknown_session() {
        let store = MemorySessionStore::new(Duration::from_secs(3600));
        assert_eq!(store.get(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemorySessionStore::new(Duration::from_secs(3600));
        let record = sample_record();
        store.insert(record.clone()).await.unwrap();

        store.delete(record.id).await.unwrap();
        assert_eq!(store.get(record.id).await.unwrap(), None);

        // Deleting again must not error
        store.delete(record.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_sessions_evict_after_ttl() {
        let store = MemorySessionStore::new(Duration::from_millis(50));
        let record = sample_record();
        store.insert(record.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(store.get(record.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_state_consumed_exactly_once() {
        let store = MemorySessionStore::new(Duration::from_secs(3600));
        store
            .put_login_state("state-token-1".to_string())
            .await
            .unwrap();

        assert!(store.consume_login_state("state-token-1").await.unwrap());
        assert!(!store.consume_login_state("state-token-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_login_state_is_rejected() {
        let store = MemorySessionStore::new(Duration::from_secs(3600));
        assert!(!store.consume_login_state("never-issued").await.unwrap());
    }

    #[test]
    fn test_record_expiry_check() {
        let mut record = sample_record();
        assert!(!record.is_expired());

        record.expires_at = Utc::now() - Duration::from_secs(1);
        assert!(record.is_expired());
    }
}
