//! Conversion between principals and stored session records.
//!
//! [`SessionSerializer::serialize`] reduces a principal to the thin record
//! the store keeps, [`SessionSerializer::deserialize`] rebuilds the principal
//! a record references. Full principals live in a TTL cache keyed by provider
//! subject. When the cache no longer holds a subject, sessions pointing at it
//! simply stop resolving; that is an authentication miss, not an error.

use chrono::Utc;
use moka::future::Cache;
use std::time::Duration;
use uuid::Uuid;

use crate::api::models::principals::Principal;
use crate::auth::store::SessionRecord;

/// Bridges the principals the login flow produces and the records the
/// session store keeps.
#[derive(Clone)]
pub struct SessionSerializer {
    principals: Cache<String, Principal>,
}

impl SessionSerializer {
    /// `principal_ttl` must be at least the session timeout, otherwise live
    /// sessions lose their principal early and start denying.
    pub fn new(principal_ttl: Duration) -> Self {
        Self {
            principals: Cache::builder().time_to_live(principal_ttl).build(),
        }
    }

    /// Reduce a principal to a fresh session record, remembering the
    /// principal so the record can be resolved later.
    pub async fn serialize(
        &self,
        principal: &Principal,
        session_timeout: Duration,
    ) -> SessionRecord {
        self.principals
            .insert(principal.id.clone(), principal.clone())
            .await;

        let now = Utc::now();
        SessionRecord {
            id: Uuid::new_v4(),
            subject: principal.id.clone(),
            created_at: now,
            expires_at: now + session_timeout,
        }
    }

    /// Rebuild the principal a record references. `None` means the subject is
    /// no longer cached and the caller must treat the request as
    /// unauthenticated.
    pub async fn deserialize(&self, record: &SessionRecord) -> Option<Principal> {
        self.principals.get(&record.subject).await
    }
}
