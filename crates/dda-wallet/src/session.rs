//! Session store: opaque token → credential and derived address.
//!
//! A session goes from absent to active on create and back to absent on
//! destroy or expiry. Sessions are immutable once created and shared as
//! `Arc<Session>`; expired entries are evicted when looked up or swept by
//! [`InMemorySessionStore::purge_expired`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::RngCore;
use tracing::debug;

use dda_core::Address;
use dda_core::constants::SESSION_TTL_SECS;

use crate::keys::Credential;

/// Random bytes per session token.
const TOKEN_BYTES: usize = 32;

#[derive(Debug)]
pub struct Session {
    pub credential: Credential,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// Storage for active sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new session and return its token.
    async fn create(&self, credential: Credential, address: Address) -> String;

    /// The live session for `token`, if any.
    async fn lookup(&self, token: &str) -> Option<Arc<Session>>;

    /// Remove a session. Returns whether one existed.
    async fn destroy(&self, token: &str) -> bool;
}

/// Process-local store. Contents are lost on restart.
pub struct InMemorySessionStore {
    sessions: DashMap<String, Arc<Session>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(SESSION_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored sessions, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
        removed
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, credential: Credential, address: Address) -> String {
        let session = Arc::new(Session {
            credential,
            address,
            created_at: Utc::now(),
        });
        loop {
            let token = new_token();
            if let Entry::Vacant(slot) = self.sessions.entry(token.clone()) {
                slot.insert(session);
                return token;
            }
        }
    }

    async fn lookup(&self, token: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(token).map(|s| Arc::clone(s.value()))?;
        if session.is_expired(Utc::now(), self.ttl) {
            self.sessions.remove(token);
            debug!("evicted expired session");
            return None;
        }
        Some(session)
    }

    async fn destroy(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}
