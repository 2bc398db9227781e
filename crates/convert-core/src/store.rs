//! Session store
//!
//! Holds at most one pending payload per owner, waiting for the user to say
//! what to do with it. Taking a session removes it under the write lock, so
//! two replies racing for the same owner can never both obtain it.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use convert_types::{OwnerId, PayloadKind, PayloadRef};

use crate::clock::{Clock, SystemClock};

/// A payload awaiting a target choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub owner: OwnerId,
    pub payload: PayloadRef,
    pub payload_kind: PayloadKind,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Derived from `payload.source`; filename rules live on the payload.
    pub fn source_extension(&self) -> Option<String> {
        self.payload.source.source_extension()
    }
}

/// Per-owner pending sessions
#[derive(Clone)]
pub struct SessionStore<C: Clock = SystemClock> {
    sessions: Arc<RwLock<HashMap<OwnerId, Session>>>,
    clock: C,
    ttl: Option<chrono::Duration>,
}

impl SessionStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for SessionStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> SessionStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
            ttl: None,
        }
    }

    /// Sessions older than `ttl` are treated as absent. `None` keeps them forever.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl.and_then(|d| chrono::Duration::from_std(d).ok());
        self
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| now - session.created_at >= ttl)
    }

    /// Record `payload` as the owner's pending session, discarding any prior one.
    pub async fn put(&self, owner: OwnerId, payload: PayloadRef) {
        let session = Session {
            payload_kind: payload.kind(),
            owner: owner.clone(),
            payload,
            created_at: self.clock.now(),
        };

        let mut sessions = self.sessions.write().await;
        if let Some(previous) = sessions.insert(owner, session) {
            debug!(
                owner = %previous.owner,
                kind = %previous.payload_kind,
                "Replaced pending session"
            );
        }
    }

    /// Remove and return the owner's session.
    pub async fn take(&self, owner: &OwnerId) -> Option<Session> {
        self.take_if(owner, |_| true).await
    }

    /// Remove and return the owner's session only when `accept` holds for it.
    ///
    /// A rejected session stays in place untouched.
    pub async fn take_if<F>(&self, owner: &OwnerId, accept: F) -> Option<Session>
    where
        F: FnOnce(&Session) -> bool,
    {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get(owner)?;

        if self.is_expired(session, now) {
            sessions.remove(owner);
            debug!(owner = %owner, "Dropped expired session");
            return None;
        }
        if !accept(session) {
            return None;
        }
        sessions.remove(owner)
    }

    /// Copy of the owner's session without removing it.
    pub async fn peek(&self, owner: &OwnerId) -> Option<Session> {
        let now = self.clock.now();
        let sessions = self.sessions.read().await;
        sessions
            .get(owner)
            .filter(|s| !self.is_expired(s, now))
            .cloned()
    }

    /// Number of stored sessions, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !self.is_expired(s, now));
        before - sessions.len()
    }
}
