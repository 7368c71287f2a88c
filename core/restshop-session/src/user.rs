//! Per-principal session table.

use crate::session::{SessionHandle, lock_session};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::warn;

/// Sessions owned by one principal.
pub struct UserSession {
    principal: String,
    expires: Option<DateTime<Utc>>,
    sessions: BTreeMap<u32, SessionHandle>,
    last_id: u32,
}

impl UserSession {
    pub fn new(principal: impl Into<String>, expires: Option<DateTime<Utc>>) -> Self {
        Self {
            principal: principal.into(),
            expires,
            sessions: BTreeMap::new(),
            last_id: 0,
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn set_expires(&mut self, expires: Option<DateTime<Utc>>) {
        self.expires = expires;
    }

    /// Principals without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Next session id. Ids start at 1 and are never handed out twice.
    pub fn allocate_id(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }

    pub fn insert(&mut self, id: u32, session: SessionHandle) {
        self.sessions.insert(id, session);
    }

    pub fn remove(&mut self, id: u32) -> Option<SessionHandle> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: u32) -> Option<&SessionHandle> {
        self.sessions.get(&id)
    }

    /// Sessions in id order.
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Releases every engine this principal owned, waiting on each
    /// session's lock in turn.
    pub fn release_sessions(self) {
        let principal = self.principal;
        for handle in self.sessions.into_values() {
            let mut session = lock_session(&handle);
            if session.is_released() {
                warn!(principal = %principal, session_id = session.id(), "Session was already released");
            } else {
                session.release();
            }
        }
    }
}
