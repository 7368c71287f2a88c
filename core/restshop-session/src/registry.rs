//! Principal- and session-scoped lifecycle management.
//!
//! The registry lock only guards the principal table. Engine creation and
//! release happen outside it, and engine calls go through the per-session
//! mutex.

use crate::config::RegistryConfig;
use crate::error::{SessionError, SessionResult};
use crate::forwarder::LogForwarder;
use crate::session::{EngineSession, SessionHandle, lock_session};
use crate::user::UserSession;
use chrono::{DateTime, Utc};
use restshop_codec::TypeCatalog;
use restshop_engine::{EngineConfig, EngineFactory};
use restshop_types::SessionInfo;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Owns every engine session, partitioned by principal.
pub struct SessionRegistry {
    principals: RwLock<HashMap<String, UserSession>>,
    factory: Arc<dyn EngineFactory>,
    catalog: Arc<TypeCatalog>,
    forwarder: LogForwarder,
    config: RegistryConfig,
}

impl SessionRegistry {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        catalog: Arc<TypeCatalog>,
        forwarder: LogForwarder,
        config: RegistryConfig,
    ) -> Self {
        Self {
            principals: RwLock::new(HashMap::new()),
            factory,
            catalog,
            forwarder,
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    pub fn forwarder(&self) -> &LogForwarder {
        &self.forwarder
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, UserSession>> {
        self.principals.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, UserSession>> {
        self.principals.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ================================================================
    // Principals
    // ================================================================

    /// Registers `name` with an empty session table. Re-registering
    /// replaces the previous table and releases its sessions.
    pub fn add_principal(&self, name: &str, expires: Option<DateTime<Utc>>) {
        let previous = self
            .write()
            .insert(name.to_string(), UserSession::new(name, expires));
        info!(principal = %name, "Principal registered");
        if let Some(previous) = previous {
            previous.release_sessions();
        }
    }

    /// Registers `name` on first contact, otherwise moves its expiry.
    pub fn touch_principal(&self, name: &str, expires: Option<DateTime<Utc>>) {
        let mut principals = self.write();
        match principals.get_mut(name) {
            Some(user) => user.set_expires(expires),
            None => {
                principals.insert(name.to_string(), UserSession::new(name, expires));
                info!(principal = %name, "Principal registered");
            }
        }
    }

    pub fn has_principal(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Removes a principal and releases all of its sessions.
    pub fn remove_principal(&self, name: &str) -> bool {
        let removed = self.write().remove(name);
        match removed {
            Some(user) => {
                info!(principal = %name, sessions = user.len(), "Principal removed");
                user.release_sessions();
                true
            }
            None => false,
        }
    }

    // ================================================================
    // Sessions
    // ================================================================

    /// Creates an engine session for `principal`.
    ///
    /// The engine's log stream goes to the shared [`LogForwarder`] under
    /// the id `"{principal}:{session_name}"`.
    pub fn add_session(
        &self,
        principal: &str,
        session_name: Option<&str>,
        log_file: Option<&str>,
    ) -> SessionResult<SessionInfo> {
        let id = self
            .write()
            .get_mut(principal)
            .map(UserSession::allocate_id)
            .ok_or_else(|| SessionError::UnknownPrincipal(principal.to_string()))?;

        let name = session_name.unwrap_or(self.config.default_session_name.as_str());
        let log_file = log_file.unwrap_or(self.config.default_log_file.as_str());
        let config = EngineConfig {
            name: name.to_string(),
            id: format!("{principal}:{name}"),
            log_file: log_file.to_string(),
            silent: true,
        };
        let mut engine = self
            .factory
            .create(&config)
            .map_err(|e| SessionError::from_engine("create engine", e))?;
        engine.register_log_callback(self.forwarder.callback());

        let session = EngineSession::new(principal, id, name, log_file, engine, Arc::clone(&self.catalog));
        let info = session.info();
        let handle: SessionHandle = Arc::new(Mutex::new(session));

        // The principal may have been swept while the engine was starting.
        let orphan = {
            let mut principals = self.write();
            match principals.get_mut(principal) {
                Some(user) => {
                    user.insert(id, Arc::clone(&handle));
                    None
                }
                None => Some(handle),
            }
        };
        if let Some(orphan) = orphan {
            lock_session(&orphan).release();
            return Err(SessionError::UnknownPrincipal(principal.to_string()));
        }

        info!(principal = %principal, session_id = id, session_name = %name, "Session created");
        Ok(info)
    }

    /// Releases and forgets a session. Returns false if it was not there.
    pub fn remove_session(&self, principal: &str, id: u32) -> bool {
        let removed = self
            .write()
            .get_mut(principal)
            .and_then(|user| user.remove(id));
        match removed {
            Some(handle) => {
                lock_session(&handle).release();
                info!(principal = %principal, session_id = id, "Session removed");
                true
            }
            None => false,
        }
    }

    pub fn get_session(&self, principal: &str, id: u32) -> SessionResult<SessionHandle> {
        let principals = self.read();
        let user = principals
            .get(principal)
            .ok_or_else(|| SessionError::UnknownPrincipal(principal.to_string()))?;
        user.get(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownSession {
                principal: principal.to_string(),
                session_id: id,
            })
    }

    /// Sessions of one principal in id order.
    pub fn list_sessions(&self, principal: &str) -> SessionResult<Vec<SessionInfo>> {
        let handles = self
            .read()
            .get(principal)
            .map(UserSession::handles)
            .ok_or_else(|| SessionError::UnknownPrincipal(principal.to_string()))?;
        Ok(handles
            .iter()
            .map(|handle| lock_session(handle).info())
            .collect())
    }

    pub fn require_time_resolution_established(&self, principal: &str, id: u32) -> SessionResult<()> {
        let handle = self.get_session(principal, id)?;
        let mut session = lock_session(&handle);
        session.require_time_resolution()
    }

    // ================================================================
    // Expiry
    // ================================================================

    /// Removes every principal whose expiry is at or before `now` and
    /// releases their sessions. Returns the number of principals removed.
    ///
    /// Releasing waits on each session's lock, so a session busy with an
    /// engine call holds up the sweep. Async callers use
    /// [`detach_expired_at`](Self::detach_expired_at) instead.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let expired = self.detach_expired_at(now);
        let count = expired.len();
        for user in expired {
            user.release_sessions();
        }
        count
    }

    /// Unlinks every principal whose expiry is at or before `now` without
    /// touching their sessions. Only the registry lock is taken.
    ///
    /// The detached sessions are unreachable from the registry but keep
    /// their engines until [`UserSession::release_sessions`] runs.
    pub fn detach_expired_at(&self, now: DateTime<Utc>) -> Vec<UserSession> {
        let expired: Vec<UserSession> = {
            let mut principals = self.write();
            let names: Vec<String> = principals
                .values()
                .filter(|user| user.is_expired_at(now))
                .map(|user| user.principal().to_string())
                .collect();
            names
                .iter()
                .filter_map(|name| principals.remove(name))
                .collect()
        };
        for user in &expired {
            debug!(principal = %user.principal(), sessions = user.len(), "Principal expired");
        }
        if !expired.is_empty() {
            info!(principals = expired.len(), "Expired principals swept");
        }
        expired
    }
}
