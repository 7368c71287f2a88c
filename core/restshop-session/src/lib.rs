//! Multi-tenant engine session registry.
//!
//! A [`SessionRegistry`] owns every [`EngineSession`], grouped by principal.
//! Each session wraps one engine instance behind its own mutex and refuses
//! model work until a time resolution is established. Engine log events are
//! pushed to an HTTP collector through the shared [`LogForwarder`].

pub mod config;
pub mod error;
pub mod forwarder;
pub mod model;
pub mod registry;
pub mod session;
pub mod user;

pub use config::RegistryConfig;
pub use error::{SessionError, SessionResult};
pub use forwarder::LogForwarder;
pub use model::selects;
pub use registry::SessionRegistry;
pub use session::{EngineSession, SessionHandle, lock_session};
pub use user::UserSession;
