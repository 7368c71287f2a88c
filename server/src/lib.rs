//! Shared state and HTTP API for restshop.
//!
//! Every request resolves a principal (`x-principal` header) and a session
//! id (`session-id` header, default 1). Engine work runs on the blocking
//! pool, one call at a time per session.

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody};

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::routing::{get, post, put};
use axum::Router;
use chrono::Utc;
use restshop_session::{SessionRegistry, UserSession};
use std::sync::Arc;
use tokio::task::spawn_blocking;

pub const PRINCIPAL_HEADER: &str = "x-principal";
pub const SESSION_HEADER: &str = "session-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Principal for requests without an `x-principal` header.
    pub default_principal: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_principal: "default".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, config: ServerConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }
}

/// Principal and session a request acts on.
///
/// Extracting it unlinks expired principals, releases their engines in the
/// background, and then registers or refreshes the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub principal: String,
    pub session_id: u32,
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    headers
        .get(name)
        .map(|value| value.to_str())
        .transpose()
        .map_err(|_| ApiError::bad_request(format!("{name} header is not valid text")))
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = header_value(&parts.headers, PRINCIPAL_HEADER)?
            .unwrap_or(state.config.default_principal.as_str())
            .to_string();
        let session_id = match header_value(&parts.headers, SESSION_HEADER)? {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ApiError::bad_request(format!("invalid {SESSION_HEADER} header: {raw}")))?,
            None => 1,
        };

        let now = Utc::now();
        let expired = state.registry.detach_expired_at(now);
        if expired.iter().any(|user| !user.is_empty()) {
            // Releasing waits on each session lock, so it runs on the blocking pool.
            spawn_blocking(move || expired.into_iter().for_each(UserSession::release_sessions));
        }
        state
            .registry
            .touch_principal(&principal, now.checked_add_signed(state.registry.config().principal_ttl));
        Ok(Self {
            principal,
            session_id,
        })
    }
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/session",
            post(handlers::create_session)
                .get(handlers::get_session)
                .delete(handlers::delete_session),
        )
        .route("/sessions", get(handlers::list_sessions))
        .route(
            "/time_resolution",
            put(handlers::set_time_resolution).get(handlers::get_time_resolution),
        )
        .route("/object_types", get(handlers::object_types))
        .route("/commands", get(handlers::commands))
        .route("/model", get(handlers::get_model).put(handlers::put_model))
        .route(
            "/model/{object_type}/information",
            get(handlers::object_type_information),
        )
        .route(
            "/model/{object_type}",
            get(handlers::get_object).put(handlers::put_object),
        )
        .route(
            "/connections",
            get(handlers::get_connections).put(handlers::put_connections),
        )
        .route(
            "/connect/{from_type}/{from_name}/{to_type}/{to_name}",
            put(handlers::connect),
        )
        .route("/simulation/{command}", post(handlers::simulation_command))
        .route("/logging/endpoint", post(handlers::register_logging_endpoint))
        .with_state(state)
}
