//! Route handlers. Each one resolves the session and hands the engine work
//! to the blocking pool.

use crate::{ApiError, AppState, Caller};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use restshop_session::{EngineSession, SessionError, SessionResult, lock_session};
use restshop_types::{
    Command, CommandArguments, CommandStatus, Connection, LoggingEndpoint, ModelQuery,
    ModelSnapshot, ObjectInstance, ObjectRef, ObjectTypeInfo, RelationDirection, RelationType,
    SessionInfo, SessionRequest, TimeResolution,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::{JoinError, spawn_blocking};
use tracing::info;

fn join_error(err: JoinError) -> ApiError {
    ApiError::internal(format!("engine task failed: {err}"))
}

/// Runs `work` against one session on the blocking pool.
async fn run<T, F>(state: &AppState, principal: &str, session_id: u32, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut EngineSession) -> SessionResult<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = state.registry.get_session(principal, session_id)?;
    let result = spawn_blocking(move || work(&mut lock_session(&handle)))
        .await
        .map_err(join_error)?;
    Ok(result?)
}

// ── Sessions ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default = "first_session")]
    session_id: u32,
}

fn first_session() -> u32 {
    1
}

pub async fn create_session(
    State(state): State<AppState>,
    caller: Caller,
    body: Option<Json<SessionRequest>>,
) -> Result<Json<SessionInfo>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let registry = Arc::clone(&state.registry);
    let info = spawn_blocking(move || {
        registry.add_session(
            &caller.principal,
            request.session_name.as_deref(),
            request.log_file.as_deref(),
        )
    })
    .await
    .map_err(join_error)??;
    Ok(Json(info))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<SessionInfo>>, ApiError> {
    let registry = Arc::clone(&state.registry);
    let sessions = spawn_blocking(move || registry.list_sessions(&caller.principal))
        .await
        .map_err(join_error)??;
    Ok(Json(sessions))
}

pub async fn get_session(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SessionInfo>, ApiError> {
    let info = run(&state, &caller.principal, query.session_id, |session| Ok(session.info())).await?;
    Ok(Json(info))
}

pub async fn delete_session(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<SessionQuery>,
) -> Result<StatusCode, ApiError> {
    let registry = Arc::clone(&state.registry);
    let principal = caller.principal.clone();
    let removed = spawn_blocking(move || registry.remove_session(&principal, query.session_id))
        .await
        .map_err(join_error)?;
    if !removed {
        return Err(SessionError::UnknownSession {
            principal: caller.principal,
            session_id: query.session_id,
        }
        .into());
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── Time resolution ─────────────────────────────────────────────

pub async fn set_time_resolution(
    State(state): State<AppState>,
    caller: Caller,
    Json(resolution): Json<TimeResolution>,
) -> Result<StatusCode, ApiError> {
    run(&state, &caller.principal, caller.session_id, move |session| {
        session.set_time_resolution(&resolution)
    })
    .await?;
    Ok(StatusCode::OK)
}

pub async fn get_time_resolution(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<TimeResolution>, ApiError> {
    let resolution = run(&state, &caller.principal, caller.session_id, |session| {
        session.time_resolution()
    })
    .await?;
    Ok(Json(resolution))
}

// ── Metadata ────────────────────────────────────────────────────

pub async fn object_types(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<String>>, ApiError> {
    let types = run(&state, &caller.principal, caller.session_id, |session| session.object_types()).await?;
    Ok(Json(types))
}

pub async fn commands(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<String>>, ApiError> {
    let commands = run(&state, &caller.principal, caller.session_id, |session| Ok(session.commands())).await?;
    Ok(Json(commands))
}

#[derive(Debug, Deserialize)]
pub struct InformationQuery {
    #[serde(default = "match_all")]
    attribute_filter: String,
    #[serde(default)]
    verbose: bool,
}

fn match_all() -> String {
    "*".to_string()
}

pub async fn object_type_information(
    State(state): State<AppState>,
    caller: Caller,
    Path(object_type): Path<String>,
    Query(query): Query<InformationQuery>,
) -> Result<Json<ObjectTypeInfo>, ApiError> {
    if query.attribute_filter != "*" {
        return Err(ApiError::bad_request("attribute_filter other than * is not supported"));
    }
    let info = run(&state, &caller.principal, caller.session_id, move |session| {
        session.object_type_info(&object_type, query.verbose)
    })
    .await?;
    Ok(Json(info))
}

// ── Model ───────────────────────────────────────────────────────

pub async fn get_model(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ModelQuery>,
) -> Result<Json<ModelSnapshot>, ApiError> {
    let snapshot = run(&state, &caller.principal, caller.session_id, move |session| {
        session.get_model(&query)
    })
    .await?;
    Ok(Json(snapshot))
}

pub async fn put_model(
    State(state): State<AppState>,
    caller: Caller,
    Json(snapshot): Json<ModelSnapshot>,
) -> Result<Json<Option<CommandStatus>>, ApiError> {
    let status = run(&state, &caller.principal, caller.session_id, move |session| {
        session.apply_model(&snapshot)
    })
    .await?;
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
pub struct ObjectQuery {
    object_name: String,
}

pub async fn get_object(
    State(state): State<AppState>,
    caller: Caller,
    Path(object_type): Path<String>,
    Query(query): Query<ObjectQuery>,
) -> Result<Json<ObjectInstance>, ApiError> {
    let instance = run(&state, &caller.principal, caller.session_id, move |session| {
        session.get_object(&object_type, &query.object_name)
    })
    .await?;
    Ok(Json(instance))
}

pub async fn put_object(
    State(state): State<AppState>,
    caller: Caller,
    Path(object_type): Path<String>,
    Query(query): Query<ObjectQuery>,
    body: Option<Json<ObjectInstance>>,
) -> Result<Json<ObjectInstance>, ApiError> {
    let instance = body.map(|Json(instance)| instance).unwrap_or_default();
    let stored = run(&state, &caller.principal, caller.session_id, move |session| {
        session.put_object(&object_type, &query.object_name, &instance)
    })
    .await?;
    Ok(Json(stored))
}

// ── Connections ─────────────────────────────────────────────────

pub async fn get_connections(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Connection>>, ApiError> {
    let connections = run(&state, &caller.principal, caller.session_id, |session| session.connections()).await?;
    Ok(Json(connections))
}

pub async fn put_connections(
    State(state): State<AppState>,
    caller: Caller,
    Json(connections): Json<Vec<Connection>>,
) -> Result<StatusCode, ApiError> {
    run(&state, &caller.principal, caller.session_id, move |session| {
        connections
            .iter()
            .try_for_each(|connection| session.connect(connection))
    })
    .await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    connection_type: RelationType,
}

pub async fn connect(
    State(state): State<AppState>,
    caller: Caller,
    Path((from_type, from_name, to_type, to_name)): Path<(String, String, String, String)>,
    Query(query): Query<ConnectQuery>,
) -> Result<StatusCode, ApiError> {
    let connection = Connection::new(
        &ObjectRef::new(from_type, from_name),
        &ObjectRef::new(to_type, to_name),
    )
    .with_relation(query.connection_type, RelationDirection::Both);
    run(&state, &caller.principal, caller.session_id, move |session| {
        session.connect(&connection)
    })
    .await?;
    Ok(StatusCode::OK)
}

// ── Simulation ──────────────────────────────────────────────────

pub async fn simulation_command(
    State(state): State<AppState>,
    caller: Caller,
    Path(command): Path<String>,
    body: Option<Json<CommandArguments>>,
) -> Result<Json<CommandStatus>, ApiError> {
    if !state.registry.catalog().commands().contains(&command) {
        return Err(ApiError::bad_request(format!("unknown command: {command}")));
    }
    let arguments = body.map(|Json(arguments)| arguments).unwrap_or_default();
    let command = Command::new(command)
        .with_options(arguments.options)
        .with_values(arguments.values);
    let status = run(&state, &caller.principal, caller.session_id, move |session| {
        session.execute_command(&command)
    })
    .await?;
    Ok(Json(status))
}

// ── Logging ─────────────────────────────────────────────────────

pub async fn register_logging_endpoint(
    State(state): State<AppState>,
    caller: Caller,
    Json(endpoint): Json<LoggingEndpoint>,
) -> Result<Json<LoggingEndpoint>, ApiError> {
    let session_name = run(&state, &caller.principal, caller.session_id, |session| {
        Ok(session.name().to_string())
    })
    .await?;

    let forwarder = state.registry.forwarder();
    forwarder.ping(&endpoint.endpoint, &session_name).await?;
    forwarder.set_endpoint(endpoint.endpoint.clone());
    info!(principal = %caller.principal, endpoint = %endpoint.endpoint, "Log endpoint registered");
    Ok(Json(endpoint))
}
