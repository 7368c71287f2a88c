//! Error types for the session registry.

use restshop_codec::CodecError;
use restshop_engine::EngineError;
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Principal {0} is not registered")]
    UnknownPrincipal(String),

    #[error("Session with id {{{session_id}}} not found")]
    UnknownSession { principal: String, session_id: u32 },

    #[error("First you must set the time_resolution of the session")]
    TimeResolutionNotSet,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("unknown object type: {0}")]
    UnknownObjectType(String),

    #[error("unknown object: {object_type}/{object_name}")]
    UnknownObject {
        object_type: String,
        object_name: String,
    },

    #[error("unknown attribute '{attribute}' on object type '{object_type}'")]
    UnknownAttribute {
        object_type: String,
        attribute: String,
    },

    #[error("simulation has already been started, make a new session first")]
    SimulationStarted,

    #[error("command '{command}' failed: {message}")]
    EngineCommandFailed { command: String, message: String },

    #[error("log endpoint {endpoint} is unreachable: {reason}")]
    LogEndpointUnreachable { endpoint: String, reason: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl SessionError {
    /// Classifies a failure the engine raised during `operation`. Failures
    /// the engine leaves unclassified keep their message under
    /// [`SessionError::EngineCommandFailed`].
    pub fn from_engine(operation: &str, err: EngineError) -> Self {
        match err {
            EngineError::UnknownObjectType(object_type) => Self::UnknownObjectType(object_type),
            EngineError::UnknownObject {
                object_type,
                object_name,
            } => Self::UnknownObject {
                object_type,
                object_name,
            },
            EngineError::UnknownAttribute {
                object_type,
                attribute,
            } => Self::UnknownAttribute {
                object_type,
                attribute,
            },
            EngineError::TimeResolutionUnset => Self::TimeResolutionNotSet,
            err @ (EngineError::InvalidTimeResolution(_) | EngineError::ObjectExists { .. }) => {
                Self::InvalidRequest(err.to_string())
            }
            other @ (EngineError::InvalidValue { .. } | EngineError::Native(_)) => {
                Self::EngineCommandFailed {
                    command: operation.to_string(),
                    message: other.to_string(),
                }
            }
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        Self::from_engine("engine call", err)
    }
}

impl From<restshop_types::Error> for SessionError {
    fn from(err: restshop_types::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}
