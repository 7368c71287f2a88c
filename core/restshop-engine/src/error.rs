//! Error types for engine handles.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown object type: {0}")]
    UnknownObjectType(String),

    #[error("unknown object: {object_type}/{object_name}")]
    UnknownObject {
        object_type: String,
        object_name: String,
    },

    #[error("object already exists: {object_type}/{object_name}")]
    ObjectExists {
        object_type: String,
        object_name: String,
    },

    #[error("unknown attribute '{attribute}' on object type '{object_type}'")]
    UnknownAttribute {
        object_type: String,
        attribute: String,
    },

    #[error("time resolution has not been set")]
    TimeResolutionUnset,

    #[error("invalid time resolution: {0}")]
    InvalidTimeResolution(String),

    #[error("invalid value for '{attribute}': {reason}")]
    InvalidValue { attribute: String, reason: String },

    /// Failure reported by the engine without further classification.
    #[error("engine error: {0}")]
    Native(String),
}
