//! External value model for restshop.
//!
//! This crate defines the engine-agnostic types clients exchange with the
//! service:
//! - the attribute type taxonomy ([`AttributeTypeTag`])
//! - attribute values ([`AttributeValue`]) and their shapes: curves, ordered
//!   curve collections and multi-row time series
//! - relations between model objects ([`Connection`])
//! - session, command and whole-model request/response shapes
//!
//! Nothing here talks to an engine; conversion to the engine's native shapes
//! lives in `restshop-codec`.

mod attribute;
mod curve;
mod model;
mod relation;
mod series;
mod time;
mod value;

pub use attribute::{AttributeDescriptor, AttributeTypeTag, ObjectAttribute};
pub use curve::{CollectionKey, Curve, CurveCollection, FloatCurveCollection, TimeCurveCollection};
pub use model::{
    Command, CommandArguments, CommandStatus, LogMessage, LoggingEndpoint, ModelObjects,
    ModelQuery, ModelSnapshot, ObjectAttributes, ObjectInstance, ObjectTypeInfo, SessionInfo,
    SessionRequest, TimeResolution,
};
pub use relation::{Connection, ObjectRef, RelationDirection, RelationType};
pub use series::TimeSeries;
pub use time::{format_timestamp, parse_timestamp};
pub use value::AttributeValue;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or validating values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid curve collection key: {0}")]
    InvalidCollectionKey(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("{0}")]
    InvalidTimeResolution(String),
}
