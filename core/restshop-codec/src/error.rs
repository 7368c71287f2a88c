//! Error types for attribute marshalling and graph enumeration.

use restshop_engine::EngineError;
use restshop_types::AttributeTypeTag;
use std::fmt;
use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

/// Identifies the attribute a conversion was working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeContext {
    pub object_type: String,
    pub object_name: String,
    pub attribute: String,
    pub datatype: AttributeTypeTag,
}

impl AttributeContext {
    pub fn new(
        object_type: impl Into<String>,
        object_name: impl Into<String>,
        attribute: impl Into<String>,
        datatype: AttributeTypeTag,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            object_name: object_name.into(),
            attribute: attribute.into(),
            datatype,
        }
    }
}

impl fmt::Display for AttributeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}.{} ({})",
            self.object_type, self.object_name, self.attribute, self.datatype
        )
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    /// The engine reported a legacy type tag outside the known set. This
    /// means the catalog and the engine disagree on versions.
    #[error("unknown legacy attribute type: {legacy}")]
    UnknownAttributeType { legacy: String },

    #[error("cannot decode {context}: {reason}")]
    AttributeDecode {
        context: AttributeContext,
        reason: String,
    },

    #[error("cannot encode {context}: {reason}")]
    AttributeEncode {
        context: AttributeContext,
        reason: String,
    },

    #[error("connection listing failed at {object} ({detail}): {source}")]
    ConnectionEnumeration {
        object: String,
        detail: String,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}
