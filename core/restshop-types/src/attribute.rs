//! Attribute type taxonomy and per-attribute metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classifies every engine attribute into exactly one external shape.
///
/// The serialized names are part of the HTTP contract and match what
/// existing clients already send in `datatype`-style filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeTypeTag {
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "float_array")]
    FloatArray,
    #[serde(rename = "integer_array")]
    IntegerArray,
    #[serde(rename = "string_array")]
    StringArray,
    #[serde(rename = "Curve")]
    Curve,
    #[serde(rename = "OrderedDict[float, Curve]")]
    FloatCurveCollection,
    #[serde(rename = "OrderedDict[datetime, Curve]")]
    TimeCurveCollection,
    #[serde(rename = "TimeSeries")]
    TimeSeries,
}

impl AttributeTypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [AttributeTypeTag; 12] = [
        Self::Boolean,
        Self::Integer,
        Self::Float,
        Self::String,
        Self::DateTime,
        Self::FloatArray,
        Self::IntegerArray,
        Self::StringArray,
        Self::Curve,
        Self::FloatCurveCollection,
        Self::TimeCurveCollection,
        Self::TimeSeries,
    ];

    /// External name of the tag, identical to its serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::DateTime => "datetime",
            Self::FloatArray => "float_array",
            Self::IntegerArray => "integer_array",
            Self::StringArray => "string_array",
            Self::Curve => "Curve",
            Self::FloatCurveCollection => "OrderedDict[float, Curve]",
            Self::TimeCurveCollection => "OrderedDict[datetime, Curve]",
            Self::TimeSeries => "TimeSeries",
        }
    }
}

impl fmt::Display for AttributeTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full description of one attribute of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttribute {
    pub attribute_name: String,
    pub attribute_type: AttributeTypeTag,
    pub is_input: bool,
    pub is_output: bool,
    pub legacy_datatype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_func_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_url_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Attribute entry of an object type listing: the bare tag, or the full
/// descriptor when verbose output was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeDescriptor {
    Tag(AttributeTypeTag),
    Detailed(Box<ObjectAttribute>),
}
