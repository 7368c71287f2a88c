//! The uniform external attribute value.

use crate::curve::{Curve, FloatCurveCollection, TimeCurveCollection};
use crate::series::TimeSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One attribute value as exchanged with clients.
///
/// Deserialization is untagged: the first variant whose JSON shape fits
/// wins, so integers come before floats and curves before collections.
/// The attribute's [`AttributeTypeTag`](crate::AttributeTypeTag) decides how
/// the value is finally coerced on its way into the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    DateTime(DateTime<Utc>),
    Text(String),
    IntegerArray(Vec<i64>),
    FloatArray(Vec<f64>),
    StringArray(Vec<String>),
    Curve(Curve),
    TimeSeries(TimeSeries),
    TimeCurves(TimeCurveCollection),
    FloatCurves(FloatCurveCollection),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short shape name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::DateTime(_) => "datetime",
            Self::Text(_) => "string",
            Self::IntegerArray(_) => "integer array",
            Self::FloatArray(_) => "float array",
            Self::StringArray(_) => "string array",
            Self::Curve(_) => "curve",
            Self::TimeSeries(_) => "time series",
            Self::TimeCurves(_) => "time-keyed curve collection",
            Self::FloatCurves(_) => "float-keyed curve collection",
        }
    }

    /// Numeric view of a scalar, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Curve> for AttributeValue {
    fn from(value: Curve) -> Self {
        Self::Curve(value)
    }
}

impl From<TimeSeries> for AttributeValue {
    fn from(value: TimeSeries) -> Self {
        Self::TimeSeries(value)
    }
}

impl From<FloatCurveCollection> for AttributeValue {
    fn from(value: FloatCurveCollection) -> Self {
        Self::FloatCurves(value)
    }
}

impl From<TimeCurveCollection> for AttributeValue {
    fn from(value: TimeCurveCollection) -> Self {
        Self::TimeCurves(value)
    }
}
