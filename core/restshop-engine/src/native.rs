//! Value shapes as the engine stores and reports them.

use chrono::{DateTime, Utc};

/// A single engine value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::Str(_) => "str",
        }
    }
}

/// Identifying label of a series. Curve collections store their reference
/// key here.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesLabel {
    Float(f64),
    Time(DateTime<Utc>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesIndex {
    Float(Vec<f64>),
    Time(Vec<DateTime<Utc>>),
}

impl SeriesIndex {
    pub fn len(&self) -> usize {
        match self {
            Self::Float(index) => index.len(),
            Self::Time(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One-dimensional ordered data over an index.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<SeriesLabel>,
    pub index: SeriesIndex,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(index: SeriesIndex, values: Vec<f64>) -> Self {
        Self {
            label: None,
            index,
            values,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: SeriesLabel) -> Self {
        self.label = Some(label);
        self
    }

    pub fn is_aligned(&self) -> bool {
        self.index.len() == self.values.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Time-indexed table with one or more columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub name: Option<String>,
    pub index: Vec<DateTime<Utc>>,
    pub columns: Vec<FrameColumn>,
}

impl Frame {
    pub fn is_aligned(&self) -> bool {
        self.columns.iter().all(|c| c.values.len() == self.index.len())
    }
}

/// Everything an attribute getter can return or a setter accept.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Scalar(Scalar),
    Array(Vec<Scalar>),
    Series(Series),
    Frame(Frame),
    /// Ordered labeled series.
    SeriesList(Vec<Series>),
}

impl NativeValue {
    /// Short shape name used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(s) => s.type_name(),
            Self::Array(_) => "array",
            Self::Series(_) => "series",
            Self::Frame(_) => "frame",
            Self::SeriesList(_) => "series list",
        }
    }
}

impl From<Scalar> for NativeValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Series> for NativeValue {
    fn from(value: Series) -> Self {
        Self::Series(value)
    }
}

/// Time configuration of an engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeTimeResolution {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_unit: String,
    /// Step length over time, in `time_unit`s.
    pub resolution: Option<Series>,
}
