//! Timestamp-indexed series.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp-indexed numeric data with one or more value rows.
///
/// `values[i][j]` is the value of row `i` at `timestamps[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<Vec<f64>>,
}

impl TimeSeries {
    /// Creates an unnamed series with a single value row.
    pub fn single(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Self {
        Self {
            name: None,
            unit: None,
            timestamps,
            values: vec![values],
        }
    }

    /// A one-point series holding `value` at `at`.
    pub fn constant(at: DateTime<Utc>, value: f64) -> Self {
        Self::single(vec![at], vec![value])
    }

    /// Number of value rows.
    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    /// Checks `len(timestamps) == len(values[i])` for every row.
    pub fn validate(&self) -> Result<()> {
        for (row, values) in self.values.iter().enumerate() {
            if values.len() != self.timestamps.len() {
                return Err(Error::ShapeMismatch(format!(
                    "row {row} has {} values for {} timestamps",
                    values.len(),
                    self.timestamps.len()
                )));
            }
        }
        Ok(())
    }
}
