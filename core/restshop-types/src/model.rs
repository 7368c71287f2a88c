//! Request and response shapes for sessions, commands and whole models.

use crate::attribute::AttributeDescriptor;
use crate::relation::Connection;
use crate::series::TimeSeries;
use crate::value::AttributeValue;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute name to value, for one object instance.
pub type ObjectAttributes = BTreeMap<String, AttributeValue>;

/// Object type to object name to attributes.
pub type ModelObjects = BTreeMap<String, BTreeMap<String, ObjectAttributes>>;

fn default_time_unit() -> String {
    "hour".to_string()
}

fn default_true() -> bool {
    true
}

/// Optimization horizon of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeResolution {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "default_time_unit")]
    pub time_unit: String,
    /// Optional step-length series; a single row aligned to its timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_resolution: Option<TimeSeries>,
}

impl TimeResolution {
    /// An hourly horizon without a resolution series.
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
            time_unit: default_time_unit(),
            time_resolution: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_time <= self.start_time {
            return Err(Error::InvalidTimeResolution(
                "end_time must be strictly greater than start_time".to_string(),
            ));
        }
        if let Some(series) = &self.time_resolution {
            series.validate()?;
            if series.row_count() != 1 {
                return Err(Error::InvalidTimeResolution(format!(
                    "time_resolution must hold exactly one row, got {}",
                    series.row_count()
                )));
            }
        }
        Ok(())
    }
}

/// Identity of one engine session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: u32,
    pub session_name: String,
    pub log_file: String,
}

/// Body of a session creation request; missing fields take registry defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub log_file: Option<String>,
}

/// One engine command with its ordered options and values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub command: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            options: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }
}

/// Options and values for a command named elsewhere (e.g. in the path).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArguments {
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Outcome of one engine command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandStatus {
    pub message: String,
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandStatus {
    pub fn from_status(status: bool) -> Self {
        Self {
            message: if status { "ok" } else { "something went wrong ..." }.to_string(),
            status,
            error: None,
        }
    }
}

/// All attributes of one object instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectInstance {
    #[serde(default)]
    pub attributes: ObjectAttributes,
}

/// Instances and attribute descriptors of one object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTypeInfo {
    pub object_type: String,
    pub instances: Vec<String>,
    pub attributes: BTreeMap<String, AttributeDescriptor>,
}

/// A whole model: horizon, objects, connections and commands.
///
/// Every part is optional so the same shape serves bulk reads and bulk
/// writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeResolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelObjects>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<Connection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<Command>>,
}

/// Filters for a bulk model read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelQuery {
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub attribute_name: Option<String>,
    /// Legacy datatype filter (`txy`, `xy`, ...).
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(default)]
    pub is_input: bool,
    #[serde(default = "default_true")]
    pub is_output: bool,
    #[serde(default)]
    pub include_time: bool,
    #[serde(default)]
    pub include_connections: bool,
    #[serde(default)]
    pub compress_txy: bool,
}

impl Default for ModelQuery {
    fn default() -> Self {
        Self {
            object_type: None,
            object_name: None,
            attribute_name: None,
            datatype: None,
            is_input: false,
            is_output: true,
            include_time: false,
            include_connections: false,
            compress_txy: false,
        }
    }
}

/// A log event as posted to the external collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: String,
    pub message: String,
    pub id: String,
}

/// Target of log forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingEndpoint {
    pub endpoint: String,
}
