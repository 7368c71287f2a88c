//! In-process engine backend.
//!
//! Keeps the object model, attribute values, relation index and command
//! history in memory. Values are checked against the legacy datatype of
//! their attribute the same way a native engine rejects ill-shaped input.
//! No optimization happens; output attributes hold whatever was set.

mod schema;

use crate::error::{EngineError, EngineResult};
use crate::handle::{AttributeInfo, Engine, EngineConfig, EngineFactory, LogCallback};
use crate::native::{NativeTimeResolution, NativeValue, Scalar, Series, SeriesIndex, SeriesLabel};
use restshop_types::{ObjectRef, RelationDirection, RelationType, parse_timestamp};
use schema::{AttributeDef, COMMANDS, GLOBAL_SETTINGS, ObjectTypeDef, SCHEMA, TIME_UNITS};
use std::collections::HashMap;
use tracing::debug;

struct Edge {
    from: ObjectRef,
    to: ObjectRef,
    relation_type: RelationType,
}

pub struct MemoryEngine {
    config: EngineConfig,
    instances: HashMap<&'static str, Vec<String>>,
    values: HashMap<ObjectRef, HashMap<String, NativeValue>>,
    edges: Vec<Edge>,
    time_resolution: Option<NativeTimeResolution>,
    executed: Vec<String>,
    log_callback: Option<LogCallback>,
}

impl MemoryEngine {
    pub fn new(config: EngineConfig) -> Self {
        let mut engine = Self {
            config,
            instances: HashMap::new(),
            values: HashMap::new(),
            edges: Vec::new(),
            time_resolution: None,
            executed: Vec::new(),
            log_callback: None,
        };
        engine
            .instances
            .insert(GLOBAL_SETTINGS, vec![GLOBAL_SETTINGS.to_string()]);
        engine
    }

    fn log(&self, level: &str, message: &str) {
        if let Some(callback) = &self.log_callback {
            callback(message, level, self.config.id.as_str());
        }
    }

    fn type_def(&self, object_type: &str) -> EngineResult<&'static ObjectTypeDef> {
        schema::object_type(object_type)
            .ok_or_else(|| EngineError::UnknownObjectType(object_type.to_string()))
    }

    fn attribute_def(&self, object_type: &str, attribute: &str) -> EngineResult<&'static AttributeDef> {
        self.type_def(object_type)?
            .attribute(attribute)
            .ok_or_else(|| EngineError::UnknownAttribute {
                object_type: object_type.to_string(),
                attribute: attribute.to_string(),
            })
    }

    fn exists(&self, object: &ObjectRef) -> bool {
        self.instances
            .get(object.object_type.as_str())
            .is_some_and(|names| names.contains(&object.object_name))
    }

    fn require_object(&self, object: &ObjectRef) -> EngineResult<()> {
        self.type_def(&object.object_type)?;
        if self.exists(object) {
            Ok(())
        } else {
            Err(EngineError::UnknownObject {
                object_type: object.object_type.clone(),
                object_name: object.object_name.clone(),
            })
        }
    }

    fn set_global(&mut self, attribute: &str, value: NativeValue) {
        let global = ObjectRef::new(GLOBAL_SETTINGS, GLOBAL_SETTINGS);
        self.values
            .entry(global)
            .or_default()
            .insert(attribute.to_string(), value);
    }
}

impl Drop for MemoryEngine {
    fn drop(&mut self) {
        debug!(engine_id = %self.config.id, "Engine released");
    }
}

fn command_line(command: &str, options: &[String], values: &[String]) -> String {
    let mut line = command.to_string();
    for option in options {
        line.push_str(" /");
        line.push_str(option.trim_start_matches('/'));
    }
    for value in values {
        line.push(' ');
        line.push_str(value);
    }
    line
}

fn invalid(attribute: &AttributeDef, reason: String) -> EngineError {
    EngineError::InvalidValue {
        attribute: attribute.name.to_string(),
        reason,
    }
}

fn check_float_series(attribute: &AttributeDef, series: &Series) -> EngineResult<()> {
    if !matches!(series.index, SeriesIndex::Float(_)) {
        return Err(invalid(attribute, "curve index must be numeric".to_string()));
    }
    if !series.is_aligned() {
        return Err(invalid(
            attribute,
            format!(
                "curve has {} x values but {} y values",
                series.index.len(),
                series.values.len()
            ),
        ));
    }
    Ok(())
}

fn check_curve_list(
    attribute: &AttributeDef,
    list: &[Series],
    label_ok: fn(&SeriesLabel) -> bool,
) -> EngineResult<()> {
    for (position, series) in list.iter().enumerate() {
        check_float_series(attribute, series)?;
        if !series.label.as_ref().is_some_and(label_ok) {
            return Err(invalid(
                attribute,
                format!("curve {position} has a missing or mistyped reference label"),
            ));
        }
    }
    Ok(())
}

/// Checks `value` against the attribute's datatype and normalizes numbers
/// where the engine would widen them.
fn validate(attribute: &AttributeDef, value: NativeValue) -> EngineResult<NativeValue> {
    match (attribute.datatype, value) {
        (_, NativeValue::Null) => Ok(NativeValue::Null),
        ("bool", v @ NativeValue::Scalar(Scalar::Bool(_))) => Ok(v),
        ("int", v @ NativeValue::Scalar(Scalar::Int(_))) => Ok(v),
        ("double", NativeValue::Scalar(Scalar::Int(i))) => Ok(Scalar::Double(i as f64).into()),
        ("double", v @ NativeValue::Scalar(Scalar::Double(_))) => Ok(v),
        ("str" | "string", v @ NativeValue::Scalar(Scalar::Str(_))) => Ok(v),
        ("datetime", NativeValue::Scalar(Scalar::Str(raw))) => match parse_timestamp(&raw) {
            Ok(_) => Ok(Scalar::Str(raw).into()),
            Err(e) => Err(invalid(attribute, e.to_string())),
        },
        ("int_array", NativeValue::Array(items)) => {
            if let Some(bad) = items.iter().find(|s| !matches!(s, Scalar::Int(_))) {
                return Err(invalid(attribute, format!("{} element in int array", bad.type_name())));
            }
            Ok(NativeValue::Array(items))
        }
        ("double_array", NativeValue::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Scalar::Int(i) => Ok(Scalar::Double(i as f64)),
                d @ Scalar::Double(_) => Ok(d),
                other => Err(invalid(
                    attribute,
                    format!("{} element in double array", other.type_name()),
                )),
            })
            .collect::<EngineResult<Vec<_>>>()
            .map(NativeValue::Array),
        ("string_array", NativeValue::Array(items)) => {
            if let Some(bad) = items.iter().find(|s| !matches!(s, Scalar::Str(_))) {
                return Err(invalid(attribute, format!("{} element in string array", bad.type_name())));
            }
            Ok(NativeValue::Array(items))
        }
        ("xy", NativeValue::Series(series)) => {
            check_float_series(attribute, &series)?;
            Ok(NativeValue::Series(series))
        }
        ("xy_array" | "xyn", NativeValue::SeriesList(list)) => {
            check_curve_list(attribute, &list, |l| matches!(l, SeriesLabel::Float(_)))?;
            Ok(NativeValue::SeriesList(list))
        }
        ("xyt", NativeValue::SeriesList(list)) => {
            check_curve_list(attribute, &list, |l| matches!(l, SeriesLabel::Time(_)))?;
            Ok(NativeValue::SeriesList(list))
        }
        ("txy", NativeValue::Series(series)) => {
            if !matches!(series.index, SeriesIndex::Time(_)) {
                return Err(invalid(attribute, "time series index must be timestamps".to_string()));
            }
            if !series.is_aligned() {
                return Err(invalid(attribute, "values do not match timestamps".to_string()));
            }
            Ok(NativeValue::Series(series))
        }
        ("txy", NativeValue::Frame(frame)) => {
            if !frame.is_aligned() {
                return Err(invalid(attribute, "frame columns do not match timestamps".to_string()));
            }
            Ok(NativeValue::Frame(frame))
        }
        (datatype, other) => Err(invalid(
            attribute,
            format!("{} value does not fit datatype {datatype}", other.shape()),
        )),
    }
}

impl Engine for MemoryEngine {
    fn object_types(&self) -> Vec<String> {
        SCHEMA.iter().map(|t| t.name.to_string()).collect()
    }

    fn object_names(&self, object_type: &str) -> EngineResult<Vec<String>> {
        let def = self.type_def(object_type)?;
        Ok(self.instances.get(def.name).cloned().unwrap_or_default())
    }

    fn add_object(&mut self, object_type: &str, object_name: &str) -> EngineResult<()> {
        let def = self.type_def(object_type)?;
        let names = self.instances.entry(def.name).or_default();
        if names.iter().any(|n| n == object_name) {
            return Err(EngineError::ObjectExists {
                object_type: object_type.to_string(),
                object_name: object_name.to_string(),
            });
        }
        names.push(object_name.to_string());
        debug!(engine_id = %self.config.id, object_type, object_name, "Object created");
        Ok(())
    }

    fn attribute_names(&self, object_type: &str) -> EngineResult<Vec<String>> {
        Ok(self
            .type_def(object_type)?
            .attributes
            .iter()
            .map(|a| a.name.to_string())
            .collect())
    }

    fn attribute_info(&self, object_type: &str, attribute: &str) -> EngineResult<AttributeInfo> {
        let def = self.attribute_def(object_type, attribute)?;
        Ok(AttributeInfo {
            datatype: def.datatype.to_string(),
            is_input: def.is_input,
            is_output: def.is_output,
            x_unit: def.x_unit.map(str::to_string),
            y_unit: def.y_unit.map(str::to_string),
            full_name: Some(format!("{object_type}.{attribute}")),
            description: Some(def.description.to_string()),
            ..AttributeInfo::default()
        })
    }

    fn get_attribute(
        &self,
        object_type: &str,
        object_name: &str,
        attribute: &str,
    ) -> EngineResult<NativeValue> {
        let object = ObjectRef::new(object_type, object_name);
        self.require_object(&object)?;
        self.attribute_def(object_type, attribute)?;
        Ok(self
            .values
            .get(&object)
            .and_then(|attrs| attrs.get(attribute))
            .cloned()
            .unwrap_or(NativeValue::Null))
    }

    fn set_attribute(
        &mut self,
        object_type: &str,
        object_name: &str,
        attribute: &str,
        value: NativeValue,
    ) -> EngineResult<()> {
        let object = ObjectRef::new(object_type, object_name);
        self.require_object(&object)?;
        let def = self.attribute_def(object_type, attribute)?;
        let value = validate(def, value)?;
        let attrs = self.values.entry(object).or_default();
        if value == NativeValue::Null {
            attrs.remove(attribute);
        } else {
            attrs.insert(attribute.to_string(), value);
        }
        Ok(())
    }

    fn set_time_resolution(&mut self, resolution: NativeTimeResolution) -> EngineResult<()> {
        if resolution.end <= resolution.start {
            return Err(EngineError::InvalidTimeResolution(
                "end time must be after start time".to_string(),
            ));
        }
        if !TIME_UNITS.contains(&resolution.time_unit.as_str()) {
            return Err(EngineError::InvalidTimeResolution(format!(
                "unsupported time unit '{}'",
                resolution.time_unit
            )));
        }
        if let Some(series) = &resolution.resolution {
            if !matches!(series.index, SeriesIndex::Time(_)) || !series.is_aligned() {
                return Err(EngineError::InvalidTimeResolution(
                    "resolution must be a time-indexed series".to_string(),
                ));
            }
        }
        debug!(
            engine_id = %self.config.id,
            start = %resolution.start,
            end = %resolution.end,
            "Time resolution set"
        );
        self.time_resolution = Some(resolution);
        Ok(())
    }

    fn time_resolution(&self) -> EngineResult<NativeTimeResolution> {
        let mut resolution = self
            .time_resolution
            .clone()
            .ok_or(EngineError::TimeResolutionUnset)?;
        if resolution.resolution.is_none() {
            resolution.resolution = Some(Series::new(
                SeriesIndex::Time(vec![resolution.start]),
                vec![1.0],
            ));
        }
        Ok(resolution)
    }

    fn commands(&self) -> Vec<String> {
        COMMANDS.iter().map(|c| c.to_string()).collect()
    }

    fn execute_command(
        &mut self,
        command: &str,
        options: &[String],
        values: &[String],
    ) -> EngineResult<bool> {
        let line = command_line(command, options, values);
        if !COMMANDS.contains(&command) {
            self.log("WARNING", &format!("unknown command: {line}"));
            return Ok(false);
        }

        let accepted = match command {
            "start sim" => {
                self.time_resolution.is_some()
                    && values.iter().all(|v| v.trim().parse::<u32>().is_ok())
            }
            "set time_delay_unit" => values
                .first()
                .is_some_and(|unit| TIME_UNITS.contains(&unit.as_str())),
            _ => true,
        };
        if !accepted {
            self.log("WARNING", &format!("command rejected: {line}"));
            return Ok(false);
        }

        match command {
            "set time_delay_unit" => {
                if let Some(unit) = values.first() {
                    self.set_global("time_delay_unit", Scalar::Str(unit.clone()).into());
                }
            }
            "penalty flag" => {
                let on = options.first().is_none_or(|o| o.trim_start_matches('/') != "off");
                self.set_global("penalty_flag", Scalar::Bool(on).into());
            }
            _ => {}
        }

        debug!(engine_id = %self.config.id, command = %line, "Command executed");
        self.log("INFO", &format!("executing command: {line}"));
        self.executed.push(line);
        Ok(true)
    }

    fn executed_commands(&self) -> Vec<String> {
        self.executed.clone()
    }

    fn related_objects(
        &self,
        object: &ObjectRef,
        direction: RelationDirection,
        relation_type: RelationType,
    ) -> EngineResult<Vec<ObjectRef>> {
        self.require_object(object)?;
        let outputs = || {
            self.edges
                .iter()
                .filter(|e| e.relation_type == relation_type && e.from == *object)
                .map(|e| e.to.clone())
        };
        let inputs = || {
            self.edges
                .iter()
                .filter(|e| e.relation_type == relation_type && e.to == *object)
                .map(|e| e.from.clone())
        };
        Ok(match direction {
            RelationDirection::Output => outputs().collect(),
            RelationDirection::Input => inputs().collect(),
            RelationDirection::Both => outputs().chain(inputs()).collect(),
        })
    }

    fn connect(
        &mut self,
        from: &ObjectRef,
        to: &ObjectRef,
        relation_type: RelationType,
    ) -> EngineResult<()> {
        self.require_object(from)?;
        self.require_object(to)?;
        debug!(
            engine_id = %self.config.id,
            from = %from,
            to = %to,
            relation_type = %relation_type,
            "Objects connected"
        );
        self.edges.push(Edge {
            from: from.clone(),
            to: to.clone(),
            relation_type,
        });
        Ok(())
    }

    fn register_log_callback(&mut self, callback: LogCallback) {
        self.log_callback = Some(callback);
    }
}

/// Creates [`MemoryEngine`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryEngineFactory;

impl EngineFactory for MemoryEngineFactory {
    fn create(&self, config: &EngineConfig) -> EngineResult<Box<dyn Engine>> {
        debug!(engine_id = %config.id, name = %config.name, "Engine created");
        Ok(Box::new(MemoryEngine::new(config.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_formats_options_and_values() {
        assert_eq!(
            command_line("set code", &["/incremental".into()], &[]),
            "set code /incremental"
        );
        assert_eq!(command_line("start sim", &[], &["3".into()]), "start sim 3");
    }

    #[test]
    fn every_schema_datatype_is_a_known_legacy_tag() {
        let known = [
            "bool", "int", "double", "str", "string", "datetime", "double_array", "int_array",
            "string_array", "xy", "xy_array", "xyn", "xyt", "txy",
        ];
        for def in SCHEMA {
            for attr in def.attributes {
                assert!(known.contains(&attr.datatype), "{}.{}", def.name, attr.name);
            }
        }
    }
}
