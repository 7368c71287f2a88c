//! One engine instance and the typed operations built on it.

use crate::error::{SessionError, SessionResult};
use chrono::{DateTime, Utc};
use restshop_codec::{AttributeContext, CodecError, TypeCatalog, Units, decode, encode, list_connections};
use restshop_engine::{Engine, EngineError, NativeTimeResolution, Series, SeriesIndex};
use restshop_types::{
    AttributeValue, Command, CommandStatus, Connection, ObjectInstance, ObjectTypeInfo,
    SessionInfo, TimeResolution, TimeSeries,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Shared handle to a session. The mutex serializes every engine call.
pub type SessionHandle = Arc<Mutex<EngineSession>>;

/// Locks a session, recovering from a poisoned lock.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, EngineSession> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns one engine instance for the lifetime of a session.
pub struct EngineSession {
    principal: String,
    id: u32,
    name: String,
    log_file: String,
    time_resolution_established: bool,
    engine: Option<Box<dyn Engine>>,
    pub(crate) catalog: Arc<TypeCatalog>,
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("principal", &self.principal)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("log_file", &self.log_file)
            .field("time_resolution_established", &self.time_resolution_established)
            .finish_non_exhaustive()
    }
}

impl EngineSession {
    pub fn new(
        principal: impl Into<String>,
        id: u32,
        name: impl Into<String>,
        log_file: impl Into<String>,
        engine: Box<dyn Engine>,
        catalog: Arc<TypeCatalog>,
    ) -> Self {
        Self {
            principal: principal.into(),
            id,
            name: name.into(),
            log_file: log_file.into(),
            time_resolution_established: false,
            engine: Some(engine),
            catalog,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id,
            session_name: self.name.clone(),
            log_file: self.log_file.clone(),
        }
    }

    pub fn is_released(&self) -> bool {
        self.engine.is_none()
    }

    /// Drops the engine instance. Returns false if it was already gone.
    pub fn release(&mut self) -> bool {
        let released = self.engine.take().is_some();
        if released {
            info!(principal = %self.principal, session_id = self.id, "Engine session released");
        }
        released
    }

    fn released_error(&self) -> SessionError {
        SessionError::UnknownSession {
            principal: self.principal.clone(),
            session_id: self.id,
        }
    }

    pub(crate) fn engine(&self) -> SessionResult<&dyn Engine> {
        match self.engine.as_deref() {
            Some(engine) => Ok(engine),
            None => Err(self.released_error()),
        }
    }

    pub(crate) fn engine_mut(&mut self) -> SessionResult<&mut dyn Engine> {
        match self.engine.as_deref_mut() {
            Some(engine) => Ok(engine),
            None => Err(SessionError::UnknownSession {
                principal: self.principal.clone(),
                session_id: self.id,
            }),
        }
    }

    // ================================================================
    // Time resolution
    // ================================================================

    /// Passes once a time resolution is known to be set.
    ///
    /// While the flag is down the engine is probed once per call, so a
    /// resolution set behind the session's back is picked up.
    pub fn require_time_resolution(&mut self) -> SessionResult<()> {
        if self.time_resolution_established {
            return Ok(());
        }
        match self.engine()?.time_resolution() {
            Ok(_) => {
                debug!(principal = %self.principal, session_id = self.id, "Time resolution found by probe");
                self.time_resolution_established = true;
                Ok(())
            }
            Err(_) => Err(SessionError::TimeResolutionNotSet),
        }
    }

    pub fn set_time_resolution(&mut self, resolution: &TimeResolution) -> SessionResult<()> {
        resolution.validate()?;
        let native = NativeTimeResolution {
            start: resolution.start_time,
            end: resolution.end_time,
            time_unit: resolution.time_unit.clone(),
            resolution: resolution.time_resolution.as_ref().map(step_series),
        };
        self.engine_mut()?
            .set_time_resolution(native)
            .map_err(|e| SessionError::from_engine("set time resolution", e))?;
        self.time_resolution_established = true;
        info!(
            principal = %self.principal,
            session_id = self.id,
            start = %resolution.start_time,
            end = %resolution.end_time,
            unit = %resolution.time_unit,
            "Time resolution set"
        );
        Ok(())
    }

    pub fn time_resolution(&mut self) -> SessionResult<TimeResolution> {
        self.require_time_resolution()?;
        let native = self
            .engine()?
            .time_resolution()
            .map_err(|e| SessionError::from_engine("read time resolution", e))?;
        let time_resolution = match native.resolution {
            Some(series) => Some(step_series_back(series)?),
            None => None,
        };
        Ok(TimeResolution {
            start_time: native.start,
            end_time: native.end,
            time_unit: native.time_unit,
            time_resolution,
        })
    }

    fn start_time(&self) -> Option<DateTime<Utc>> {
        self.engine
            .as_deref()?
            .time_resolution()
            .ok()
            .map(|resolution| resolution.start)
    }

    // ================================================================
    // Metadata
    // ================================================================

    pub fn object_types(&self) -> SessionResult<Vec<String>> {
        Ok(self.engine()?.object_types())
    }

    pub fn object_names(&self, object_type: &str) -> SessionResult<Vec<String>> {
        self.engine()?
            .object_names(object_type)
            .map_err(|e| SessionError::from_engine("list objects", e))
    }

    pub fn object_type_info(&self, object_type: &str, verbose: bool) -> SessionResult<ObjectTypeInfo> {
        let instances = self.object_names(object_type)?;
        self.catalog
            .object_type_info(object_type, instances, verbose)
            .ok_or_else(|| SessionError::UnknownObjectType(object_type.to_string()))
    }

    pub fn commands(&self) -> Vec<String> {
        self.catalog.commands().to_vec()
    }

    pub fn executed_commands(&self) -> SessionResult<Vec<String>> {
        Ok(self.engine()?.executed_commands())
    }

    // ================================================================
    // Attributes and objects
    // ================================================================

    pub(crate) fn attribute_context(
        &self,
        object_type: &str,
        object_name: &str,
        attribute: &str,
    ) -> SessionResult<(AttributeContext, Units)> {
        let Some(spec) = self.catalog.attribute(object_type, attribute) else {
            if self.catalog.has_object_type(object_type) {
                return Err(SessionError::UnknownAttribute {
                    object_type: object_type.to_string(),
                    attribute: attribute.to_string(),
                });
            }
            return Err(SessionError::UnknownObjectType(object_type.to_string()));
        };
        let context = AttributeContext::new(object_type, object_name, attribute, spec.tag);
        let units = Units::new(spec.info.x_unit.clone(), spec.info.y_unit.clone());
        Ok((context, units))
    }

    pub(crate) fn read_attribute(
        &self,
        context: &AttributeContext,
        units: &Units,
        compress: bool,
    ) -> SessionResult<AttributeValue> {
        let native = self
            .engine()?
            .get_attribute(&context.object_type, &context.object_name, &context.attribute)
            .map_err(|e| match e {
                EngineError::Native(reason) => SessionError::Codec(CodecError::AttributeDecode {
                    context: context.clone(),
                    reason,
                }),
                other => SessionError::from_engine("get attribute", other),
            })?;
        Ok(decode(context, native, units, compress)?)
    }

    pub(crate) fn write_attribute(
        &mut self,
        context: &AttributeContext,
        value: &AttributeValue,
    ) -> SessionResult<()> {
        let native = encode(context, value, self.start_time())?;
        self.engine_mut()?
            .set_attribute(&context.object_type, &context.object_name, &context.attribute, native)
            .map_err(|e| match e {
                EngineError::InvalidValue { reason, .. } | EngineError::Native(reason) => {
                    SessionError::Codec(CodecError::AttributeEncode {
                        context: context.clone(),
                        reason,
                    })
                }
                other => SessionError::from_engine("set attribute", other),
            })
    }

    pub fn get_attribute(
        &mut self,
        object_type: &str,
        object_name: &str,
        attribute: &str,
        compress: bool,
    ) -> SessionResult<AttributeValue> {
        self.require_time_resolution()?;
        let (context, units) = self.attribute_context(object_type, object_name, attribute)?;
        self.read_attribute(&context, &units, compress)
    }

    pub fn set_attribute(
        &mut self,
        object_type: &str,
        object_name: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> SessionResult<()> {
        self.require_time_resolution()?;
        let (context, _) = self.attribute_context(object_type, object_name, attribute)?;
        self.write_attribute(&context, value)?;
        debug!(principal = %self.principal, session_id = self.id, attribute = %context, "Attribute set");
        Ok(())
    }

    /// Every set attribute of one instance.
    pub fn get_object(&mut self, object_type: &str, object_name: &str) -> SessionResult<ObjectInstance> {
        self.require_time_resolution()?;
        if !self.object_names(object_type)?.iter().any(|n| n == object_name) {
            return Err(SessionError::UnknownObject {
                object_type: object_type.to_string(),
                object_name: object_name.to_string(),
            });
        }
        self.read_object(object_type, object_name, false)
    }

    pub(crate) fn read_object(
        &self,
        object_type: &str,
        object_name: &str,
        compress: bool,
    ) -> SessionResult<ObjectInstance> {
        let specs = self
            .catalog
            .attributes(object_type)
            .ok_or_else(|| SessionError::UnknownObjectType(object_type.to_string()))?;
        let mut instance = ObjectInstance::default();
        for spec in specs {
            let (context, units) = self.attribute_context(object_type, object_name, &spec.name)?;
            let value = self.read_attribute(&context, &units, compress)?;
            if !value.is_null() {
                instance.attributes.insert(spec.name.clone(), value);
            }
        }
        Ok(instance)
    }

    /// Creates the instance if needed, writes every non-null attribute and
    /// returns the instance as stored.
    pub fn put_object(
        &mut self,
        object_type: &str,
        object_name: &str,
        instance: &ObjectInstance,
    ) -> SessionResult<ObjectInstance> {
        self.require_time_resolution()?;
        if self.simulation_started()? {
            return Err(SessionError::SimulationStarted);
        }
        self.ensure_object(object_type, object_name)?;
        for (attribute, value) in &instance.attributes {
            if value.is_null() {
                continue;
            }
            let (context, _) = self.attribute_context(object_type, object_name, attribute)?;
            self.write_attribute(&context, value)?;
        }
        self.read_object(object_type, object_name, false)
    }

    pub(crate) fn ensure_object(&mut self, object_type: &str, object_name: &str) -> SessionResult<()> {
        let engine = self.engine_mut()?;
        let existing = engine
            .object_names(object_type)
            .map_err(|e| SessionError::from_engine("list objects", e))?;
        if existing.iter().any(|n| n == object_name) {
            return Ok(());
        }
        engine
            .add_object(object_type, object_name)
            .map_err(|e| SessionError::from_engine("add object", e))?;
        debug!(
            principal = %self.principal,
            session_id = self.id,
            object_type,
            object_name,
            "Object created"
        );
        Ok(())
    }

    fn simulation_started(&self) -> SessionResult<bool> {
        Ok(self
            .engine()?
            .executed_commands()
            .iter()
            .any(|command| command.contains("start sim")))
    }

    // ================================================================
    // Topology
    // ================================================================

    pub fn connect(&mut self, connection: &Connection) -> SessionResult<()> {
        self.require_time_resolution()?;
        let (from, to) = (connection.from_ref(), connection.to_ref());
        self.engine_mut()?
            .connect(&from, &to, connection.relation_type)
            .map_err(|e| SessionError::from_engine("connect", e))?;
        debug!(
            principal = %self.principal,
            session_id = self.id,
            from = %from,
            to = %to,
            relation_type = %connection.relation_type,
            "Objects connected"
        );
        Ok(())
    }

    pub fn connections(&mut self) -> SessionResult<Vec<Connection>> {
        self.require_time_resolution()?;
        Ok(list_connections(self.engine()?)?)
    }

    // ================================================================
    // Commands
    // ================================================================

    pub fn execute_command(&mut self, command: &Command) -> SessionResult<CommandStatus> {
        self.require_time_resolution()?;
        let status = self
            .engine_mut()?
            .execute_command(&command.command, &command.options, &command.values)
            .map_err(|e| SessionError::EngineCommandFailed {
                command: command.command.clone(),
                message: e.to_string(),
            })?;
        if status {
            info!(principal = %self.principal, session_id = self.id, command = %command.command, "Command executed");
        } else {
            warn!(principal = %self.principal, session_id = self.id, command = %command.command, "Command reported failure");
        }
        Ok(CommandStatus::from_status(status))
    }
}

fn step_series(series: &TimeSeries) -> Series {
    let values = series.values.first().cloned().unwrap_or_default();
    Series::new(SeriesIndex::Time(series.timestamps.clone()), values)
}

fn step_series_back(series: Series) -> SessionResult<TimeSeries> {
    match series.index {
        SeriesIndex::Time(timestamps) => Ok(TimeSeries::single(timestamps, series.values)),
        SeriesIndex::Float(_) => Err(SessionError::InvalidRequest(
            "engine reported a time resolution that is not indexed by time".to_string(),
        )),
    }
}
