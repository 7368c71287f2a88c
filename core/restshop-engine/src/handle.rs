//! The contract every engine backend implements.

use crate::error::EngineResult;
use crate::native::{NativeTimeResolution, NativeValue};
use restshop_types::{ObjectRef, RelationDirection, RelationType};
use std::sync::Arc;

/// Receives `(message, level, id)` for every log event of an engine.
pub type LogCallback = Arc<dyn Fn(&str, &str, &str) + Send + Sync>;

/// Self-description of one attribute, as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeInfo {
    /// Legacy type tag (`double`, `txy`, `xy_array`, ...).
    pub datatype: String,
    pub is_input: bool,
    pub is_output: bool,
    pub x_unit: Option<String>,
    pub y_unit: Option<String>,
    pub license_name: Option<String>,
    pub full_name: Option<String>,
    pub data_func_name: Option<String>,
    pub description: Option<String>,
    pub documentation_url: Option<String>,
    pub example_url_prefix: Option<String>,
    pub example: Option<String>,
}

/// Parameters for a new engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub name: String,
    /// Identifier passed to the log callback.
    pub id: String,
    pub log_file: String,
    pub silent: bool,
}

/// One stateful engine instance.
///
/// Calls are blocking and must not overlap; callers serialize access.
/// Dropping the handle releases the instance.
pub trait Engine: Send {
    /// Object types in the engine's own order.
    fn object_types(&self) -> Vec<String>;

    /// Instance names of one type, in creation order.
    fn object_names(&self, object_type: &str) -> EngineResult<Vec<String>>;

    fn add_object(&mut self, object_type: &str, object_name: &str) -> EngineResult<()>;

    fn attribute_names(&self, object_type: &str) -> EngineResult<Vec<String>>;

    fn attribute_info(&self, object_type: &str, attribute: &str) -> EngineResult<AttributeInfo>;

    fn get_attribute(
        &self,
        object_type: &str,
        object_name: &str,
        attribute: &str,
    ) -> EngineResult<NativeValue>;

    fn set_attribute(
        &mut self,
        object_type: &str,
        object_name: &str,
        attribute: &str,
        value: NativeValue,
    ) -> EngineResult<()>;

    fn set_time_resolution(&mut self, resolution: NativeTimeResolution) -> EngineResult<()>;

    /// Fails until a time resolution has been set.
    fn time_resolution(&self) -> EngineResult<NativeTimeResolution>;

    /// Names of the commands the interpreter accepts.
    fn commands(&self) -> Vec<String>;

    /// Runs one command. `Ok(false)` means the engine rejected it.
    fn execute_command(
        &mut self,
        command: &str,
        options: &[String],
        values: &[String],
    ) -> EngineResult<bool>;

    /// Command lines executed so far, oldest first.
    fn executed_commands(&self) -> Vec<String>;

    /// Objects related to `object` in the given direction with the given
    /// relation type.
    fn related_objects(
        &self,
        object: &ObjectRef,
        direction: RelationDirection,
        relation_type: RelationType,
    ) -> EngineResult<Vec<ObjectRef>>;

    fn connect(
        &mut self,
        from: &ObjectRef,
        to: &ObjectRef,
        relation_type: RelationType,
    ) -> EngineResult<()>;

    fn register_log_callback(&mut self, callback: LogCallback);
}

/// Creates engine instances.
pub trait EngineFactory: Send + Sync {
    fn create(&self, config: &EngineConfig) -> EngineResult<Box<dyn Engine>>;
}
