//! Attribute taxonomy and per-type metadata, discovered once from an engine.

use crate::error::{CodecError, CodecResult};
use restshop_engine::{AttributeInfo, Engine, EngineConfig, EngineFactory};
use restshop_types::{AttributeDescriptor, AttributeTypeTag, ObjectAttribute, ObjectTypeInfo};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Principal under which the catalog's own engine instance is created. It
/// is never registered with a session registry.
pub const CATALOG_PRINCIPAL: &str = "__catalog__";

/// Maps a legacy engine type tag onto the external taxonomy.
pub fn classify(legacy: &str) -> CodecResult<AttributeTypeTag> {
    Ok(match legacy {
        "bool" => AttributeTypeTag::Boolean,
        "int" => AttributeTypeTag::Integer,
        "double" => AttributeTypeTag::Float,
        "str" | "string" => AttributeTypeTag::String,
        "datetime" => AttributeTypeTag::DateTime,
        "double_array" => AttributeTypeTag::FloatArray,
        "int_array" => AttributeTypeTag::IntegerArray,
        "string_array" => AttributeTypeTag::StringArray,
        "xy" => AttributeTypeTag::Curve,
        "xy_array" | "xyn" => AttributeTypeTag::FloatCurveCollection,
        "xyt" => AttributeTypeTag::TimeCurveCollection,
        "txy" => AttributeTypeTag::TimeSeries,
        other => {
            return Err(CodecError::UnknownAttributeType {
                legacy: other.to_string(),
            });
        }
    })
}

/// One attribute of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub name: String,
    pub tag: AttributeTypeTag,
    pub info: AttributeInfo,
}

impl AttributeSpec {
    pub fn descriptor(&self, verbose: bool) -> AttributeDescriptor {
        if !verbose {
            return AttributeDescriptor::Tag(self.tag);
        }
        AttributeDescriptor::Detailed(Box::new(ObjectAttribute {
            attribute_name: self.name.clone(),
            attribute_type: self.tag,
            is_input: self.info.is_input,
            is_output: self.info.is_output,
            legacy_datatype: self.info.datatype.clone(),
            x_unit: self.info.x_unit.clone(),
            y_unit: self.info.y_unit.clone(),
            license_name: self.info.license_name.clone(),
            full_name: self.info.full_name.clone(),
            data_func_name: self.info.data_func_name.clone(),
            description: self.info.description.clone(),
            documentation_url: self.info.documentation_url.clone(),
            example_url_prefix: self.info.example_url_prefix.clone(),
            example: self.info.example.clone(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ObjectTypeSpec {
    name: String,
    attributes: Vec<AttributeSpec>,
}

/// Read-only metadata shared by every session.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCatalog {
    object_types: Vec<ObjectTypeSpec>,
    commands: Vec<String>,
}

impl TypeCatalog {
    /// Creates a throwaway engine instance and reads the catalog from it.
    ///
    /// Any failure here is a startup failure; there is no degraded mode.
    pub fn bootstrap(factory: &dyn EngineFactory) -> CodecResult<Self> {
        let config = EngineConfig {
            name: "catalog".to_string(),
            id: format!("{CATALOG_PRINCIPAL}:catalog"),
            log_file: String::new(),
            silent: true,
        };
        let engine = factory.create(&config)?;
        let catalog = Self::from_engine(engine.as_ref())?;
        info!(
            object_types = catalog.object_types.len(),
            commands = catalog.commands.len(),
            "Type catalog loaded"
        );
        Ok(catalog)
    }

    /// Reads the catalog from a live engine instance.
    pub fn from_engine(engine: &dyn Engine) -> CodecResult<Self> {
        let mut object_types = Vec::new();
        for name in engine.object_types() {
            let mut attributes = Vec::new();
            for attribute in engine.attribute_names(&name)? {
                let info = engine.attribute_info(&name, &attribute)?;
                let tag = classify(&info.datatype)?;
                attributes.push(AttributeSpec {
                    name: attribute,
                    tag,
                    info,
                });
            }
            debug!(object_type = %name, attributes = attributes.len(), "Object type catalogued");
            object_types.push(ObjectTypeSpec { name, attributes });
        }
        Ok(Self {
            object_types,
            commands: order_commands(engine.commands()),
        })
    }

    pub fn object_types(&self) -> Vec<String> {
        self.object_types.iter().map(|t| t.name.clone()).collect()
    }

    pub fn has_object_type(&self, object_type: &str) -> bool {
        self.object_type(object_type).is_some()
    }

    /// Command names with `start*` first, then `set*`, then the rest.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn attributes(&self, object_type: &str) -> Option<&[AttributeSpec]> {
        self.object_type(object_type).map(|t| t.attributes.as_slice())
    }

    pub fn attribute(&self, object_type: &str, attribute: &str) -> Option<&AttributeSpec> {
        self.attributes(object_type)?
            .iter()
            .find(|a| a.name == attribute)
    }

    /// Attribute listing of one object type, with the given instance names.
    pub fn object_type_info(
        &self,
        object_type: &str,
        instances: Vec<String>,
        verbose: bool,
    ) -> Option<ObjectTypeInfo> {
        let spec = self.object_type(object_type)?;
        let attributes: BTreeMap<String, AttributeDescriptor> = spec
            .attributes
            .iter()
            .map(|a| (a.name.clone(), a.descriptor(verbose)))
            .collect();
        Some(ObjectTypeInfo {
            object_type: spec.name.clone(),
            instances,
            attributes,
        })
    }

    fn object_type(&self, object_type: &str) -> Option<&ObjectTypeSpec> {
        self.object_types.iter().find(|t| t.name == object_type)
    }
}

fn order_commands(commands: Vec<String>) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::with_capacity(commands.len());
    let groups = [
        commands.iter().filter(|c| c.starts_with("start")).collect::<Vec<_>>(),
        commands.iter().filter(|c| c.starts_with("set")).collect(),
        commands.iter().collect(),
    ];
    for command in groups.into_iter().flatten() {
        if !ordered.contains(command) {
            ordered.push(command.clone());
        }
    }
    ordered
}
