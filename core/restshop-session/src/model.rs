//! Bulk model reads and writes on top of [`EngineSession`].

use crate::error::{SessionError, SessionResult};
use crate::session::EngineSession;
use restshop_codec::AttributeSpec;
use restshop_types::{CommandStatus, ModelObjects, ModelQuery, ModelSnapshot, ObjectAttributes};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Whether a bulk read includes one attribute.
///
/// The datatype filter only narrows output attributes; input attributes
/// pass whenever inputs are wanted.
pub fn selects(query: &ModelQuery, spec: &AttributeSpec) -> bool {
    if query.attribute_name.as_ref().is_some_and(|name| *name != spec.name) {
        return false;
    }
    let datatype_matches = query
        .datatype
        .as_ref()
        .is_none_or(|datatype| *datatype == spec.info.datatype);
    (spec.info.is_input && query.is_input)
        || (spec.info.is_output && query.is_output && datatype_matches)
}

impl EngineSession {
    /// Reads the filtered model, optionally with the time resolution and
    /// the connection list.
    pub fn get_model(&mut self, query: &ModelQuery) -> SessionResult<ModelSnapshot> {
        self.require_time_resolution()?;
        let catalog = Arc::clone(&self.catalog);

        let object_types = match &query.object_type {
            Some(object_type) if !catalog.has_object_type(object_type) => {
                return Err(SessionError::UnknownObjectType(object_type.clone()));
            }
            Some(object_type) => vec![object_type.clone()],
            None => catalog.object_types(),
        };
        if let Some(attribute) = &query.attribute_name {
            for object_type in &object_types {
                if catalog.attribute(object_type, attribute).is_none() {
                    return Err(SessionError::UnknownAttribute {
                        object_type: object_type.clone(),
                        attribute: attribute.clone(),
                    });
                }
            }
        }

        let mut model = ModelObjects::new();
        for object_type in object_types {
            let object_names = match &query.object_name {
                Some(object_name) => vec![object_name.clone()],
                None => self.object_names(&object_type)?,
            };
            if object_names.is_empty() {
                continue;
            }
            let specs: Vec<&AttributeSpec> = catalog
                .attributes(&object_type)
                .unwrap_or_default()
                .iter()
                .filter(|spec| selects(query, spec))
                .collect();

            let mut objects = BTreeMap::new();
            for object_name in object_names {
                let mut attributes = ObjectAttributes::new();
                for spec in &specs {
                    let (context, units) =
                        self.attribute_context(&object_type, &object_name, &spec.name)?;
                    let value = self.read_attribute(&context, &units, query.compress_txy)?;
                    if !value.is_null() {
                        attributes.insert(spec.name.clone(), value);
                    }
                }
                objects.insert(object_name, attributes);
            }
            model.insert(object_type, objects);
        }

        let time = if query.include_time {
            Some(self.time_resolution()?)
        } else {
            None
        };
        let connections = if query.include_connections {
            Some(self.connections()?)
        } else {
            None
        };
        Ok(ModelSnapshot {
            time,
            model: Some(model),
            connections,
            commands: None,
        })
    }

    /// Applies time, objects, connections and commands in that order.
    ///
    /// Only the first command is executed; its status is returned.
    pub fn apply_model(&mut self, snapshot: &ModelSnapshot) -> SessionResult<Option<CommandStatus>> {
        if let Some(time) = &snapshot.time {
            self.set_time_resolution(time)?;
        }
        if snapshot.model.is_none() && snapshot.connections.is_none() && snapshot.commands.is_none() {
            return Ok(None);
        }
        self.require_time_resolution()?;

        if let Some(model) = &snapshot.model {
            for (object_type, objects) in model {
                if !self.catalog.has_object_type(object_type) {
                    return Err(SessionError::UnknownObjectType(object_type.clone()));
                }
                for (object_name, attributes) in objects {
                    self.ensure_object(object_type, object_name)?;
                    for (attribute, value) in attributes {
                        if value.is_null() {
                            continue;
                        }
                        let (context, _) = self.attribute_context(object_type, object_name, attribute)?;
                        self.write_attribute(&context, value)?;
                    }
                }
                debug!(
                    principal = %self.principal(),
                    session_id = self.id(),
                    object_type = %object_type,
                    objects = objects.len(),
                    "Model objects applied"
                );
            }
        }

        if let Some(connections) = &snapshot.connections {
            for connection in connections {
                self.connect(connection)?;
            }
        }

        match snapshot.commands.as_deref() {
            Some([first, ..]) => Ok(Some(self.execute_command(first)?)),
            _ => Ok(None),
        }
    }
}
