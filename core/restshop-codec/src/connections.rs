//! Flattens the engine's relation index into an edge list.

use crate::error::{CodecError, CodecResult};
use restshop_engine::Engine;
use restshop_types::{Connection, ObjectRef, RelationDirection, RelationType};

/// Lists every relation the engine reports.
///
/// Every instance of every object type is queried once per direction and
/// relation type. Results are forwarded as reported: a pair that shows up
/// under `both` and again under `input` or `output` appears twice. Any
/// failing query aborts the whole listing.
pub fn list_connections(engine: &dyn Engine) -> CodecResult<Vec<Connection>> {
    let mut connections = Vec::new();
    for object_type in engine.object_types() {
        let names = engine
            .object_names(&object_type)
            .map_err(|source| CodecError::ConnectionEnumeration {
                object: object_type.clone(),
                detail: "listing instances".to_string(),
                source,
            })?;
        for object_name in names {
            let object = ObjectRef::new(object_type.as_str(), object_name);
            for direction in RelationDirection::ALL {
                for relation_type in RelationType::ALL {
                    let related = engine
                        .related_objects(&object, direction, relation_type)
                        .map_err(|source| CodecError::ConnectionEnumeration {
                            object: object.to_string(),
                            detail: format!("direction {direction}, relation type {relation_type}"),
                            source,
                        })?;
                    connections.extend(related.iter().map(|other| {
                        Connection::new(&object, other).with_relation(relation_type, direction)
                    }));
                }
            }
        }
    }
    Ok(connections)
}
