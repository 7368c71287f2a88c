use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use restshop_codec::TypeCatalog;
use restshop_engine::MemoryEngineFactory;
use restshop_session::{
    LogForwarder, RegistryConfig, SessionError, SessionHandle, SessionRegistry, lock_session,
};
use restshop_types::{
    AttributeValue, Command, CommandStatus, Connection, Curve, ModelQuery, ModelSnapshot,
    ObjectInstance, ObjectRef, RelationType, TimeResolution, TimeSeries,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap()
}

fn horizon() -> TimeResolution {
    TimeResolution::new(start(), Utc.with_ymd_and_hms(2021, 5, 3, 0, 0, 0).unwrap())
}

fn registry() -> SessionRegistry {
    let catalog = TypeCatalog::bootstrap(&MemoryEngineFactory).unwrap();
    SessionRegistry::new(
        Arc::new(MemoryEngineFactory),
        Arc::new(catalog),
        LogForwarder::disabled(),
        RegistryConfig::default(),
    )
}

/// A registry holding principal "P" with one session whose horizon is set.
fn ready_session() -> (SessionRegistry, SessionHandle) {
    let registry = registry();
    registry.add_principal("P", None);
    registry.add_session("P", None, None).unwrap();
    let handle = registry.get_session("P", 1).unwrap();
    lock_session(&handle).set_time_resolution(&horizon()).unwrap();
    (registry, handle)
}

fn instance(attributes: Vec<(&str, AttributeValue)>) -> ObjectInstance {
    ObjectInstance {
        attributes: attributes
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    }
}

// ── End to end ──────────────────────────────────────────────────

#[test]
fn curve_round_trip_after_time_resolution() {
    let registry = registry();
    registry.add_principal("P", None);
    let info = registry.add_session("P", None, None).unwrap();
    assert_eq!(info.session_id, 1);

    let handle = registry.get_session("P", 1).unwrap();
    let mut session = lock_session(&handle);

    let err = session.get_model(&ModelQuery::default()).unwrap_err();
    assert!(matches!(err, SessionError::TimeResolutionNotSet));

    session.set_time_resolution(&horizon()).unwrap();
    session.get_model(&ModelQuery::default()).unwrap();

    session
        .put_object("reservoir", "Reservoir1", &ObjectInstance::default())
        .unwrap();
    let curve = Curve::new(vec![10.0, 20.0, 30.0], vec![42.0, 43.0, 45.0]);
    session
        .set_attribute("reservoir", "Reservoir1", "vol_head", &AttributeValue::Curve(curve))
        .unwrap();

    let AttributeValue::Curve(back) = session
        .get_attribute("reservoir", "Reservoir1", "vol_head", false)
        .unwrap()
    else {
        panic!("expected a curve");
    };
    assert_eq!(back.x_values, vec![10.0, 20.0, 30.0]);
    assert_eq!(back.y_values, vec![42.0, 43.0, 45.0]);
    assert_eq!(back.x_unit.as_deref(), Some("Mm3"));
}

// ── Gate ────────────────────────────────────────────────────────

#[test]
fn every_model_operation_waits_for_the_horizon() {
    let registry = registry();
    registry.add_principal("P", None);
    registry.add_session("P", None, None).unwrap();
    let handle = registry.get_session("P", 1).unwrap();
    let mut session = lock_session(&handle);

    let gated = [
        session.get_attribute("reservoir", "R", "max_vol", false).map(|_| ()),
        session.set_attribute("reservoir", "R", "max_vol", &AttributeValue::Float(1.0)),
        session.get_object("reservoir", "R").map(|_| ()),
        session.put_object("reservoir", "R", &ObjectInstance::default()).map(|_| ()),
        session.connections().map(|_| ()),
        session.execute_command(&Command::new("print model")).map(|_| ()),
        session.time_resolution().map(|_| ()),
    ];
    for result in gated {
        assert!(matches!(result, Err(SessionError::TimeResolutionNotSet)));
    }

    // Metadata is readable before the horizon is set.
    assert!(session.object_types().unwrap().contains(&"reservoir".to_string()));
    assert_eq!(session.commands()[0], "start sim");
    session.object_type_info("plant", false).unwrap();
}

// ── Time resolution ─────────────────────────────────────────────

#[test]
fn time_resolution_reads_back() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);
    let mut resolution = horizon();
    resolution.time_unit = "minute".to_string();
    resolution.time_resolution = Some(TimeSeries::single(vec![start()], vec![15.0]));
    session.set_time_resolution(&resolution).unwrap();

    assert_eq!(session.time_resolution().unwrap(), resolution);
}

#[test]
fn unknown_time_unit_is_an_invalid_request() {
    let (_registry, handle) = ready_session();
    let mut resolution = horizon();
    resolution.time_unit = "fortnight".to_string();
    let err = lock_session(&handle).set_time_resolution(&resolution).unwrap_err();
    assert!(matches!(err, SessionError::InvalidRequest(_)), "{err}");
}

// ── Objects ─────────────────────────────────────────────────────

#[test]
fn put_object_creates_and_returns_instance() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);
    let written = instance(vec![
        ("max_vol", AttributeValue::Integer(12)),
        ("lrl", AttributeValue::Float(90.0)),
        ("hrl", AttributeValue::Null),
    ]);

    let stored = session.put_object("reservoir", "Reservoir1", &written).unwrap();

    assert_eq!(
        stored.attributes,
        BTreeMap::from([
            ("lrl".to_string(), AttributeValue::Float(90.0)),
            ("max_vol".to_string(), AttributeValue::Float(12.0)),
        ])
    );
    assert_eq!(session.get_object("reservoir", "Reservoir1").unwrap(), stored);
    assert_eq!(session.object_names("reservoir").unwrap(), vec!["Reservoir1"]);
}

#[test]
fn bare_number_on_time_series_lands_on_start_time() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);
    session
        .put_object(
            "reservoir",
            "Reservoir1",
            &instance(vec![("inflow", AttributeValue::Float(101.0))]),
        )
        .unwrap();

    let AttributeValue::TimeSeries(series) = session
        .get_attribute("reservoir", "Reservoir1", "inflow", false)
        .unwrap()
    else {
        panic!("expected a time series");
    };
    assert_eq!(series.timestamps, vec![start()]);
    assert_eq!(series.values, vec![vec![101.0]]);
}

#[test]
fn unknown_names_are_reported_precisely() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);

    assert!(matches!(
        session.get_object("reservoir", "Nowhere"),
        Err(SessionError::UnknownObject { .. })
    ));
    assert!(matches!(
        session.put_object("windmill", "W1", &ObjectInstance::default()),
        Err(SessionError::UnknownObjectType(_))
    ));
    let err = session
        .put_object(
            "reservoir",
            "Reservoir1",
            &instance(vec![("colour", AttributeValue::Text("blue".into()))]),
        )
        .unwrap_err();
    assert!(matches!(err, SessionError::UnknownAttribute { ref attribute, .. } if attribute == "colour"));
}

#[test]
fn encode_failure_names_the_attribute() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);
    session
        .put_object("reservoir", "Reservoir1", &ObjectInstance::default())
        .unwrap();

    let err = session
        .set_attribute(
            "reservoir",
            "Reservoir1",
            "vol_head",
            &AttributeValue::Text("steep".into()),
        )
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("reservoir/Reservoir1.vol_head"), "{message}");
}

#[test]
fn objects_are_frozen_once_simulation_started() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);
    session
        .put_object("reservoir", "Reservoir1", &ObjectInstance::default())
        .unwrap();

    let status = session
        .execute_command(&Command::new("start sim").with_values(vec!["3".into()]))
        .unwrap();
    assert_eq!(status, CommandStatus::from_status(true));

    let err = session
        .put_object("reservoir", "Reservoir1", &ObjectInstance::default())
        .unwrap_err();
    assert!(matches!(err, SessionError::SimulationStarted));
}

// ── Commands ────────────────────────────────────────────────────

#[test]
fn command_status_reflects_engine_answer() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);

    let ok = session
        .execute_command(&Command::new("set time_delay_unit").with_values(vec!["minute".into()]))
        .unwrap();
    assert_eq!(ok.message, "ok");
    assert!(ok.status);

    let rejected = session.execute_command(&Command::new("launch rockets")).unwrap();
    assert_eq!(rejected.message, "something went wrong ...");
    assert!(!rejected.status);

    assert_eq!(
        session.executed_commands().unwrap(),
        vec!["set time_delay_unit minute"]
    );
}

// ── Connections ─────────────────────────────────────────────────

#[test]
fn connect_and_list() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);
    assert_eq!(session.connections().unwrap(), Vec::<Connection>::new());

    session.put_object("reservoir", "Reservoir1", &ObjectInstance::default()).unwrap();
    session.put_object("plant", "Plant1", &ObjectInstance::default()).unwrap();
    let connection = Connection::new(
        &ObjectRef::new("reservoir", "Reservoir1"),
        &ObjectRef::new("plant", "Plant1"),
    );
    session.connect(&connection).unwrap();

    let connections = session.connections().unwrap();
    assert_eq!(connections.len(), 4);
    assert!(connections.iter().all(|c| c.relation_type == RelationType::Default));
}

#[test]
fn connecting_missing_objects_fails() {
    let (_registry, handle) = ready_session();
    let connection = Connection::new(
        &ObjectRef::new("reservoir", "Ghost"),
        &ObjectRef::new("plant", "Plant1"),
    );
    let err = lock_session(&handle).connect(&connection).unwrap_err();
    assert!(matches!(err, SessionError::UnknownObject { .. }), "{err}");
}

// ── Bulk model ──────────────────────────────────────────────────

#[test]
fn get_model_filters_inputs_and_outputs() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);
    session
        .put_object(
            "reservoir",
            "Reservoir1",
            &instance(vec![("max_vol", AttributeValue::Float(12.0))]),
        )
        .unwrap();

    // Outputs only: the reservoir is listed but nothing is set on it.
    let outputs = session.get_model(&ModelQuery::default()).unwrap();
    let model = outputs.model.unwrap();
    assert!(model["reservoir"]["Reservoir1"].is_empty());
    assert!(outputs.time.is_none());
    assert!(outputs.connections.is_none());

    let inputs = session
        .get_model(&ModelQuery {
            object_type: Some("reservoir".into()),
            is_input: true,
            include_time: true,
            include_connections: true,
            ..ModelQuery::default()
        })
        .unwrap();
    let model = inputs.model.unwrap();
    assert_eq!(model.keys().collect::<Vec<_>>(), vec!["reservoir"]);
    assert_eq!(
        model["reservoir"]["Reservoir1"]["max_vol"],
        AttributeValue::Float(12.0)
    );
    assert_eq!(inputs.time.unwrap().start_time, start());
    assert_eq!(inputs.connections.unwrap(), Vec::<Connection>::new());
}

#[test]
fn get_model_skips_types_without_instances() {
    let (_registry, handle) = ready_session();
    let model = lock_session(&handle)
        .get_model(&ModelQuery {
            is_input: true,
            ..ModelQuery::default()
        })
        .unwrap()
        .model
        .unwrap();
    assert_eq!(model.keys().collect::<Vec<_>>(), vec!["global_settings"]);
}

#[test]
fn get_model_rejects_unknown_filters() {
    let (_registry, handle) = ready_session();
    let mut session = lock_session(&handle);
    assert!(matches!(
        session.get_model(&ModelQuery {
            object_type: Some("windmill".into()),
            ..ModelQuery::default()
        }),
        Err(SessionError::UnknownObjectType(_))
    ));
    assert!(matches!(
        session.get_model(&ModelQuery {
            object_type: Some("plant".into()),
            attribute_name: Some("colour".into()),
            ..ModelQuery::default()
        }),
        Err(SessionError::UnknownAttribute { .. })
    ));
}

#[test]
fn apply_model_bootstraps_a_fresh_session() {
    let registry = registry();
    registry.add_principal("P", None);
    registry.add_session("P", None, None).unwrap();
    let handle = registry.get_session("P", 1).unwrap();
    let mut session = lock_session(&handle);

    let snapshot: ModelSnapshot = serde_json::from_value(serde_json::json!({
        "time": {
            "start_time": "2021-05-02T00:00:00Z",
            "end_time": "2021-05-03T00:00:00Z"
        },
        "model": {
            "reservoir": {
                "Reservoir1": {
                    "max_vol": 12,
                    "vol_head": {"x_values": [0, 12, 14], "y_values": [90, 100, 101]}
                }
            },
            "plant": {"Plant1": {"outlet_line": 40}}
        },
        "connections": [
            {"from": "Reservoir1", "from_type": "reservoir", "to": "Plant1", "to_type": "plant"}
        ],
        "commands": [
            {"command": "set time_delay_unit", "values": ["hour"]},
            {"command": "start sim", "values": ["3"]}
        ]
    }))
    .unwrap();

    let status = session.apply_model(&snapshot).unwrap();

    assert_eq!(status, Some(CommandStatus::from_status(true)));
    assert_eq!(
        session.time_resolution().unwrap().start_time,
        Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap()
    );
    assert_eq!(session.object_names("plant").unwrap(), vec!["Plant1"]);
    assert_eq!(session.connections().unwrap().len(), 4);
    // Only the first command runs.
    assert_eq!(
        session.executed_commands().unwrap(),
        vec!["set time_delay_unit hour"]
    );
}

#[test]
fn apply_model_without_horizon_is_gated() {
    let registry = registry();
    registry.add_principal("P", None);
    registry.add_session("P", None, None).unwrap();
    let handle = registry.get_session("P", 1).unwrap();
    let snapshot = ModelSnapshot {
        commands: Some(vec![Command::new("print model")]),
        ..ModelSnapshot::default()
    };
    assert!(matches!(
        lock_session(&handle).apply_model(&snapshot),
        Err(SessionError::TimeResolutionNotSet)
    ));
}
