use chrono::{TimeDelta, TimeZone, Utc};
use pretty_assertions::assert_eq;
use restshop_codec::TypeCatalog;
use restshop_engine::{
    Engine, EngineConfig, EngineError, EngineFactory, EngineResult, MemoryEngineFactory,
    NativeTimeResolution,
};
use restshop_session::{LogForwarder, RegistryConfig, SessionError, SessionRegistry, lock_session};
use restshop_types::{ModelQuery, SessionInfo, TimeResolution};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn registry() -> SessionRegistry {
    registry_with(Arc::new(MemoryEngineFactory))
}

fn registry_with(factory: Arc<dyn EngineFactory>) -> SessionRegistry {
    let catalog = TypeCatalog::bootstrap(&MemoryEngineFactory).unwrap();
    SessionRegistry::new(
        factory,
        Arc::new(catalog),
        LogForwarder::disabled(),
        RegistryConfig::default(),
    )
}

fn horizon() -> TimeResolution {
    TimeResolution::new(
        Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2021, 5, 3, 0, 0, 0).unwrap(),
    )
}

/// Counts engine creations and fails once the limit is reached.
struct CountingFactory {
    created: AtomicUsize,
    limit: usize,
}

impl EngineFactory for CountingFactory {
    fn create(&self, config: &EngineConfig) -> EngineResult<Box<dyn Engine>> {
        if self.created.fetch_add(1, Ordering::SeqCst) >= self.limit {
            return Err(EngineError::Native("no licence seats left".into()));
        }
        MemoryEngineFactory.create(config)
    }
}

/// Hands out engines whose horizon was set before the session saw them.
struct PresetFactory;

impl EngineFactory for PresetFactory {
    fn create(&self, config: &EngineConfig) -> EngineResult<Box<dyn Engine>> {
        let mut engine = MemoryEngineFactory.create(config)?;
        engine.set_time_resolution(NativeTimeResolution {
            start: Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2021, 5, 3, 0, 0, 0).unwrap(),
            time_unit: "hour".to_string(),
            resolution: None,
        })?;
        Ok(engine)
    }
}

// ── Config defaults ─────────────────────────────────────────────

#[test]
fn registry_config_default() {
    let config = RegistryConfig::default();
    assert_eq!(config.principal_ttl, TimeDelta::minutes(60));
    assert_eq!(config.default_session_name, "unnamed");
    assert_eq!(config.default_log_file, "restshop.log");
}

// ── Principals ──────────────────────────────────────────────────

#[test]
fn unknown_principal_and_unknown_session_are_distinct() {
    let registry = registry();
    let err = registry.get_session("nobody", 1).unwrap_err();
    assert!(matches!(err, SessionError::UnknownPrincipal(ref p) if p == "nobody"));

    registry.add_principal("alice", None);
    let err = registry.get_session("alice", 7).unwrap_err();
    assert!(matches!(err, SessionError::UnknownSession { session_id: 7, .. }));
    assert_eq!(err.to_string(), "Session with id {7} not found");
}

#[test]
fn add_session_requires_a_principal() {
    let registry = registry();
    let err = registry.add_session("ghost", None, None).unwrap_err();
    assert!(matches!(err, SessionError::UnknownPrincipal(_)));
}

#[test]
fn re_registering_a_principal_drops_its_sessions() {
    let registry = registry();
    registry.add_principal("alice", None);
    registry.add_session("alice", None, None).unwrap();
    let handle = registry.get_session("alice", 1).unwrap();

    registry.add_principal("alice", None);

    assert!(lock_session(&handle).is_released());
    assert!(matches!(
        registry.get_session("alice", 1),
        Err(SessionError::UnknownSession { .. })
    ));
}

#[test]
fn touch_principal_registers_then_refreshes() {
    let registry = registry();
    let now = Utc::now();
    registry.touch_principal("alice", Some(now + TimeDelta::minutes(5)));
    registry.add_session("alice", None, None).unwrap();

    registry.touch_principal("alice", Some(now + TimeDelta::minutes(60)));

    assert_eq!(registry.sweep_expired_at(now + TimeDelta::minutes(10)), 0);
    assert_eq!(registry.list_sessions("alice").unwrap().len(), 1);
}

#[test]
fn remove_principal_releases_sessions() {
    let registry = registry();
    registry.add_principal("alice", None);
    registry.add_session("alice", None, None).unwrap();
    let handle = registry.get_session("alice", 1).unwrap();

    assert!(registry.remove_principal("alice"));
    assert!(!registry.remove_principal("alice"));
    assert!(!registry.has_principal("alice"));
    assert!(lock_session(&handle).is_released());
}

// ── Sessions ────────────────────────────────────────────────────

#[test]
fn session_ids_increase_and_are_never_reused() {
    let registry = registry();
    registry.add_principal("alice", None);
    assert_eq!(registry.add_session("alice", None, None).unwrap().session_id, 1);
    assert_eq!(registry.add_session("alice", None, None).unwrap().session_id, 2);

    assert!(registry.remove_session("alice", 2));
    assert_eq!(registry.add_session("alice", None, None).unwrap().session_id, 3);
}

#[test]
fn ids_are_scoped_per_principal() {
    let registry = registry();
    registry.add_principal("alice", None);
    registry.add_principal("bob", None);
    assert_eq!(registry.add_session("alice", None, None).unwrap().session_id, 1);
    assert_eq!(registry.add_session("bob", None, None).unwrap().session_id, 1);
}

#[test]
fn session_defaults_come_from_config() {
    let registry = registry();
    registry.add_principal("alice", None);
    let info = registry.add_session("alice", None, None).unwrap();
    assert_eq!(
        info,
        SessionInfo {
            session_id: 1,
            session_name: "unnamed".to_string(),
            log_file: "restshop.log".to_string(),
        }
    );

    let named = registry.add_session("alice", Some("planning"), Some("plan.log")).unwrap();
    assert_eq!(named.session_name, "planning");
    assert_eq!(named.log_file, "plan.log");
}

#[test]
fn remove_session_is_safe_to_repeat() {
    let registry = registry();
    registry.add_principal("alice", None);
    registry.add_session("alice", None, None).unwrap();
    let handle = registry.get_session("alice", 1).unwrap();

    assert!(registry.remove_session("alice", 1));
    assert!(!registry.remove_session("alice", 1));
    assert!(!registry.remove_session("nobody", 1));

    // A handle held across removal sees the session as gone.
    let mut session = lock_session(&handle);
    assert!(session.is_released());
    assert!(matches!(
        session.set_time_resolution(&horizon()),
        Err(SessionError::UnknownSession { session_id: 1, .. })
    ));
}

#[test]
fn list_sessions_in_id_order() {
    let registry = registry();
    registry.add_principal("alice", None);
    registry.add_session("alice", Some("a"), None).unwrap();
    registry.add_session("alice", Some("b"), None).unwrap();
    registry.add_session("alice", Some("c"), None).unwrap();
    registry.remove_session("alice", 2);

    let names: Vec<String> = registry
        .list_sessions("alice")
        .unwrap()
        .into_iter()
        .map(|s| s.session_name)
        .collect();
    assert_eq!(names, vec!["a", "c"]);
    assert!(matches!(
        registry.list_sessions("bob"),
        Err(SessionError::UnknownPrincipal(_))
    ));
}

#[test]
fn engine_creation_failure_surfaces_and_consumes_the_id() {
    let registry = registry_with(Arc::new(CountingFactory {
        created: AtomicUsize::new(0),
        limit: 1,
    }));
    registry.add_principal("alice", None);
    assert_eq!(registry.add_session("alice", None, None).unwrap().session_id, 1);

    let err = registry.add_session("alice", None, None).unwrap_err();
    assert!(err.to_string().contains("no licence seats left"), "{err}");
    assert!(matches!(
        &err,
        SessionError::EngineCommandFailed { command, .. } if command == "create engine"
    ));
    assert_eq!(registry.list_sessions("alice").unwrap().len(), 1);
}

// ── Time resolution gate ────────────────────────────────────────

#[test]
fn time_resolution_gate_opens_after_set() {
    let registry = registry();
    registry.add_principal("alice", None);
    registry.add_session("alice", None, None).unwrap();

    let err = registry.require_time_resolution_established("alice", 1).unwrap_err();
    assert!(matches!(err, SessionError::TimeResolutionNotSet));
    assert_eq!(
        err.to_string(),
        "First you must set the time_resolution of the session"
    );

    let handle = registry.get_session("alice", 1).unwrap();
    lock_session(&handle).set_time_resolution(&horizon()).unwrap();

    registry.require_time_resolution_established("alice", 1).unwrap();
    registry.require_time_resolution_established("alice", 1).unwrap();
}

#[test]
fn gate_accepts_a_horizon_set_outside_the_session() {
    let registry = registry_with(Arc::new(PresetFactory));
    registry.add_principal("alice", None);
    registry.add_session("alice", None, None).unwrap();

    registry.require_time_resolution_established("alice", 1).unwrap();

    let handle = registry.get_session("alice", 1).unwrap();
    let mut session = lock_session(&handle);
    let snapshot = session
        .get_model(&ModelQuery {
            include_time: true,
            ..ModelQuery::default()
        })
        .unwrap();
    let time = snapshot.time.unwrap();
    assert_eq!(time.start_time, Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap());
    assert_eq!(time.time_unit, "hour");
}

#[test]
fn gate_checks_principal_and_session_first() {
    let registry = registry();
    assert!(matches!(
        registry.require_time_resolution_established("nobody", 1),
        Err(SessionError::UnknownPrincipal(_))
    ));
    registry.add_principal("alice", None);
    assert!(matches!(
        registry.require_time_resolution_established("alice", 1),
        Err(SessionError::UnknownSession { .. })
    ));
}

#[test]
fn inverted_horizon_is_rejected() {
    let registry = registry();
    registry.add_principal("alice", None);
    registry.add_session("alice", None, None).unwrap();
    let handle = registry.get_session("alice", 1).unwrap();

    let mut inverted = horizon();
    std::mem::swap(&mut inverted.start_time, &mut inverted.end_time);
    let err = lock_session(&handle).set_time_resolution(&inverted).unwrap_err();
    assert!(matches!(err, SessionError::InvalidRequest(_)));
    assert_eq!(err.to_string(), "end_time must be strictly greater than start_time");
    assert!(matches!(
        registry.require_time_resolution_established("alice", 1),
        Err(SessionError::TimeResolutionNotSet)
    ));
}

// ── Expiry ──────────────────────────────────────────────────────

#[test]
fn sweep_removes_only_expired_principals() {
    let registry = registry();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    registry.add_principal("stale", Some(now - TimeDelta::minutes(1)));
    registry.add_principal("fresh", Some(now + TimeDelta::minutes(30)));
    registry.add_principal("forever", None);
    registry.add_session("stale", None, None).unwrap();
    let stale = registry.get_session("stale", 1).unwrap();

    assert_eq!(registry.sweep_expired_at(now), 1);

    assert!(!registry.has_principal("stale"));
    assert!(registry.has_principal("fresh"));
    assert!(registry.has_principal("forever"));
    assert!(lock_session(&stale).is_released());
    assert_eq!(registry.sweep_expired_at(now), 0);
}

#[test]
fn detaching_expired_principals_leaves_busy_sessions_alone() {
    let registry = registry();
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    registry.add_principal("stale", Some(now - TimeDelta::minutes(1)));
    registry.add_principal("idle", Some(now - TimeDelta::minutes(1)));
    registry.add_session("stale", None, None).unwrap();
    let handle = registry.get_session("stale", 1).unwrap();

    // Held on this thread: detaching must not wait for it.
    let busy = lock_session(&handle);
    let mut expired = registry.detach_expired_at(now);
    drop(busy);

    expired.sort_by(|a, b| a.principal().cmp(b.principal()));
    let names: Vec<&str> = expired.iter().map(|user| user.principal()).collect();
    assert_eq!(names, vec!["idle", "stale"]);
    assert!(expired[0].is_empty());
    assert!(!registry.has_principal("stale"));
    assert!(matches!(
        registry.get_session("stale", 1),
        Err(SessionError::UnknownPrincipal(_))
    ));
    assert!(!lock_session(&handle).is_released());

    expired.into_iter().for_each(|user| user.release_sessions());
    assert!(lock_session(&handle).is_released());
}
