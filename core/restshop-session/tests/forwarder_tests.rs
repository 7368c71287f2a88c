use pretty_assertions::assert_eq;
use restshop_codec::TypeCatalog;
use restshop_engine::MemoryEngineFactory;
use restshop_session::{LogForwarder, RegistryConfig, SessionError, SessionRegistry, lock_session};
use restshop_types::{Command, LogMessage};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn received_messages(server: &MockServer, at_least: usize) -> Vec<LogMessage> {
    for _ in 0..100 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.len() >= at_least {
            return requests
                .iter()
                .map(|r| r.body_json::<LogMessage>().unwrap())
                .collect();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("collector did not receive {at_least} messages");
}

// ── Endpoint ────────────────────────────────────────────────────

#[test]
fn disabled_forwarder_still_tracks_endpoint() {
    let forwarder = LogForwarder::disabled();
    assert_eq!(forwarder.endpoint(), None);
    forwarder.set_endpoint("http://collector/log");
    assert_eq!(forwarder.endpoint().as_deref(), Some("http://collector/log"));

    // Dropped silently.
    forwarder.forward(LogMessage {
        level: "INFO".into(),
        message: "ignored".into(),
        id: "P:unnamed".into(),
    });
}

// ── ping ────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_posts_connection_greeting() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .and(body_json(serde_json::json!({
            "level": "INFO",
            "message": "Connection established",
            "id": "planning"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let forwarder = LogForwarder::disabled();
    forwarder
        .ping(&format!("{}/log", server.uri()), "planning")
        .await
        .unwrap();
}

#[tokio::test]
async fn ping_tolerates_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    LogForwarder::disabled().ping(&server.uri(), "x").await.unwrap();
}

#[tokio::test]
async fn ping_fails_when_unreachable() {
    let err = LogForwarder::disabled()
        .ping("http://127.0.0.1:1/log", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::LogEndpointUnreachable { ref endpoint, .. } if endpoint == "http://127.0.0.1:1/log"));
}

// ── Forwarding ──────────────────────────────────────────────────

#[tokio::test]
async fn engine_events_reach_the_collector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let forwarder = LogForwarder::spawn(Some(format!("{}/log", server.uri())));
    let catalog = TypeCatalog::bootstrap(&MemoryEngineFactory).unwrap();
    let registry = SessionRegistry::new(
        Arc::new(MemoryEngineFactory),
        Arc::new(catalog),
        forwarder,
        RegistryConfig::default(),
    );
    registry.add_principal("P", None);
    registry.add_session("P", Some("planning"), None).unwrap();
    {
        let handle = registry.get_session("P", 1).unwrap();
        let mut session = lock_session(&handle);
        session
            .set_time_resolution(&restshop_types::TimeResolution::new(
                "2021-05-02T00:00:00Z".parse().unwrap(),
                "2021-05-03T00:00:00Z".parse().unwrap(),
            ))
            .unwrap();
        session.execute_command(&Command::new("print model")).unwrap();
    }

    let messages = received_messages(&server, 1).await;
    let executed = messages
        .iter()
        .find(|m| m.message.contains("print model"))
        .expect("command event forwarded");
    assert_eq!(executed.level, "INFO");
    assert_eq!(executed.id, "P:planning");
}

#[tokio::test]
async fn collector_failures_are_swallowed() {
    let failing = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&failing)
        .await;
    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&healthy)
        .await;

    let forwarder = LogForwarder::spawn(Some(failing.uri()));
    let event = |message: &str| LogMessage {
        level: "WARNING".into(),
        message: message.into(),
        id: "P:unnamed".into(),
    };
    forwarder.forward(event("first"));
    received_messages(&failing, 1).await;

    forwarder.set_endpoint(healthy.uri());
    forwarder.forward(event("second"));
    let messages = received_messages(&healthy, 1).await;
    assert_eq!(messages, vec![event("second")]);
}
