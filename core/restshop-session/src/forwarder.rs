//! Fire-and-forget forwarding of engine log events to an HTTP collector.

use crate::error::{SessionError, SessionResult};
use reqwest::Client;
use restshop_engine::LogCallback;
use restshop_types::LogMessage;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared by every session. Cloning yields another handle onto the same
/// queue and endpoint.
#[derive(Clone)]
pub struct LogForwarder {
    endpoint: Arc<RwLock<Option<String>>>,
    sender: Option<mpsc::UnboundedSender<LogMessage>>,
    client: Client,
}

impl LogForwarder {
    /// A forwarder that drops every event. Endpoint changes are still
    /// recorded.
    pub fn disabled() -> Self {
        Self {
            endpoint: Arc::new(RwLock::new(None)),
            sender: None,
            client: http_client(),
        }
    }

    /// Starts the drain task on the current tokio runtime.
    pub fn spawn(endpoint: Option<String>) -> Self {
        let client = http_client();
        let endpoint = Arc::new(RwLock::new(endpoint));
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(drain(receiver, client.clone(), Arc::clone(&endpoint)));
        Self {
            endpoint,
            sender: Some(sender),
            client,
        }
    }

    pub fn set_endpoint(&self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        debug!(endpoint = %endpoint, "Log endpoint changed");
        *self.endpoint.write().unwrap_or_else(PoisonError::into_inner) = Some(endpoint);
    }

    pub fn endpoint(&self) -> Option<String> {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Queues one event. Never blocks.
    pub fn forward(&self, message: LogMessage) {
        if let Some(sender) = &self.sender {
            if sender.send(message).is_err() {
                debug!("Log drain has stopped; event dropped");
            }
        }
    }

    /// Engine callback that queues `(message, level, id)` events.
    pub fn callback(&self) -> LogCallback {
        let forwarder = self.clone();
        Arc::new(move |message: &str, level: &str, id: &str| {
            forwarder.forward(LogMessage {
                level: level.to_string(),
                message: message.to_string(),
                id: id.to_string(),
            });
        })
    }

    /// Posts a greeting to `endpoint` and waits for it to be delivered.
    ///
    /// Only transport failures count; the collector's status code is
    /// logged and otherwise ignored.
    pub async fn ping(&self, endpoint: &str, id: &str) -> SessionResult<()> {
        let message = LogMessage {
            level: "INFO".to_string(),
            message: "Connection established".to_string(),
            id: id.to_string(),
        };
        let response = self
            .client
            .post(endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| SessionError::LogEndpointUnreachable {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            warn!(endpoint, status = %response.status(), "Log endpoint answered ping with an error");
        }
        Ok(())
    }
}

fn http_client() -> Client {
    Client::builder()
        .timeout(FORWARD_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to a default HTTP client");
            Client::new()
        })
}

async fn drain(
    mut receiver: mpsc::UnboundedReceiver<LogMessage>,
    client: Client,
    endpoint: Arc<RwLock<Option<String>>>,
) {
    while let Some(message) = receiver.recv().await {
        let target = endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(target) = target else {
            continue;
        };
        match client.post(&target).json(&message).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    endpoint = %target,
                    status = %response.status(),
                    id = %message.id,
                    "Log collector rejected event"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(endpoint = %target, error = %e, id = %message.id, "Failed to forward log event");
            }
        }
    }
    debug!("Log drain stopped");
}
