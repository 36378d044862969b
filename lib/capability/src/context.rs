//! Contexts handed to capability behaviour.
//!
//! Workers and request handlers build these from persisted state; the
//! capability reads its configuration, talks to its external system through
//! `services.http`, and reports results through the sinks.

use crate::encryptor::Encryptor;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use switchyard_core::{ExecutionId, InstallationId};
use switchyard_egress::EgressContext;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared services every capability call may use.
#[derive(Clone)]
pub struct Services {
    /// Egress-safe HTTP client for all outbound calls.
    pub http: EgressContext,
    pub encryptor: Arc<dyn Encryptor>,
}

impl Services {
    #[must_use]
    pub fn new(http: EgressContext, encryptor: Arc<dyn Encryptor>) -> Self {
        Self { http, encryptor }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}

/// Capability-owned state persisted alongside a node or installation.
///
/// Clones share the same value so the caller can read back what the
/// capability stored.
#[derive(Debug, Clone, Default)]
pub struct Metadata(Arc<Mutex<JsonValue>>);

impl Metadata {
    #[must_use]
    pub fn new(value: JsonValue) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    #[must_use]
    pub fn get(&self) -> JsonValue {
        lock(&self.0).clone()
    }

    pub fn set(&self, value: JsonValue) {
        *lock(&self.0) = value;
    }
}

/// How an execution finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Finish {
    Passed,
    Failed { reason: String, message: String },
}

/// Everything an execution reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    /// Payloads emitted per output channel, in emission order.
    pub emitted: BTreeMap<String, Vec<JsonValue>>,
    pub finish: Option<Finish>,
}

/// Sink for the outputs of one component execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionState(Arc<Mutex<ExecutionOutcome>>);

impl ExecutionState {
    /// Emits payloads on an output channel and marks the execution passed.
    pub fn emit(&self, channel: impl Into<String>, payloads: Vec<JsonValue>) {
        let mut outcome = lock(&self.0);
        outcome
            .emitted
            .entry(channel.into())
            .or_default()
            .extend(payloads);
        outcome.finish = Some(Finish::Passed);
    }

    /// Marks the execution passed without emitting.
    pub fn pass(&self) {
        lock(&self.0).finish = Some(Finish::Passed);
    }

    pub fn fail(&self, reason: impl Into<String>, message: impl Into<String>) {
        lock(&self.0).finish = Some(Finish::Failed {
            reason: reason.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn outcome(&self) -> ExecutionOutcome {
        lock(&self.0).clone()
    }
}

/// Sink for events produced by triggers.
#[derive(Debug, Clone, Default)]
pub struct EventSink(Arc<Mutex<Vec<(String, JsonValue)>>>);

impl EventSink {
    pub fn emit(&self, event_type: impl Into<String>, payload: JsonValue) {
        lock(&self.0).push((event_type.into(), payload));
    }

    #[must_use]
    pub fn events(&self) -> Vec<(String, JsonValue)> {
        lock(&self.0).clone()
    }
}

/// An inbound HTTP request routed to a capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl IncomingRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// The response a request-handling capability writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSink {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl ResponseSink {
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn write(&mut self, body: impl AsRef<[u8]>) {
        self.body.extend_from_slice(body.as_ref());
    }

    /// Replaces the body with a JSON document.
    pub fn json(&mut self, value: &JsonValue) {
        self.set_header("content-type", "application/json");
        self.body = value.to_string().into_bytes();
    }
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }
}

/// Context for `setup` on components and triggers.
#[derive(Debug, Clone)]
pub struct SetupContext {
    pub node_id: String,
    pub configuration: JsonValue,
    pub metadata: Metadata,
    pub services: Services,
}

/// Context for executing (or cancelling) one component execution.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub execution_id: ExecutionId,
    pub node_id: String,
    pub configuration: JsonValue,
    /// Payload received from the upstream node.
    pub input: JsonValue,
    pub metadata: Metadata,
    pub state: ExecutionState,
    pub services: Services,
}

/// Context for turning a queued event into an execution.
#[derive(Debug, Clone)]
pub struct QueueItemContext {
    pub node_id: String,
    pub configuration: JsonValue,
    pub item: JsonValue,
    pub services: Services,
}

/// Context for a user- or system-invoked action.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub node_id: String,
    /// Name of the action, one of the capability's declared actions.
    pub action: String,
    pub parameters: JsonValue,
    pub configuration: JsonValue,
    pub metadata: Metadata,
    pub events: EventSink,
    pub services: Services,
}

/// Context for a webhook delivered to a component or trigger.
#[derive(Debug, Clone)]
pub struct WebhookContext {
    pub node_id: String,
    pub configuration: JsonValue,
    pub request: IncomingRequest,
    pub metadata: Metadata,
    pub events: EventSink,
    pub services: Services,
}

/// Context for synchronising an integration or application installation.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub installation_id: InstallationId,
    pub configuration: JsonValue,
    pub metadata: Metadata,
    pub services: Services,
}

/// Context for listing resources exposed by an installation.
#[derive(Debug, Clone)]
pub struct ListResourcesContext {
    pub installation_id: InstallationId,
    pub configuration: JsonValue,
    pub metadata: Metadata,
    pub services: Services,
}

/// Context for an HTTP request routed to an installation.
#[derive(Debug, Clone)]
pub struct HttpRequestContext {
    pub installation_id: InstallationId,
    pub request: IncomingRequest,
    pub response: ResponseSink,
    pub configuration: JsonValue,
    pub metadata: Metadata,
    pub services: Services,
}

/// Context for provisioning or removing a webhook on the external system.
#[derive(Debug, Clone)]
pub struct WebhookSetupContext {
    pub installation_id: InstallationId,
    /// Identifier of the webhook record on our side.
    pub webhook_id: String,
    /// The webhook's configuration, as compared by `compare_webhook_config`.
    pub configuration: JsonValue,
    /// Metadata from a previous setup, if any.
    pub metadata: Metadata,
    pub services: Services,
}
