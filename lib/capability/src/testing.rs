//! Context builders shared by the unit tests in this crate.

use crate::context::*;
use crate::encryptor::NoOpEncryptor;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use switchyard_core::{ExecutionId, InstallationId};
use switchyard_egress::{EgressContext, EgressOptions};

pub(crate) fn services() -> Services {
    let http = EgressContext::new(EgressOptions::default()).expect("egress client builds");
    Services::new(http, Arc::new(NoOpEncryptor))
}

fn configuration() -> JsonValue {
    json!({})
}

pub(crate) fn setup_context() -> SetupContext {
    SetupContext {
        node_id: "n1".to_string(),
        configuration: configuration(),
        metadata: Metadata::default(),
        services: services(),
    }
}

pub(crate) fn execution_context() -> ExecutionContext {
    ExecutionContext {
        execution_id: ExecutionId::new(),
        node_id: "n1".to_string(),
        configuration: configuration(),
        input: json!({}),
        metadata: Metadata::default(),
        state: ExecutionState::default(),
        services: services(),
    }
}

pub(crate) fn queue_item_context() -> QueueItemContext {
    QueueItemContext {
        node_id: "n1".to_string(),
        configuration: configuration(),
        item: json!({}),
        services: services(),
    }
}

pub(crate) fn action_context(action: &str) -> ActionContext {
    ActionContext {
        node_id: "n1".to_string(),
        action: action.to_string(),
        parameters: json!({}),
        configuration: configuration(),
        metadata: Metadata::default(),
        events: EventSink::default(),
        services: services(),
    }
}

pub(crate) fn webhook_context() -> WebhookContext {
    WebhookContext {
        node_id: "n1".to_string(),
        configuration: configuration(),
        request: IncomingRequest::new("POST", "/webhooks/n1"),
        metadata: Metadata::default(),
        events: EventSink::default(),
        services: services(),
    }
}

pub(crate) fn sync_context() -> SyncContext {
    SyncContext {
        installation_id: InstallationId::new(),
        configuration: configuration(),
        metadata: Metadata::default(),
        services: services(),
    }
}

pub(crate) fn list_resources_context() -> ListResourcesContext {
    ListResourcesContext {
        installation_id: InstallationId::new(),
        configuration: configuration(),
        metadata: Metadata::default(),
        services: services(),
    }
}

pub(crate) fn http_request_context() -> HttpRequestContext {
    HttpRequestContext {
        installation_id: InstallationId::new(),
        request: IncomingRequest::new("GET", "/installations/status"),
        response: ResponseSink::default(),
        configuration: configuration(),
        metadata: Metadata::default(),
        services: services(),
    }
}

pub(crate) fn webhook_setup_context() -> WebhookSetupContext {
    WebhookSetupContext {
        installation_id: InstallationId::new(),
        webhook_id: "wh_1".to_string(),
        configuration: json!({"events": ["push"]}),
        metadata: Metadata::default(),
        services: services(),
    }
}
