//! Context builders shared by the unit tests in this crate.

use serde_json::Value as JsonValue;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use switchyard_capability::{
    ActionContext, EventSink, ExecutionContext, ExecutionState, IncomingRequest, Metadata,
    NoOpEncryptor, Services, SetupContext, WebhookContext,
};
use switchyard_core::ExecutionId;
use switchyard_egress::network::DEFAULT_BLOCKED_NETWORKS;
use switchyard_egress::{EgressContext, EgressOptions};

fn services_with(options: EgressOptions) -> Services {
    let http = EgressContext::new(options).expect("egress client builds");
    Services::new(http, Arc::new(NoOpEncryptor))
}

pub(crate) fn services() -> Services {
    services_with(EgressOptions::default())
}

/// Services whose egress policy lets tests reach a server on 127.0.0.1.
pub(crate) fn loopback_services() -> Services {
    let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    services_with(EgressOptions {
        blocked_networks: DEFAULT_BLOCKED_NETWORKS
            .iter()
            .copied()
            .filter(|network| !network.contains(loopback))
            .collect(),
        ..EgressOptions::default()
    })
}

fn execution_context_with(
    configuration: JsonValue,
    input: JsonValue,
    services: Services,
) -> ExecutionContext {
    ExecutionContext {
        execution_id: ExecutionId::new(),
        node_id: "n1".to_string(),
        configuration,
        input,
        metadata: Metadata::default(),
        state: ExecutionState::default(),
        services,
    }
}

pub(crate) fn execution_context(configuration: JsonValue, input: JsonValue) -> ExecutionContext {
    execution_context_with(configuration, input, services())
}

pub(crate) fn loopback_execution_context(configuration: JsonValue) -> ExecutionContext {
    execution_context_with(configuration, JsonValue::Null, loopback_services())
}

pub(crate) fn setup_context(configuration: JsonValue) -> SetupContext {
    SetupContext {
        node_id: "n1".to_string(),
        configuration,
        metadata: Metadata::default(),
        services: services(),
    }
}

pub(crate) fn action_context(action: &str, parameters: JsonValue) -> ActionContext {
    ActionContext {
        node_id: "n1".to_string(),
        action: action.to_string(),
        parameters,
        configuration: JsonValue::Null,
        metadata: Metadata::default(),
        events: EventSink::default(),
        services: services(),
    }
}

pub(crate) fn webhook_context(
    configuration: JsonValue,
    request: IncomingRequest,
) -> WebhookContext {
    WebhookContext {
        node_id: "n1".to_string(),
        configuration,
        request,
        metadata: Metadata::default(),
        events: EventSink::default(),
        services: services(),
    }
}
