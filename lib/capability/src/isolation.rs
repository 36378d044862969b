//! Fault isolation for capability behaviour.
//!
//! Every behaviour call on a registered capability goes through one of the
//! wrappers below. A panic inside the implementation is caught at this
//! boundary, logged with its backtrace, and returned to the caller as
//! `CapabilityError::AbnormalTermination` so the worker or request handler
//! keeps running.

use crate::capability::{
    Action, Application, Capability, Component, Integration, IntegrationResource, OutputChannel,
    Trigger, WebhookHandler,
};
use crate::configuration::ConfigurationField;
use crate::context::{
    ActionContext, ExecutionContext, HttpRequestContext, ListResourcesContext, QueueItemContext,
    ResponseSink, SetupContext, SyncContext, WebhookContext, WebhookSetupContext,
};
use crate::error::{CapabilityError, CapabilityResult};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use switchyard_core::ExecutionId;
use tracing::error;

fn panic_cause(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn abnormal_termination(
    capability: &str,
    operation: &'static str,
    parameter: Option<&str>,
    payload: &(dyn Any + Send),
) -> CapabilityError {
    let cause = panic_cause(payload);
    let backtrace = Backtrace::force_capture();
    error!(
        capability,
        operation,
        parameter,
        %cause,
        %backtrace,
        "capability panicked"
    );
    CapabilityError::AbnormalTermination {
        capability: capability.to_string(),
        operation,
        cause,
    }
}

/// Discards whatever a panicking request handler wrote and answers 500.
fn server_error(ctx: &mut HttpRequestContext) {
    ctx.response = ResponseSink {
        status: 500,
        ..ResponseSink::default()
    };
}

async fn guard<T, F>(
    capability: &str,
    operation: &'static str,
    parameter: Option<&str>,
    call: F,
) -> CapabilityResult<T>
where
    F: Future<Output = CapabilityResult<T>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            Err(abnormal_termination(capability, operation, parameter, &*payload).into())
        }
    }
}

fn guard_sync<T>(
    capability: &str,
    operation: &'static str,
    call: impl FnOnce() -> CapabilityResult<T>,
) -> CapabilityResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(abnormal_termination(capability, operation, None, &*payload).into()),
    }
}

macro_rules! forward_metadata {
    () => {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn label(&self) -> &str {
            self.inner.label()
        }

        fn icon(&self) -> &str {
            self.inner.icon()
        }

        fn description(&self) -> &str {
            self.inner.description()
        }

        fn configuration(&self) -> Vec<ConfigurationField> {
            self.inner.configuration()
        }
    };
}

/// Isolating wrapper around a component.
pub struct IsolatedComponent {
    inner: Arc<dyn Component>,
}

impl IsolatedComponent {
    #[must_use]
    pub fn wrap(inner: Arc<dyn Component>) -> Arc<dyn Component> {
        Arc::new(Self { inner })
    }
}

impl Capability for IsolatedComponent {
    forward_metadata!();
}

#[async_trait]
impl Component for IsolatedComponent {
    fn output_channels(&self) -> Vec<OutputChannel> {
        self.inner.output_channels()
    }

    fn actions(&self) -> Vec<Action> {
        self.inner.actions()
    }

    async fn setup(&self, ctx: SetupContext) -> CapabilityResult<()> {
        guard(self.name(), "setup", None, self.inner.setup(ctx)).await
    }

    async fn process_queue_item(
        &self,
        ctx: QueueItemContext,
    ) -> CapabilityResult<Option<ExecutionId>> {
        let call = self.inner.process_queue_item(ctx);
        guard(self.name(), "process_queue_item", None, call).await
    }

    async fn execute(&self, ctx: ExecutionContext) -> CapabilityResult<()> {
        guard(self.name(), "execute", None, self.inner.execute(ctx)).await
    }

    async fn handle_action(&self, ctx: ActionContext) -> CapabilityResult<()> {
        let action = ctx.action.clone();
        let call = self.inner.handle_action(ctx);
        guard(self.name(), "handle_action", Some(&action), call).await
    }

    async fn handle_webhook(&self, ctx: WebhookContext) -> CapabilityResult<u16> {
        guard(self.name(), "handle_webhook", None, self.inner.handle_webhook(ctx)).await
    }

    async fn cancel(&self, ctx: ExecutionContext) -> CapabilityResult<()> {
        guard(self.name(), "cancel", None, self.inner.cancel(ctx)).await
    }
}

/// Isolating wrapper around a trigger.
pub struct IsolatedTrigger {
    inner: Arc<dyn Trigger>,
}

impl IsolatedTrigger {
    #[must_use]
    pub fn wrap(inner: Arc<dyn Trigger>) -> Arc<dyn Trigger> {
        Arc::new(Self { inner })
    }
}

impl Capability for IsolatedTrigger {
    forward_metadata!();
}

#[async_trait]
impl Trigger for IsolatedTrigger {
    fn actions(&self) -> Vec<Action> {
        self.inner.actions()
    }

    async fn setup(&self, ctx: SetupContext) -> CapabilityResult<()> {
        guard(self.name(), "setup", None, self.inner.setup(ctx)).await
    }

    async fn handle_action(&self, ctx: ActionContext) -> CapabilityResult<()> {
        let action = ctx.action.clone();
        let call = self.inner.handle_action(ctx);
        guard(self.name(), "handle_action", Some(&action), call).await
    }

    async fn handle_webhook(&self, ctx: WebhookContext) -> CapabilityResult<u16> {
        guard(self.name(), "handle_webhook", None, self.inner.handle_webhook(ctx)).await
    }
}

/// Isolating wrapper around an integration. Its components and triggers are
/// wrapped as well.
pub struct IsolatedIntegration {
    inner: Arc<dyn Integration>,
}

impl IsolatedIntegration {
    #[must_use]
    pub fn wrap(inner: Arc<dyn Integration>) -> Arc<dyn Integration> {
        Arc::new(Self { inner })
    }
}

impl Capability for IsolatedIntegration {
    forward_metadata!();
}

#[async_trait]
impl Integration for IsolatedIntegration {
    fn components(&self) -> Vec<Arc<dyn Component>> {
        self.inner
            .components()
            .into_iter()
            .map(IsolatedComponent::wrap)
            .collect()
    }

    fn triggers(&self) -> Vec<Arc<dyn Trigger>> {
        self.inner
            .triggers()
            .into_iter()
            .map(IsolatedTrigger::wrap)
            .collect()
    }

    fn actions(&self) -> Vec<Action> {
        self.inner.actions()
    }

    async fn sync(&self, ctx: SyncContext) -> CapabilityResult<()> {
        guard(self.name(), "sync", None, self.inner.sync(ctx)).await
    }

    async fn list_resources(
        &self,
        resource_type: &str,
        ctx: ListResourcesContext,
    ) -> CapabilityResult<Vec<IntegrationResource>> {
        guard(
            self.name(),
            "list_resources",
            Some(resource_type),
            self.inner.list_resources(resource_type, ctx),
        )
        .await
    }

    async fn handle_action(&self, ctx: ActionContext) -> CapabilityResult<()> {
        let action = ctx.action.clone();
        let call = self.inner.handle_action(ctx);
        guard(self.name(), "handle_action", Some(&action), call).await
    }

    async fn handle_request(&self, ctx: &mut HttpRequestContext) -> CapabilityResult<()> {
        let result = AssertUnwindSafe(self.inner.handle_request(ctx)).catch_unwind().await;
        match result {
            Ok(result) => result,
            Err(payload) => {
                server_error(ctx);
                Err(abnormal_termination(self.name(), "handle_request", None, &*payload).into())
            }
        }
    }
}

/// Isolating wrapper around an application. Its components and triggers are
/// wrapped as well.
pub struct IsolatedApplication {
    inner: Arc<dyn Application>,
}

impl IsolatedApplication {
    #[must_use]
    pub fn wrap(inner: Arc<dyn Application>) -> Arc<dyn Application> {
        Arc::new(Self { inner })
    }
}

impl Capability for IsolatedApplication {
    forward_metadata!();
}

#[async_trait]
impl Application for IsolatedApplication {
    fn components(&self) -> Vec<Arc<dyn Component>> {
        self.inner
            .components()
            .into_iter()
            .map(IsolatedComponent::wrap)
            .collect()
    }

    fn triggers(&self) -> Vec<Arc<dyn Trigger>> {
        self.inner
            .triggers()
            .into_iter()
            .map(IsolatedTrigger::wrap)
            .collect()
    }

    async fn sync(&self, ctx: SyncContext) -> CapabilityResult<()> {
        guard(self.name(), "sync", None, self.inner.sync(ctx)).await
    }

    async fn list_resources(
        &self,
        resource_type: &str,
        ctx: ListResourcesContext,
    ) -> CapabilityResult<Vec<IntegrationResource>> {
        guard(
            self.name(),
            "list_resources",
            Some(resource_type),
            self.inner.list_resources(resource_type, ctx),
        )
        .await
    }

    async fn handle_request(&self, ctx: &mut HttpRequestContext) -> CapabilityResult<()> {
        let result = AssertUnwindSafe(self.inner.handle_request(ctx)).catch_unwind().await;
        match result {
            Ok(result) => result,
            Err(payload) => {
                server_error(ctx);
                Err(abnormal_termination(self.name(), "handle_request", None, &*payload).into())
            }
        }
    }

    fn compare_webhook_config(&self, a: &JsonValue, b: &JsonValue) -> CapabilityResult<bool> {
        guard_sync(self.name(), "compare_webhook_config", || {
            self.inner.compare_webhook_config(a, b)
        })
    }

    async fn setup_webhook(
        &self,
        ctx: WebhookSetupContext,
    ) -> CapabilityResult<Option<JsonValue>> {
        guard(self.name(), "setup_webhook", None, self.inner.setup_webhook(ctx)).await
    }

    async fn cleanup_webhook(&self, ctx: WebhookSetupContext) -> CapabilityResult<()> {
        guard(self.name(), "cleanup_webhook", None, self.inner.cleanup_webhook(ctx)).await
    }
}

/// Isolating wrapper around an integration's webhook handler.
pub struct IsolatedWebhookHandler {
    /// Integration the handler is registered under.
    integration: String,
    inner: Arc<dyn WebhookHandler>,
}

impl IsolatedWebhookHandler {
    #[must_use]
    pub fn wrap(
        integration: impl Into<String>,
        inner: Arc<dyn WebhookHandler>,
    ) -> Arc<dyn WebhookHandler> {
        Arc::new(Self {
            integration: integration.into(),
            inner,
        })
    }
}

#[async_trait]
impl WebhookHandler for IsolatedWebhookHandler {
    fn compare_config(&self, a: &JsonValue, b: &JsonValue) -> CapabilityResult<bool> {
        guard_sync(&self.integration, "compare_config", || self.inner.compare_config(a, b))
    }

    async fn setup(&self, ctx: WebhookSetupContext) -> CapabilityResult<Option<JsonValue>> {
        guard(&self.integration, "setup", None, self.inner.setup(ctx)).await
    }

    async fn cleanup(&self, ctx: WebhookSetupContext) -> CapabilityResult<()> {
        guard(&self.integration, "cleanup", None, self.inner.cleanup(ctx)).await
    }
}
