//! Capability variant contracts.
//!
//! A capability is anything a workflow author can pick by name: components
//! run as graph nodes, triggers start executions, integrations and
//! applications bundle their own components and triggers behind one
//! installation, and widgets are canvas decorations with no behaviour.

use crate::configuration::ConfigurationField;
use crate::context::{
    ActionContext, ExecutionContext, HttpRequestContext, ListResourcesContext, QueueItemContext,
    SetupContext, SyncContext, WebhookContext, WebhookSetupContext,
};
use crate::error::{CapabilityError, CapabilityResult};
use crate::isolation::{
    IsolatedApplication, IsolatedComponent, IsolatedIntegration, IsolatedTrigger,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use switchyard_core::ExecutionId;

/// Name of the output channel a component emits on unless it declares others.
pub const DEFAULT_OUTPUT_CHANNEL: &str = "default";

/// Metadata shared by every capability variant.
pub trait Capability: Send + Sync {
    /// Registry name. Unique per variant.
    fn name(&self) -> &str;

    fn label(&self) -> &str;

    fn icon(&self) -> &str {
        ""
    }

    fn description(&self) -> &str {
        ""
    }

    fn configuration(&self) -> Vec<ConfigurationField> {
        Vec::new()
    }
}

/// A named output of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChannel {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl OutputChannel {
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn default_channel() -> Self {
        Self::new(DEFAULT_OUTPUT_CHANNEL, "Default")
    }
}

/// An operation a capability exposes beyond its main behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Whether users may invoke it, as opposed to only the system.
    #[serde(default)]
    pub user_accessible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ConfigurationField>,
}

impl Action {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            user_accessible: false,
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn user_accessible(mut self) -> Self {
        self.user_accessible = true;
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<ConfigurationField>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A resource an installation exposes for `resource` configuration fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    pub name: String,
}

/// A workflow node.
#[async_trait]
pub trait Component: Capability {
    fn output_channels(&self) -> Vec<OutputChannel> {
        vec![OutputChannel::default_channel()]
    }

    fn actions(&self) -> Vec<Action> {
        Vec::new()
    }

    /// Validates configuration and provisions anything the node needs.
    async fn setup(&self, _ctx: SetupContext) -> CapabilityResult<()> {
        Ok(())
    }

    /// Turns a queued item into an execution. `None` means the item is dropped.
    async fn process_queue_item(
        &self,
        _ctx: QueueItemContext,
    ) -> CapabilityResult<Option<ExecutionId>> {
        Ok(Some(ExecutionId::new()))
    }

    async fn execute(&self, ctx: ExecutionContext) -> CapabilityResult<()>;

    async fn handle_action(&self, ctx: ActionContext) -> CapabilityResult<()> {
        Err(CapabilityError::NotSupported {
            operation: format!("action {}", ctx.action),
        }
        .into())
    }

    /// Returns the HTTP status to answer the webhook with.
    async fn handle_webhook(&self, _ctx: WebhookContext) -> CapabilityResult<u16> {
        Ok(200)
    }

    async fn cancel(&self, _ctx: ExecutionContext) -> CapabilityResult<()> {
        Ok(())
    }
}

/// Starts workflow executions from outside events.
#[async_trait]
pub trait Trigger: Capability {
    fn actions(&self) -> Vec<Action> {
        Vec::new()
    }

    async fn setup(&self, _ctx: SetupContext) -> CapabilityResult<()> {
        Ok(())
    }

    async fn handle_action(&self, ctx: ActionContext) -> CapabilityResult<()> {
        Err(CapabilityError::NotSupported {
            operation: format!("action {}", ctx.action),
        }
        .into())
    }

    async fn handle_webhook(&self, _ctx: WebhookContext) -> CapabilityResult<u16> {
        Ok(200)
    }
}

/// A connection to an external system, owning the components and triggers
/// that use it.
#[async_trait]
pub trait Integration: Capability {
    fn components(&self) -> Vec<Arc<dyn Component>> {
        Vec::new()
    }

    fn triggers(&self) -> Vec<Arc<dyn Trigger>> {
        Vec::new()
    }

    fn actions(&self) -> Vec<Action> {
        Vec::new()
    }

    /// Checks credentials and refreshes installation metadata.
    async fn sync(&self, ctx: SyncContext) -> CapabilityResult<()>;

    async fn list_resources(
        &self,
        _resource_type: &str,
        _ctx: ListResourcesContext,
    ) -> CapabilityResult<Vec<IntegrationResource>> {
        Ok(Vec::new())
    }

    async fn handle_action(&self, ctx: ActionContext) -> CapabilityResult<()> {
        Err(CapabilityError::NotSupported {
            operation: format!("action {}", ctx.action),
        }
        .into())
    }

    /// Serves an HTTP request routed to the installation, writing into
    /// `ctx.response`.
    async fn handle_request(&self, ctx: &mut HttpRequestContext) -> CapabilityResult<()> {
        ctx.response.set_status(404);
        Ok(())
    }
}

/// Like an integration, but manages its own webhooks on the external system.
#[async_trait]
pub trait Application: Capability {
    fn components(&self) -> Vec<Arc<dyn Component>> {
        Vec::new()
    }

    fn triggers(&self) -> Vec<Arc<dyn Trigger>> {
        Vec::new()
    }

    async fn sync(&self, ctx: SyncContext) -> CapabilityResult<()>;

    async fn list_resources(
        &self,
        _resource_type: &str,
        _ctx: ListResourcesContext,
    ) -> CapabilityResult<Vec<IntegrationResource>> {
        Ok(Vec::new())
    }

    async fn handle_request(&self, ctx: &mut HttpRequestContext) -> CapabilityResult<()> {
        ctx.response.set_status(404);
        Ok(())
    }

    /// Whether two webhook configurations can share one remote webhook.
    fn compare_webhook_config(&self, a: &JsonValue, b: &JsonValue) -> CapabilityResult<bool> {
        Ok(a == b)
    }

    /// Creates the remote webhook, returning metadata that identifies it.
    async fn setup_webhook(
        &self,
        _ctx: WebhookSetupContext,
    ) -> CapabilityResult<Option<JsonValue>> {
        Ok(None)
    }

    async fn cleanup_webhook(&self, _ctx: WebhookSetupContext) -> CapabilityResult<()> {
        Ok(())
    }
}

/// Canvas decoration. Metadata only.
pub trait Widget: Capability {}

/// Webhook provisioning for an integration, registered under its name.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    fn compare_config(&self, a: &JsonValue, b: &JsonValue) -> CapabilityResult<bool> {
        Ok(a == b)
    }

    async fn setup(&self, ctx: WebhookSetupContext) -> CapabilityResult<Option<JsonValue>>;

    async fn cleanup(&self, ctx: WebhookSetupContext) -> CapabilityResult<()>;
}

/// Capability variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Component,
    Trigger,
    Integration,
    Application,
    Widget,
}

impl Kind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Trigger => "trigger",
            Self::Integration => "integration",
            Self::Application => "application",
            Self::Widget => "widget",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability of any variant, as handled at the registry boundary.
#[derive(Clone)]
pub enum CapabilityKind {
    Component(Arc<dyn Component>),
    Trigger(Arc<dyn Trigger>),
    Integration(Arc<dyn Integration>),
    Application(Arc<dyn Application>),
    Widget(Arc<dyn Widget>),
}

impl CapabilityKind {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Component(c) => c.name(),
            Self::Trigger(t) => t.name(),
            Self::Integration(i) => i.name(),
            Self::Application(a) => a.name(),
            Self::Widget(w) => w.name(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Component(c) => c.label(),
            Self::Trigger(t) => t.label(),
            Self::Integration(i) => i.label(),
            Self::Application(a) => a.label(),
            Self::Widget(w) => w.label(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Component(_) => Kind::Component,
            Self::Trigger(_) => Kind::Trigger,
            Self::Integration(_) => Kind::Integration,
            Self::Application(_) => Kind::Application,
            Self::Widget(_) => Kind::Widget,
        }
    }

    /// Wraps the capability in the fault-isolation layer. Widgets have no
    /// behaviour and are returned as is.
    #[must_use]
    pub fn isolate(self) -> Self {
        match self {
            Self::Component(c) => Self::Component(IsolatedComponent::wrap(c)),
            Self::Trigger(t) => Self::Trigger(IsolatedTrigger::wrap(t)),
            Self::Integration(i) => Self::Integration(IsolatedIntegration::wrap(i)),
            Self::Application(a) => Self::Application(IsolatedApplication::wrap(a)),
            Self::Widget(w) => Self::Widget(w),
        }
    }
}

impl fmt::Debug for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityKind")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note;

    impl Capability for Note {
        fn name(&self) -> &str {
            "note"
        }

        fn label(&self) -> &str {
            "Note"
        }
    }

    impl Widget for Note {}

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(Kind::Component.to_string(), "component");
        assert_eq!(Kind::Application.to_string(), "application");
    }

    #[test]
    fn widgets_are_not_wrapped() {
        let widget: Arc<dyn Widget> = Arc::new(Note);
        let isolated = CapabilityKind::Widget(Arc::clone(&widget)).isolate();
        let CapabilityKind::Widget(inner) = isolated else {
            panic!("expected widget");
        };
        assert!(Arc::ptr_eq(&inner, &widget));
        assert_eq!(CapabilityKind::Widget(inner).name(), "note");
    }

    #[test]
    fn action_builder() {
        let action = Action::new("rerun", "Run again").user_accessible();
        assert!(action.user_accessible);
        assert!(action.parameters.is_empty());
    }
}
