//! Process-wide capability registration.
//!
//! Capabilities register themselves by name at load time. Registering a name
//! twice replaces the earlier binding. Registries take a snapshot of the table
//! when they are built, so later registrations are only visible to registries
//! built afterwards.

use crate::capability::{Application, Component, Integration, Kind, Trigger, WebhookHandler, Widget};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

static GLOBAL: LazyLock<RegistrationTable> = LazyLock::new(RegistrationTable::new);

#[derive(Clone, Default)]
pub(crate) struct Bindings {
    pub(crate) components: BTreeMap<String, Arc<dyn Component>>,
    pub(crate) triggers: BTreeMap<String, Arc<dyn Trigger>>,
    pub(crate) integrations: BTreeMap<String, Arc<dyn Integration>>,
    pub(crate) applications: BTreeMap<String, Arc<dyn Application>>,
    pub(crate) widgets: BTreeMap<String, Arc<dyn Widget>>,
    /// Keyed by integration name.
    pub(crate) webhook_handlers: BTreeMap<String, Arc<dyn WebhookHandler>>,
}

fn bind<T: ?Sized>(map: &mut BTreeMap<String, Arc<T>>, kind: &str, name: String, value: Arc<T>) {
    if map.insert(name.clone(), value).is_some() {
        debug!(kind, %name, "replaced existing registration");
    } else {
        debug!(kind, %name, "registered");
    }
}

/// Name bindings for every capability variant, behind one lock.
#[derive(Default)]
pub struct RegistrationTable {
    bindings: RwLock<Bindings>,
}

impl RegistrationTable {
    /// An empty table, independent of the process-wide one.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table the free `register_*` functions write to.
    #[must_use]
    pub fn global() -> &'static RegistrationTable {
        &GLOBAL
    }

    // A panic while holding the lock cannot leave a map half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Bindings> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Bindings> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_component(&self, name: impl Into<String>, component: Arc<dyn Component>) {
        bind(&mut self.write().components, Kind::Component.as_str(), name.into(), component);
    }

    pub fn register_trigger(&self, name: impl Into<String>, trigger: Arc<dyn Trigger>) {
        bind(&mut self.write().triggers, Kind::Trigger.as_str(), name.into(), trigger);
    }

    pub fn register_integration(&self, name: impl Into<String>, integration: Arc<dyn Integration>) {
        bind(&mut self.write().integrations, Kind::Integration.as_str(), name.into(), integration);
    }

    /// Registers an integration together with the handler that provisions
    /// its webhooks. Both are bound under the same name in one update.
    pub fn register_integration_with_webhook_handler(
        &self,
        name: impl Into<String>,
        integration: Arc<dyn Integration>,
        handler: Arc<dyn WebhookHandler>,
    ) {
        let name = name.into();
        let mut bindings = self.write();
        bind(&mut bindings.integrations, Kind::Integration.as_str(), name.clone(), integration);
        bind(&mut bindings.webhook_handlers, "webhook_handler", name, handler);
    }

    pub fn register_application(&self, name: impl Into<String>, application: Arc<dyn Application>) {
        bind(&mut self.write().applications, Kind::Application.as_str(), name.into(), application);
    }

    pub fn register_widget(&self, name: impl Into<String>, widget: Arc<dyn Widget>) {
        bind(&mut self.write().widgets, Kind::Widget.as_str(), name.into(), widget);
    }

    /// The current binding, unwrapped. Registries built earlier keep theirs.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.read().components.get(name).cloned()
    }

    #[must_use]
    pub fn trigger(&self, name: &str) -> Option<Arc<dyn Trigger>> {
        self.read().triggers.get(name).cloned()
    }

    #[must_use]
    pub fn integration(&self, name: &str) -> Option<Arc<dyn Integration>> {
        self.read().integrations.get(name).cloned()
    }

    #[must_use]
    pub fn application(&self, name: &str) -> Option<Arc<dyn Application>> {
        self.read().applications.get(name).cloned()
    }

    #[must_use]
    pub fn widget(&self, name: &str) -> Option<Arc<dyn Widget>> {
        self.read().widgets.get(name).cloned()
    }

    #[must_use]
    pub fn webhook_handler(&self, integration: &str) -> Option<Arc<dyn WebhookHandler>> {
        self.read().webhook_handlers.get(integration).cloned()
    }

    pub(crate) fn snapshot(&self) -> Bindings {
        self.read().clone()
    }
}

pub fn register_component(name: impl Into<String>, component: impl Component + 'static) {
    GLOBAL.register_component(name, Arc::new(component));
}

pub fn register_trigger(name: impl Into<String>, trigger: impl Trigger + 'static) {
    GLOBAL.register_trigger(name, Arc::new(trigger));
}

pub fn register_integration(name: impl Into<String>, integration: impl Integration + 'static) {
    GLOBAL.register_integration(name, Arc::new(integration));
}

pub fn register_integration_with_webhook_handler(
    name: impl Into<String>,
    integration: impl Integration + 'static,
    handler: impl WebhookHandler + 'static,
) {
    GLOBAL.register_integration_with_webhook_handler(
        name,
        Arc::new(integration),
        Arc::new(handler),
    );
}

pub fn register_application(name: impl Into<String>, application: impl Application + 'static) {
    GLOBAL.register_application(name, Arc::new(application));
}

pub fn register_widget(name: impl Into<String>, widget: impl Widget + 'static) {
    GLOBAL.register_widget(name, Arc::new(widget));
}
