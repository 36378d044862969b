//! Immutable capability registry.

use crate::capability::{
    Application, Capability, CapabilityKind, Component, Integration, Kind, Trigger,
    WebhookHandler, Widget,
};
use crate::encryptor::Encryptor;
use crate::error::RegistryError;
use crate::isolation::IsolatedWebhookHandler;
use crate::name::QualifiedName;
use crate::table::RegistrationTable;
use rootcause::Report;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Default)]
struct Entries {
    components: BTreeMap<String, Arc<dyn Component>>,
    triggers: BTreeMap<String, Arc<dyn Trigger>>,
    integrations: BTreeMap<String, Arc<dyn Integration>>,
    applications: BTreeMap<String, Arc<dyn Application>>,
    widgets: BTreeMap<String, Arc<dyn Widget>>,
    webhook_handlers: BTreeMap<String, Arc<dyn WebhookHandler>>,
}

impl Entries {
    fn insert(&mut self, name: String, capability: CapabilityKind) {
        match capability {
            CapabilityKind::Component(c) => {
                self.components.insert(name, c);
            }
            CapabilityKind::Trigger(t) => {
                self.triggers.insert(name, t);
            }
            CapabilityKind::Integration(i) => {
                self.integrations.insert(name, i);
            }
            CapabilityKind::Application(a) => {
                self.applications.insert(name, a);
            }
            CapabilityKind::Widget(w) => {
                self.widgets.insert(name, w);
            }
        }
    }
}

/// Snapshot of the registration table with every behaviour-carrying
/// capability wrapped for fault isolation.
///
/// Cheap to clone and safe to share across tasks. Registrations made after
/// construction are not visible.
#[derive(Clone)]
pub struct Registry {
    entries: Arc<Entries>,
    encryptor: Arc<dyn Encryptor>,
}

impl Registry {
    /// Snapshots the process-wide registration table.
    #[must_use]
    pub fn new(encryptor: Arc<dyn Encryptor>) -> Self {
        Self::from_table(RegistrationTable::global(), encryptor)
    }

    /// Snapshots an explicit table.
    #[must_use]
    #[instrument(skip_all)]
    pub fn from_table(table: &RegistrationTable, encryptor: Arc<dyn Encryptor>) -> Self {
        let bindings = table.snapshot();

        let capabilities = bindings
            .components
            .into_iter()
            .map(|(name, c)| (name, CapabilityKind::Component(c)))
            .chain(
                bindings
                    .triggers
                    .into_iter()
                    .map(|(name, t)| (name, CapabilityKind::Trigger(t))),
            )
            .chain(
                bindings
                    .integrations
                    .into_iter()
                    .map(|(name, i)| (name, CapabilityKind::Integration(i))),
            )
            .chain(
                bindings
                    .applications
                    .into_iter()
                    .map(|(name, a)| (name, CapabilityKind::Application(a))),
            )
            .chain(
                bindings
                    .widgets
                    .into_iter()
                    .map(|(name, w)| (name, CapabilityKind::Widget(w))),
            );

        let mut entries = Entries::default();
        for (name, capability) in capabilities {
            entries.insert(name, capability.isolate());
        }
        for (name, handler) in bindings.webhook_handlers {
            let handler = IsolatedWebhookHandler::wrap(name.clone(), handler);
            entries.webhook_handlers.insert(name, handler);
        }

        debug!(
            components = entries.components.len(),
            triggers = entries.triggers.len(),
            integrations = entries.integrations.len(),
            applications = entries.applications.len(),
            widgets = entries.widgets.len(),
            "built registry snapshot"
        );

        Self {
            entries: Arc::new(entries),
            encryptor,
        }
    }

    /// The secrets service handed to capabilities. Never interpreted here.
    #[must_use]
    pub fn encryptor(&self) -> &Arc<dyn Encryptor> {
        &self.encryptor
    }

    /// Looks up a component by flat (`noop`) or qualified (`github.deploy`)
    /// name. Qualified names resolve through the integration or application
    /// of that name.
    pub fn get_component(&self, name: &str) -> Result<Arc<dyn Component>, Report<RegistryError>> {
        let qualified = QualifiedName::parse(name)?;
        let found = match qualified.scope() {
            None => self.entries.components.get(qualified.leaf()).cloned(),
            Some(scope) => self
                .scoped_components(scope)?
                .into_iter()
                .find(|component| component.name() == qualified.leaf()),
        };
        found.ok_or_else(|| not_found(Kind::Component, name))
    }

    /// Looks up a trigger by flat or qualified name.
    pub fn get_trigger(&self, name: &str) -> Result<Arc<dyn Trigger>, Report<RegistryError>> {
        let qualified = QualifiedName::parse(name)?;
        let found = match qualified.scope() {
            None => self.entries.triggers.get(qualified.leaf()).cloned(),
            Some(scope) => self
                .scoped_triggers(scope)?
                .into_iter()
                .find(|trigger| trigger.name() == qualified.leaf()),
        };
        found.ok_or_else(|| not_found(Kind::Trigger, name))
    }

    pub fn get_integration(
        &self,
        name: &str,
    ) -> Result<Arc<dyn Integration>, Report<RegistryError>> {
        self.entries
            .integrations
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(Kind::Integration, name))
    }

    pub fn get_application(
        &self,
        name: &str,
    ) -> Result<Arc<dyn Application>, Report<RegistryError>> {
        self.entries
            .applications
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(Kind::Application, name))
    }

    pub fn get_widget(&self, name: &str) -> Result<Arc<dyn Widget>, Report<RegistryError>> {
        self.entries
            .widgets
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(Kind::Widget, name))
    }

    /// The webhook handler registered with an integration, if it has one.
    #[must_use]
    pub fn get_webhook_handler(&self, integration: &str) -> Option<Arc<dyn WebhookHandler>> {
        self.entries.webhook_handlers.get(integration).cloned()
    }

    pub fn list_components(&self) -> impl Iterator<Item = Arc<dyn Component>> + use<> {
        self.entries.components.values().cloned().collect::<Vec<_>>().into_iter()
    }

    pub fn list_triggers(&self) -> impl Iterator<Item = Arc<dyn Trigger>> + use<> {
        self.entries.triggers.values().cloned().collect::<Vec<_>>().into_iter()
    }

    pub fn list_integrations(&self) -> impl Iterator<Item = Arc<dyn Integration>> + use<> {
        self.entries.integrations.values().cloned().collect::<Vec<_>>().into_iter()
    }

    pub fn list_applications(&self) -> impl Iterator<Item = Arc<dyn Application>> + use<> {
        self.entries.applications.values().cloned().collect::<Vec<_>>().into_iter()
    }

    pub fn list_widgets(&self) -> impl Iterator<Item = Arc<dyn Widget>> + use<> {
        self.entries.widgets.values().cloned().collect::<Vec<_>>().into_iter()
    }

    fn scoped_components(
        &self,
        scope: &str,
    ) -> Result<Vec<Arc<dyn Component>>, Report<RegistryError>> {
        if let Some(integration) = self.entries.integrations.get(scope) {
            return Ok(integration.components());
        }
        if let Some(application) = self.entries.applications.get(scope) {
            return Ok(application.components());
        }
        Err(scope_not_found(scope))
    }

    fn scoped_triggers(&self, scope: &str) -> Result<Vec<Arc<dyn Trigger>>, Report<RegistryError>> {
        if let Some(integration) = self.entries.integrations.get(scope) {
            return Ok(integration.triggers());
        }
        if let Some(application) = self.entries.applications.get(scope) {
            return Ok(application.triggers());
        }
        Err(scope_not_found(scope))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("components", &self.entries.components.keys().collect::<Vec<_>>())
            .field("triggers", &self.entries.triggers.keys().collect::<Vec<_>>())
            .field("integrations", &self.entries.integrations.keys().collect::<Vec<_>>())
            .field("applications", &self.entries.applications.keys().collect::<Vec<_>>())
            .field("widgets", &self.entries.widgets.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn not_found(kind: Kind, name: &str) -> Report<RegistryError> {
    RegistryError::NotFound {
        kind,
        name: name.to_string(),
    }
    .into()
}

fn scope_not_found(scope: &str) -> Report<RegistryError> {
    RegistryError::ScopeNotFound {
        scope: scope.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::context::{ExecutionContext, SyncContext, WebhookSetupContext};
    use crate::encryptor::NoOpEncryptor;
    use crate::error::CapabilityResult;
    use crate::testing;
    use async_trait::async_trait;

    struct Step(&'static str);

    impl Capability for Step {
        fn name(&self) -> &str {
            self.0
        }

        fn label(&self) -> &str {
            self.0
        }
    }

    #[async_trait]
    impl Component for Step {
        async fn execute(&self, _ctx: ExecutionContext) -> CapabilityResult<()> {
            if self.0 == "crash" {
                panic!("step crashed");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Trigger for Step {}

    impl Widget for Step {}

    struct Ci;

    impl Capability for Ci {
        fn name(&self) -> &str {
            "ci"
        }

        fn label(&self) -> &str {
            "CI"
        }
    }

    #[async_trait]
    impl Integration for Ci {
        fn components(&self) -> Vec<Arc<dyn Component>> {
            vec![Arc::new(Step("deploy")), Arc::new(Step("crash"))]
        }

        fn triggers(&self) -> Vec<Arc<dyn Trigger>> {
            vec![Arc::new(Step("on_push"))]
        }

        async fn sync(&self, _ctx: SyncContext) -> CapabilityResult<()> {
            Ok(())
        }
    }

    struct Chat;

    impl Capability for Chat {
        fn name(&self) -> &str {
            "chat"
        }

        fn label(&self) -> &str {
            "Chat"
        }
    }

    #[async_trait]
    impl Application for Chat {
        fn components(&self) -> Vec<Arc<dyn Component>> {
            vec![Arc::new(Step("post"))]
        }

        async fn sync(&self, _ctx: SyncContext) -> CapabilityResult<()> {
            Ok(())
        }
    }

    fn table() -> RegistrationTable {
        let table = RegistrationTable::new();
        table.register_component("noop", Arc::new(Step("noop")));
        table.register_component("crash", Arc::new(Step("crash")));
        table.register_component("approval", Arc::new(Step("approval")));
        table.register_trigger("start", Arc::new(Step("start")));
        table.register_integration("ci", Arc::new(Ci));
        table.register_application("chat", Arc::new(Chat));
        table.register_widget("annotation", Arc::new(Step("annotation")));
        table
    }

    fn registry(table: &RegistrationTable) -> Registry {
        Registry::from_table(table, Arc::new(NoOpEncryptor))
    }

    fn lookup_err<T>(result: Result<T, Report<RegistryError>>) -> RegistryError {
        match result {
            Ok(_) => panic!("lookup should fail"),
            Err(err) => err.current_context().clone(),
        }
    }

    #[test]
    fn flat_lookup() {
        let registry = registry(&table());
        assert_eq!(registry.get_component("noop").unwrap().name(), "noop");
        assert_eq!(registry.get_trigger("start").unwrap().name(), "start");
        assert_eq!(registry.get_widget("annotation").unwrap().name(), "annotation");
        assert_eq!(registry.get_integration("ci").unwrap().label(), "CI");
        assert_eq!(registry.get_application("chat").unwrap().label(), "Chat");

        assert_eq!(
            lookup_err(registry.get_component("missing")),
            RegistryError::NotFound {
                kind: Kind::Component,
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn qualified_lookup_through_integration_and_application() {
        let registry = registry(&table());
        assert_eq!(registry.get_component("ci.deploy").unwrap().name(), "deploy");
        assert_eq!(registry.get_trigger("ci.on_push").unwrap().name(), "on_push");
        assert_eq!(registry.get_component("chat.post").unwrap().name(), "post");
    }

    #[test]
    fn qualified_lookup_failures() {
        let registry = registry(&table());

        let err = lookup_err(registry.get_component("a.b.c"));
        assert!(matches!(err, RegistryError::NameFormat { .. }));

        let err = lookup_err(registry.get_component("jira.create"));
        assert!(matches!(&err, RegistryError::ScopeNotFound { scope } if scope == "jira"));
        assert!(err.is_not_found());

        let err = lookup_err(registry.get_component("ci.rollback"));
        assert!(matches!(
            &err,
            RegistryError::NotFound { kind: Kind::Component, name } if name == "ci.rollback"
        ));

        assert!(lookup_err(registry.get_trigger("chat.on_message")).is_not_found());
    }

    #[test]
    fn listings_are_sorted_by_name() {
        let registry = registry(&table());
        let names: Vec<_> = registry
            .list_components()
            .map(|component| component.name().to_string())
            .collect();
        assert_eq!(names, ["approval", "crash", "noop"]);
        assert_eq!(registry.list_widgets().count(), 1);
        assert_eq!(registry.list_integrations().count(), 1);
        assert_eq!(registry.list_applications().count(), 1);
        assert_eq!(registry.list_triggers().count(), 1);
    }

    #[test]
    fn later_registrations_are_invisible_to_snapshot() {
        let table = table();
        let before = registry(&table);

        table.register_component("late", Arc::new(Step("late")));

        assert!(before.get_component("late").is_err());
        assert!(registry(&table).get_component("late").is_ok());
        assert!(table.component("late").is_some());
    }

    #[tokio::test]
    async fn registered_components_are_isolated() {
        let registry = registry(&table());

        let err = registry
            .get_component("crash")
            .unwrap()
            .execute(testing::execution_context())
            .await
            .unwrap_err();
        assert!(err.current_context().is_abnormal_termination());

        let nested = registry.get_component("ci.crash").unwrap();
        let err = nested.execute(testing::execution_context()).await.unwrap_err();
        assert_eq!(
            err.current_context().to_string(),
            "crash panicked in execute(): step crashed"
        );
    }

    #[test]
    fn only_behaviour_carrying_capabilities_are_wrapped() {
        let table = table();
        let registry = registry(&table);

        let widget = registry.get_widget("annotation").unwrap();
        assert!(Arc::ptr_eq(&widget, &table.widget("annotation").unwrap()));

        let component = registry.get_component("noop").unwrap();
        assert!(!Arc::ptr_eq(&component, &table.component("noop").unwrap()));
        let trigger = registry.get_trigger("start").unwrap();
        assert!(!Arc::ptr_eq(&trigger, &table.trigger("start").unwrap()));
    }

    struct Hooks;

    #[async_trait]
    impl WebhookHandler for Hooks {
        async fn setup(
            &self,
            _ctx: WebhookSetupContext,
        ) -> CapabilityResult<Option<serde_json::Value>> {
            panic!("remote rejected webhook");
        }

        async fn cleanup(&self, _ctx: WebhookSetupContext) -> CapabilityResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn webhook_handlers_are_keyed_by_integration() {
        let table = table();
        assert!(registry(&table).get_webhook_handler("ci").is_none());

        table.register_integration_with_webhook_handler("ci", Arc::new(Ci), Arc::new(Hooks));
        let registry = registry(&table);
        let handler = registry.get_webhook_handler("ci").unwrap();

        let err = handler.setup(testing::webhook_setup_context()).await.unwrap_err();
        assert_eq!(
            err.current_context().to_string(),
            "ci panicked in setup(): remote rejected webhook"
        );
    }
}
