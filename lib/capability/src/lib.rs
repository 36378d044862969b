//! Capability runtime for the switchyard platform.
//!
//! This crate provides:
//!
//! - **Capability traits**: Component, Trigger, Integration, Application,
//!   Widget and WebhookHandler contracts that pluggable implementations satisfy
//! - **Configuration schema**: the recursive field schema capabilities declare
//! - **Registration table**: process-wide, last-writer-wins name bindings
//! - **Fault isolation**: wrappers that turn a panicking capability call into
//!   an ordinary error
//! - **Registry**: an immutable, isolated snapshot used for lookups

pub mod capability;
pub mod configuration;
pub mod context;
pub mod encryptor;
pub mod error;
pub mod isolation;
pub mod name;
pub mod registry;
pub mod table;

#[cfg(test)]
mod testing;

pub use capability::{
    Action, Application, Capability, CapabilityKind, Component, Integration, IntegrationResource,
    Kind, OutputChannel, Trigger, WebhookHandler, Widget,
};
pub use configuration::{ConfigurationField, FieldOption, FieldType, TypeOptions};
pub use context::{
    ActionContext, EventSink, ExecutionContext, ExecutionOutcome, ExecutionState, Finish,
    HttpRequestContext, IncomingRequest, ListResourcesContext, Metadata, QueueItemContext,
    ResponseSink, Services, SetupContext, SyncContext, WebhookContext, WebhookSetupContext,
};
pub use encryptor::{EncryptionError, Encryptor, NoOpEncryptor};
pub use error::{CapabilityError, CapabilityResult, RegistryError};
pub use name::QualifiedName;
pub use registry::Registry;
pub use table::{
    RegistrationTable, register_application, register_component, register_integration,
    register_integration_with_webhook_handler, register_trigger, register_widget,
};
