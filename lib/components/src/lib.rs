//! Built-in capabilities shipped with switchyard.
//!
//! - `noop`: passes its input through
//! - `http`: sends a request through the egress context
//! - `start`: manually started trigger
//! - `webhook`: trigger fired by inbound POST requests
//! - `annotation`: canvas note widget

pub mod annotation;
pub mod http;
pub mod noop;
pub mod start;
pub mod webhook;

#[cfg(test)]
mod testing;

pub use annotation::Annotation;
pub use http::HttpRequest;
pub use noop::Noop;
pub use start::StartTrigger;
pub use webhook::WebhookTrigger;

use std::sync::Arc;
use switchyard_capability::RegistrationTable;

/// Registers every built-in capability in the process-wide table.
pub fn register_builtins() {
    register_into(RegistrationTable::global());
}

/// Registers every built-in capability in the given table.
pub fn register_into(table: &RegistrationTable) {
    table.register_component(noop::NAME, Arc::new(Noop));
    table.register_component(http::NAME, Arc::new(HttpRequest));
    table.register_trigger(start::NAME, Arc::new(StartTrigger));
    table.register_trigger(webhook::NAME, Arc::new(WebhookTrigger));
    table.register_widget(annotation::NAME, Arc::new(Annotation));
}
