//! Webhook trigger.
//!
//! Accepts JSON deliveries posted to `/webhooks/{node_id}` and emits one
//! event per delivery. The shared secret, when configured, never leaves this
//! module.

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use switchyard_capability::{
    Capability, CapabilityResult, ConfigurationField, FieldType, SetupContext, Trigger,
    WebhookContext,
};
use tracing::debug;

pub const NAME: &str = "webhook";

/// Event type emitted for each accepted delivery.
pub const RECEIVED_EVENT: &str = "webhook.received";

/// Header carrying the shared secret, when one is configured.
pub const SECRET_HEADER: &str = "x-webhook-secret";

/// Trigger fired by POST requests to the node's webhook URL.
pub struct WebhookTrigger;

impl Capability for WebhookTrigger {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        "Webhook"
    }

    fn icon(&self) -> &str {
        "webhook"
    }

    fn description(&self) -> &str {
        "Start a new execution when a request is posted to the webhook URL"
    }

    fn configuration(&self) -> Vec<ConfigurationField> {
        vec![
            ConfigurationField::new("secret", "Secret", FieldType::String)
                .with_default(json!(""))
                .with_description("Deliveries must send it in the X-Webhook-Secret header"),
        ]
    }
}

#[async_trait]
impl Trigger for WebhookTrigger {
    async fn setup(&self, ctx: SetupContext) -> CapabilityResult<()> {
        ctx.metadata.set(json!({"path": format!("/webhooks/{}", ctx.node_id)}));
        Ok(())
    }

    async fn handle_webhook(&self, ctx: WebhookContext) -> CapabilityResult<u16> {
        let request = &ctx.request;
        if !request.method.eq_ignore_ascii_case("POST") {
            return Ok(405);
        }

        let secret = ctx
            .configuration
            .get("secret")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        if !secret.is_empty() && request.header(SECRET_HEADER) != Some(secret) {
            debug!(node_id = %ctx.node_id, "webhook secret mismatch");
            return Ok(403);
        }

        let body = if request.body.is_empty() {
            JsonValue::Null
        } else {
            match serde_json::from_slice(&request.body) {
                Ok(body) => body,
                Err(_) => return Ok(400),
            }
        };

        let mut headers = request.headers.clone();
        headers.remove(SECRET_HEADER);
        ctx.events.emit(RECEIVED_EVENT, json!({"headers": headers, "body": body}));
        Ok(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use switchyard_capability::IncomingRequest;

    fn delivery(secret: Option<&str>) -> IncomingRequest {
        let request =
            IncomingRequest::new("POST", "/webhooks/n1").with_body(r#"{"action":"opened"}"#);
        match secret {
            Some(secret) => request.with_header("X-Webhook-Secret", secret),
            None => request,
        }
    }

    #[tokio::test]
    async fn accepts_post_and_emits_event() {
        let ctx = testing::webhook_context(json!({}), delivery(None));
        let events = ctx.events.clone();

        assert_eq!(WebhookTrigger.handle_webhook(ctx).await.unwrap(), 200);

        let events = events.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, RECEIVED_EVENT);
        assert_eq!(events[0].1["body"], json!({"action": "opened"}));
    }

    #[tokio::test]
    async fn rejects_other_methods() {
        let request = IncomingRequest::new("GET", "/webhooks/n1");
        let ctx = testing::webhook_context(json!({}), request);
        let events = ctx.events.clone();

        assert_eq!(WebhookTrigger.handle_webhook(ctx).await.unwrap(), 405);
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn checks_configured_secret() {
        let config = json!({"secret": "s3cret"});

        let ctx = testing::webhook_context(config.clone(), delivery(Some("wrong")));
        assert_eq!(WebhookTrigger.handle_webhook(ctx).await.unwrap(), 403);

        let ctx = testing::webhook_context(config, delivery(Some("s3cret")));
        assert_eq!(WebhookTrigger.handle_webhook(ctx).await.unwrap(), 200);
    }

    #[tokio::test]
    async fn secret_is_not_forwarded_downstream() {
        let request = delivery(Some("s3cret")).with_header("X-GitHub-Event", "push");
        let ctx = testing::webhook_context(json!({"secret": "s3cret"}), request);
        let events = ctx.events.clone();

        assert_eq!(WebhookTrigger.handle_webhook(ctx).await.unwrap(), 200);

        let events = events.events();
        let headers = events[0].1["headers"].as_object().unwrap();
        assert!(!headers.contains_key(SECRET_HEADER));
        assert_eq!(headers["x-github-event"], "push");
        assert!(!events[0].1.to_string().contains("s3cret"));
    }

    #[tokio::test]
    async fn rejects_malformed_body() {
        let request = IncomingRequest::new("POST", "/webhooks/n1").with_body("not json");
        let ctx = testing::webhook_context(json!({}), request);
        assert_eq!(WebhookTrigger.handle_webhook(ctx).await.unwrap(), 400);
    }

    #[tokio::test]
    async fn setup_records_webhook_path() {
        let ctx = testing::setup_context(json!({}));
        let metadata = ctx.metadata.clone();
        WebhookTrigger.setup(ctx).await.unwrap();
        assert_eq!(metadata.get()["path"], "/webhooks/n1");
    }
}
