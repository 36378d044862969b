//! Outbound HTTP request component.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use switchyard_capability::{
    Capability, CapabilityError, CapabilityResult, Component, ConfigurationField,
    ExecutionContext, FieldOption, FieldType, OutputChannel, SetupContext,
};
use switchyard_egress::{EgressContext, Method};
use tracing::debug;
use url::Url;

pub const NAME: &str = "http";

pub const SUCCESS_CHANNEL: &str = "success";
pub const FAILURE_CHANNEL: &str = "failure";

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RequestSpec {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<JsonValue>,
}

fn is_empty_body(body: &JsonValue) -> bool {
    match body {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn default_method() -> String {
    "GET".to_string()
}

impl RequestSpec {
    fn parse(
        configuration: &JsonValue,
        http: &EgressContext,
    ) -> CapabilityResult<(Self, Method, Url)> {
        let spec: Self = serde_json::from_value(configuration.clone()).map_err(|e| {
            CapabilityError::InvalidConfiguration {
                message: e.to_string(),
            }
        })?;
        let method = Method::from_bytes(spec.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            CapabilityError::InvalidConfiguration {
                message: format!("unsupported method: {}", spec.method),
            }
        })?;
        let url = Url::parse(&spec.url).map_err(|e| CapabilityError::InvalidConfiguration {
            message: format!("invalid url {}: {e}", spec.url),
        })?;
        http.policy()
            .check_url(&url)
            .map_err(|e| CapabilityError::InvalidConfiguration { message: e.to_string() })?;
        Ok((spec, method, url))
    }
}

/// Sends one request and emits the response status and body.
///
/// 2xx responses go out on `success`, everything else on `failure`.
/// Transport errors and egress rejections fail the execution.
pub struct HttpRequest;

impl Capability for HttpRequest {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        "HTTP Request"
    }

    fn icon(&self) -> &str {
        "globe"
    }

    fn description(&self) -> &str {
        "Sends an HTTP request to an external service"
    }

    fn configuration(&self) -> Vec<ConfigurationField> {
        let methods = ["GET", "POST", "PUT", "PATCH", "DELETE"]
            .into_iter()
            .map(|m| FieldOption::new(m, m))
            .collect();
        vec![
            ConfigurationField::new("url", "URL", FieldType::Url).required(),
            ConfigurationField::new("method", "Method", FieldType::Select)
                .with_default(json!("GET"))
                .with_options(methods),
            ConfigurationField::new("headers", "Headers", FieldType::Array)
                .with_default(json!([]))
                .with_array_items(
                    FieldType::Object,
                    vec![
                        ConfigurationField::new("name", "Name", FieldType::String).required(),
                        ConfigurationField::new("value", "Value", FieldType::String)
                            .with_default(json!("")),
                    ],
                ),
            ConfigurationField::new("body", "Body", FieldType::Object)
                .with_default(json!({}))
                .with_description("Sent as JSON unless empty"),
        ]
    }
}

#[async_trait]
impl Component for HttpRequest {
    fn output_channels(&self) -> Vec<OutputChannel> {
        vec![
            OutputChannel::new(SUCCESS_CHANNEL, "Success"),
            OutputChannel::new(FAILURE_CHANNEL, "Failure"),
        ]
    }

    async fn setup(&self, ctx: SetupContext) -> CapabilityResult<()> {
        RequestSpec::parse(&ctx.configuration, &ctx.services.http)?;
        Ok(())
    }

    async fn execute(&self, ctx: ExecutionContext) -> CapabilityResult<()> {
        let http = &ctx.services.http;
        let (spec, method, url) = RequestSpec::parse(&ctx.configuration, http)?;

        let mut request = http.request(method, url);
        for header in &spec.headers {
            request = request.header(header.name.as_str(), header.value.as_str());
        }
        if let Some(body) = spec.body.as_ref().filter(|body| !is_empty_body(body)) {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CapabilityError::failed(e.current_context().to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CapabilityError::failed(e.current_context().to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(JsonValue::String(text));

        debug!(node_id = %ctx.node_id, status = status.as_u16(), "http request completed");

        let channel = if status.is_success() {
            SUCCESS_CHANNEL
        } else {
            FAILURE_CHANNEL
        };
        ctx.state
            .emit(channel, vec![json!({"status": status.as_u16(), "body": body})]);
        Ok(())
    }
}
