use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use switchyard_capability::{
    Action, ActionContext, Capability, CapabilityError, CapabilityResult, ConfigurationField,
    FieldType, Trigger,
};

pub const NAME: &str = "start";

pub const RUN_ACTION: &str = "run";

/// Event type emitted when a user starts a run.
pub const RUN_EVENT: &str = "start.run";

/// Trigger that users fire by hand from the canvas.
pub struct StartTrigger;

impl Capability for StartTrigger {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        "Manual Run"
    }

    fn icon(&self) -> &str {
        "play"
    }

    fn description(&self) -> &str {
        "Start a new execution manually"
    }

    fn configuration(&self) -> Vec<ConfigurationField> {
        vec![
            ConfigurationField::new("payload", "Default payload", FieldType::Object)
                .with_default(json!({}))
                .with_description("Used when a run is started without parameters"),
        ]
    }
}

#[async_trait]
impl Trigger for StartTrigger {
    fn actions(&self) -> Vec<Action> {
        vec![Action::new(RUN_ACTION, "Start a new execution").user_accessible()]
    }

    async fn handle_action(&self, ctx: ActionContext) -> CapabilityResult<()> {
        if ctx.action != RUN_ACTION {
            return Err(CapabilityError::NotSupported {
                operation: format!("action {}", ctx.action),
            }
            .into());
        }

        let payload = match ctx.parameters {
            JsonValue::Null => ctx
                .configuration
                .get("payload")
                .cloned()
                .unwrap_or_else(|| json!({})),
            parameters => parameters,
        };
        ctx.events.emit(RUN_EVENT, payload);
        Ok(())
    }
}
