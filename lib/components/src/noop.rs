use async_trait::async_trait;
use switchyard_capability::capability::DEFAULT_OUTPUT_CHANNEL;
use switchyard_capability::{Capability, CapabilityResult, Component, ExecutionContext};

pub const NAME: &str = "noop";

/// Emits its input unchanged on the default channel.
pub struct Noop;

impl Capability for Noop {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        "No Operation"
    }

    fn icon(&self) -> &str {
        "circle-dashed"
    }

    fn description(&self) -> &str {
        "Passes its input through unchanged"
    }
}

#[async_trait]
impl Component for Noop {
    async fn execute(&self, ctx: ExecutionContext) -> CapabilityResult<()> {
        ctx.state.emit(DEFAULT_OUTPUT_CHANNEL, vec![ctx.input]);
        Ok(())
    }
}
