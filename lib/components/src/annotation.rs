use serde_json::json;
use switchyard_capability::{Capability, ConfigurationField, FieldOption, FieldType, Widget};

pub const NAME: &str = "annotation";

/// A sticky note on the canvas.
pub struct Annotation;

impl Capability for Annotation {
    fn name(&self) -> &str {
        NAME
    }

    fn label(&self) -> &str {
        "Annotation"
    }

    fn icon(&self) -> &str {
        "sticky-note"
    }

    fn description(&self) -> &str {
        "Leave a note on the canvas"
    }

    fn configuration(&self) -> Vec<ConfigurationField> {
        let colors = ["yellow", "blue", "green", "red"]
            .into_iter()
            .map(|c| FieldOption::new(c, c))
            .collect();
        vec![
            ConfigurationField::new("text", "Text", FieldType::Textarea).with_default(json!("")),
            ConfigurationField::new("color", "Color", FieldType::Select)
                .with_default(json!("yellow"))
                .with_options(colors),
        ]
    }
}

impl Widget for Annotation {}
