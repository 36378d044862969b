//! Configuration schema declared by capabilities.
//!
//! A capability's configuration is an ordered list of fields. Object and
//! array fields carry nested schemas, so the structure is recursive. The
//! serialized form is what API clients render forms from, and it round-trips
//! losslessly.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The type of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    String,
    Text,
    Textarea,
    Number,
    Boolean,
    Select,
    MultiSelect,
    Array,
    Object,
    Url,
    Date,
    Time,
    Cron,
    /// Reference to a connected integration of a given type.
    Integration,
    /// Reference to a resource exposed by an integration.
    Resource,
}

/// One selectable option of a select or multi-select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOptions {
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationOptions {
    /// The integration name this field accepts, e.g. `github`.
    #[serde(rename = "type")]
    pub integration_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOptions {
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Shape of each element of an array field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_label: Option<String>,
    pub item_type: FieldType,
    /// Schema of each item when `item_type` is `object`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_schema: Vec<ConfigurationField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectOptions {
    #[serde(default)]
    pub schema: Vec<ConfigurationField>,
}

/// Type-specific settings. Only the entry matching the field type is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<NumberOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<SelectOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_select: Option<SelectOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<IntegrationOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<ArrayOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectOptions>,
}

/// Schema for one configurable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationField {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_options: Option<TypeOptions>,
}

impl ConfigurationField {
    /// Creates an optional field with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            description: None,
            required: false,
            default: None,
            type_options: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets number bounds.
    #[must_use]
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.options_mut().number = Some(NumberOptions { min, max });
        self
    }

    /// Sets the options of a select or multi-select field.
    #[must_use]
    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        let select = Some(SelectOptions { options });
        if self.field_type == FieldType::MultiSelect {
            self.options_mut().multi_select = select;
        } else {
            self.options_mut().select = select;
        }
        self
    }

    #[must_use]
    pub fn with_integration_type(mut self, integration_type: impl Into<String>) -> Self {
        self.options_mut().integration = Some(IntegrationOptions {
            integration_type: integration_type.into(),
        });
        self
    }

    #[must_use]
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.options_mut().resource = Some(ResourceOptions {
            resource_type: resource_type.into(),
        });
        self
    }

    /// Sets the nested schema of an object field.
    #[must_use]
    pub fn with_object_schema(mut self, schema: Vec<ConfigurationField>) -> Self {
        self.options_mut().object = Some(ObjectOptions { schema });
        self
    }

    /// Sets the item shape of an array field.
    #[must_use]
    pub fn with_array_items(
        mut self,
        item_type: FieldType,
        item_schema: Vec<ConfigurationField>,
    ) -> Self {
        self.options_mut().array = Some(ArrayOptions {
            item_label: None,
            item_type,
            item_schema,
        });
        self
    }

    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.type_options.as_ref()?.number.as_ref()?.min
    }

    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.type_options.as_ref()?.number.as_ref()?.max
    }

    /// Options of a select or multi-select field; empty for other types.
    #[must_use]
    pub fn options(&self) -> &[FieldOption] {
        let Some(type_options) = &self.type_options else {
            return &[];
        };
        let select = match self.field_type {
            FieldType::Select => type_options.select.as_ref(),
            FieldType::MultiSelect => type_options.multi_select.as_ref(),
            _ => None,
        };
        select.map(|s| s.options.as_slice()).unwrap_or_default()
    }

    #[must_use]
    pub fn integration_type(&self) -> Option<&str> {
        self.type_options
            .as_ref()?
            .integration
            .as_ref()
            .map(|i| i.integration_type.as_str())
            .filter(|t| !t.is_empty())
    }

    /// Nested fields: the object schema, or the item schema of an array.
    #[must_use]
    pub fn nested_schema(&self) -> &[ConfigurationField] {
        let Some(type_options) = &self.type_options else {
            return &[];
        };
        match self.field_type {
            FieldType::Object => type_options
                .object
                .as_ref()
                .map(|o| o.schema.as_slice())
                .unwrap_or_default(),
            FieldType::Array => type_options
                .array
                .as_ref()
                .map(|a| a.item_schema.as_slice())
                .unwrap_or_default(),
            _ => &[],
        }
    }

    fn options_mut(&mut self) -> &mut TypeOptions {
        self.type_options.get_or_insert_with(TypeOptions::default)
    }
}
