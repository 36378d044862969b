//! Configuration schema checks.
//!
//! [`validate_schema`] checks a schema definition itself, when a capability
//! author declares one. [`validate_configuration`] checks a node's
//! configuration against a schema during compilation.

use crate::error::{CompileError, SchemaError};
use rootcause::Report;
use serde_json::{Map, Value as JsonValue};
use switchyard_capability::{ConfigurationField, FieldType};

/// Checks that every field in a schema definition is well formed, including
/// nested object and array item schemas.
///
/// # Errors
///
/// Returns the first malformed field. Nested fields are named by their
/// dotted path.
pub fn validate_schema(fields: &[ConfigurationField]) -> Result<(), Report<SchemaError>> {
    validate_fields(fields, None)
}

fn validate_fields(
    fields: &[ConfigurationField],
    parent: Option<&str>,
) -> Result<(), Report<SchemaError>> {
    for (index, field) in fields.iter().enumerate() {
        if field.name.is_empty() {
            return Err(SchemaError::MissingName { index }.into());
        }
        let path = match parent {
            Some(parent) => format!("{parent}.{}", field.name),
            None => field.name.clone(),
        };

        if field.label.is_empty() {
            return Err(SchemaError::MissingLabel { field: path }.into());
        }
        if !field.required && field.default.is_none() {
            return Err(SchemaError::MissingDefault { field: path }.into());
        }

        match field.field_type {
            FieldType::Number if field.min().is_none() && field.max().is_none() => {
                return Err(SchemaError::MissingNumberBound { field: path }.into());
            }
            FieldType::Select | FieldType::MultiSelect if field.options().is_empty() => {
                return Err(SchemaError::MissingOptions { field: path }.into());
            }
            FieldType::Integration if field.integration_type().is_none() => {
                return Err(SchemaError::MissingIntegrationType { field: path }.into());
            }
            _ => {}
        }

        validate_fields(field.nested_schema(), Some(&path))?;
    }
    Ok(())
}

fn is_missing(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Checks a node's configuration against the schema of its capability.
///
/// Required fields must be present, not null and not an empty string. Values
/// of object fields, and object items of array fields, are checked against
/// their nested schema.
///
/// # Errors
///
/// Returns `MissingRequiredField` naming the node and the field's path.
pub fn validate_configuration(
    node_id: &str,
    schema: &[ConfigurationField],
    configuration: &Map<String, JsonValue>,
) -> Result<(), Report<CompileError>> {
    check_values(node_id, schema, configuration, None)
}

fn check_values(
    node_id: &str,
    schema: &[ConfigurationField],
    values: &Map<String, JsonValue>,
    parent: Option<&str>,
) -> Result<(), Report<CompileError>> {
    for field in schema {
        let path = match parent {
            Some(parent) => format!("{parent}.{}", field.name),
            None => field.name.clone(),
        };
        let value = values.get(&field.name);

        if field.required && is_missing(value) {
            return Err(CompileError::MissingRequiredField {
                node_id: node_id.to_string(),
                field: path,
            }
            .into());
        }

        let nested = field.nested_schema();
        if nested.is_empty() {
            continue;
        }
        match value {
            Some(JsonValue::Object(object)) => check_values(node_id, nested, object, Some(&path))?,
            Some(JsonValue::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    if let JsonValue::Object(object) = item {
                        check_values(node_id, nested, object, Some(&format!("{path}[{index}]")))?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchyard_capability::FieldOption;

    fn url_field() -> ConfigurationField {
        ConfigurationField::new("url", "URL", FieldType::Url).required()
    }

    fn headers_field() -> ConfigurationField {
        ConfigurationField::new("headers", "Headers", FieldType::Array)
            .with_default(json!([]))
            .with_array_items(
                FieldType::Object,
                vec![ConfigurationField::new("name", "Name", FieldType::String).required()],
            )
    }

    fn configuration(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn well_formed_schema_passes() {
        let schema = vec![
            url_field(),
            ConfigurationField::new("method", "Method", FieldType::Select)
                .with_default(json!("GET"))
                .with_options(vec![
                    FieldOption::new("GET", "GET"),
                    FieldOption::new("POST", "POST"),
                ]),
            ConfigurationField::new("timeout", "Timeout", FieldType::Number)
                .with_default(json!(30))
                .with_bounds(Some(1.0), Some(300.0)),
            ConfigurationField::new("installation", "Installation", FieldType::Integration)
                .required()
                .with_integration_type("github"),
            headers_field(),
        ];
        assert!(validate_schema(&schema).is_ok());
    }

    #[test]
    fn schema_rejects_missing_name_and_label() {
        let err = validate_schema(&[ConfigurationField::new("", "URL", FieldType::Url).required()])
            .unwrap_err();
        assert_eq!(err.current_context(), &SchemaError::MissingName { index: 0 });

        let err = validate_schema(&[ConfigurationField::new("url", "", FieldType::Url).required()])
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            SchemaError::MissingLabel { field } if field == "url"
        ));
    }

    #[test]
    fn optional_field_needs_default() {
        let err = validate_schema(&[ConfigurationField::new("note", "Note", FieldType::Text)])
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            SchemaError::MissingDefault { field } if field == "note"
        ));
    }

    #[test]
    fn typed_fields_need_their_options() {
        let number = ConfigurationField::new("retries", "Retries", FieldType::Number).required();
        let err = validate_schema(&[number]).unwrap_err();
        assert!(matches!(err.current_context(), SchemaError::MissingNumberBound { .. }));

        let select = ConfigurationField::new("events", "Events", FieldType::MultiSelect).required();
        let err = validate_schema(&[select]).unwrap_err();
        assert!(matches!(err.current_context(), SchemaError::MissingOptions { .. }));

        let integration =
            ConfigurationField::new("installation", "Installation", FieldType::Integration)
                .required();
        let err = validate_schema(&[integration]).unwrap_err();
        assert!(matches!(err.current_context(), SchemaError::MissingIntegrationType { .. }));
    }

    #[test]
    fn nested_schema_errors_use_dotted_path() {
        let field = ConfigurationField::new("auth", "Auth", FieldType::Object)
            .required()
            .with_object_schema(vec![
                ConfigurationField::new("token", "", FieldType::String).required(),
            ]);
        let err = validate_schema(&[field]).unwrap_err();
        assert!(matches!(
            err.current_context(),
            SchemaError::MissingLabel { field } if field == "auth.token"
        ));
    }

    #[test]
    fn required_field_must_be_present_and_non_empty() {
        let schema = vec![url_field()];
        for value in [json!({}), json!({"url": null}), json!({"url": ""})] {
            let err = validate_configuration("fetch", &schema, &configuration(value)).unwrap_err();
            assert_eq!(
                err.current_context(),
                &CompileError::MissingRequiredField {
                    node_id: "fetch".to_string(),
                    field: "url".to_string()
                }
            );
        }
        let valid = configuration(json!({"url": "https://example.com"}));
        assert!(validate_configuration("fetch", &schema, &valid).is_ok());
    }

    #[test]
    fn falsy_non_string_values_count_as_present() {
        let schema = vec![
            ConfigurationField::new("enabled", "Enabled", FieldType::Boolean).required(),
            ConfigurationField::new("count", "Count", FieldType::Number).required(),
        ];
        let config = configuration(json!({"enabled": false, "count": 0}));
        assert!(validate_configuration("n1", &schema, &config).is_ok());
    }

    #[test]
    fn nested_configuration_is_checked() {
        let schema = vec![headers_field()];
        let config = configuration(json!({"headers": [{"name": "Accept"}, {"name": ""}]}));
        let err = validate_configuration("fetch", &schema, &config).unwrap_err();
        assert!(matches!(
            err.current_context(),
            CompileError::MissingRequiredField { field, .. } if field == "headers[1].name"
        ));

        assert!(validate_configuration("fetch", &schema, &configuration(json!({}))).is_ok());
    }
}
