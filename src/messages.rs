//! Fixed-locale error messages
//!
//! Evaluation errors are rendered as English text that does not depend on
//! the process or user locale, so the same schema and instance always give
//! byte-identical messages. Location is never part of the message; it is
//! carried separately on each violation.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;
use serde_json::Value;

/// Render one evaluation error as one or more messages.
///
/// Keywords that report several offending properties at once
/// (`additionalProperties`, `unevaluatedProperties`) yield one message per
/// property, in the order the evaluator reported them.
pub fn describe(error: &ValidationError<'_>) -> Vec<String> {
    match &error.kind {
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|property| {
                format!(
                    "property '{property}' is not defined in the schema and the schema does not allow additional properties"
                )
            })
            .collect(),
        ValidationErrorKind::UnevaluatedProperties { unexpected } => unexpected
            .iter()
            .map(|property| {
                format!(
                    "property '{property}' is not evaluated and the schema does not allow unevaluated properties"
                )
            })
            .collect(),
        _ => vec![describe_single(error)],
    }
}

fn describe_single(error: &ValidationError<'_>) -> String {
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            format!("required property '{}' not found", text(property))
        }
        ValidationErrorKind::Type { kind } => {
            let expected = match kind {
                TypeKind::Single(primitive) => primitive.to_string(),
                TypeKind::Multiple(primitives) => format!(
                    "[{}]",
                    primitives
                        .into_iter()
                        .map(|primitive| primitive.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            };
            format!("{} found, {} expected", json_type(&error.instance), expected)
        }
        ValidationErrorKind::Minimum { limit } => format!("must have a minimum value of {limit}"),
        ValidationErrorKind::Maximum { limit } => format!("must have a maximum value of {limit}"),
        ValidationErrorKind::ExclusiveMinimum { limit } => {
            format!("must have an exclusive minimum value of {limit}")
        }
        ValidationErrorKind::ExclusiveMaximum { limit } => {
            format!("must have an exclusive maximum value of {limit}")
        }
        ValidationErrorKind::MultipleOf { multiple_of } => format!("must be multiple of {multiple_of}"),
        ValidationErrorKind::MinLength { limit } => format!("must be at least {limit} characters long"),
        ValidationErrorKind::MaxLength { limit } => format!("must be at most {limit} characters long"),
        ValidationErrorKind::MinItems { limit } => {
            format!("must have at least {limit} items but found {}", array_len(&error.instance))
        }
        ValidationErrorKind::MaxItems { limit } => {
            format!("must have at most {limit} items but found {}", array_len(&error.instance))
        }
        ValidationErrorKind::MinProperties { limit } => format!("must have at least {limit} properties"),
        ValidationErrorKind::MaxProperties { limit } => format!("must have at most {limit} properties"),
        ValidationErrorKind::UniqueItems => "must have only unique items in the array".to_string(),
        ValidationErrorKind::Pattern { pattern } => format!("does not match the regex pattern {pattern}"),
        ValidationErrorKind::Format { format } => match format_rule(format) {
            Some(rule) => format!("does not match the {format} pattern {rule}"),
            None => format!("does not match the {format} pattern"),
        },
        ValidationErrorKind::Enum { options } => {
            format!("does not have a value in the enumeration {}", list(options))
        }
        ValidationErrorKind::Constant { expected_value } => {
            format!("must be the constant value '{}'", text(expected_value))
        }
        ValidationErrorKind::Not { schema } => format!("must not be valid to the schema {schema}"),
        ValidationErrorKind::AnyOf => "must be valid to any of the schemas".to_string(),
        ValidationErrorKind::OneOfNotValid => {
            "must be valid to one and only one schema, but 0 are valid".to_string()
        }
        ValidationErrorKind::OneOfMultipleValid => {
            "must be valid to one and only one schema, but more than one are valid".to_string()
        }
        ValidationErrorKind::Contains => {
            "does not contain an element that passes these validations".to_string()
        }
        ValidationErrorKind::PropertyNames { error: inner } => format!(
            "property '{}' name is not valid: {}",
            text(&inner.instance),
            describe_single(inner)
        ),
        ValidationErrorKind::FalseSchema => "Boolean schema false is not valid".to_string(),
        ValidationErrorKind::ContentEncoding { content_encoding } => {
            format!("does not match content encoding {content_encoding}")
        }
        ValidationErrorKind::ContentMediaType { .. } => "is not a content media type".to_string(),
        // Remote resolution is compiled out; only local references resolve
        ValidationErrorKind::Resolver { url, .. } => {
            format!("cannot resolve the referenced schema {url}")
        }
        _ => error.to_string(),
    }
}

/// JSON type name of an instance, telling integers apart from other numbers
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn format_rule(format: &str) -> Option<&'static str> {
    let rule = match format {
        "date" => "must be a valid RFC 3339 full-date",
        "date-time" => "must be a valid RFC 3339 date-time",
        "time" => "must be a valid RFC 3339 time",
        "duration" => "must be a valid ISO 8601 duration",
        "email" => "must be a valid RFC 5321 Mailbox",
        "idn-email" => "must be a valid RFC 6531 Mailbox",
        "hostname" => "must be a valid RFC 1123 host name",
        "ipv4" => "must be a valid RFC 2673 IP address",
        "ipv6" => "must be a valid RFC 4291 IP address",
        "uri" => "must be a valid RFC 3986 URI",
        "uri-reference" => "must be a valid RFC 3986 URI-reference",
        "uuid" => "must be a valid RFC 4122 UUID",
        "regex" => "must be a valid ECMA-262 regular expression",
        _ => return None,
    };
    Some(rule)
}

/// Strings unquoted, everything else as JSON
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn list(value: &Value) -> String {
    match value {
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(Value::to_string).collect::<Vec<_>>().join(", ")
        ),
        other => other.to_string(),
    }
}

fn array_len(value: &Value) -> usize {
    value.as_array().map_or(0, Vec::len)
}
