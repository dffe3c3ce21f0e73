//! Schema validation helpers.
//!
//! Validates a `serde_json::Value` configuration against a [`Schema`],
//! including the attribute [`Validator`]s, and reports problems as
//! [`Diagnostic`]s. Every resource and data source runs this before it talks
//! to the Replicate API, so malformed configuration never leaves the process.
//!
//! # Example
//!
//! ```
//! use replicate_provider::schema::{Attribute, Schema, Validator};
//! use replicate_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0().with_attribute(
//!     "model",
//!     Attribute::required_string()
//!         .with_validator(Validator::regex_matches("^[^/]+/[^/]+$", "must be owner/name")),
//! );
//!
//! assert!(validate(&schema, &json!({"model": "stability-ai/sdxl"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"model": "sdxl"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("model".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Diagnostic, Schema, Validator};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

/// Compiled validator patterns, keyed by source text.
static PATTERNS: LazyLock<Mutex<HashMap<String, Regex>>> = LazyLock::new(Default::default);

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (the provider sets these)
/// - Attribute types must match the schema
/// - Validators run on present values that passed the type check
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return diagnostics,
        other => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(other))),
            );
            return diagnostics;
        }
    };

    for name in schema.attribute_names() {
        if let Some(attr) = schema.attribute(name) {
            validate_attribute(attr, name, obj, &mut diagnostics);
        }
    }

    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
///
/// This is a convenience wrapper around [`validate`] that returns a Result.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

fn validate_attribute(
    attr: &Attribute,
    name: &str,
    root: &Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match root.get(name) {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", name))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(name),
                );
            }
        }
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, name, diagnostics);
            if diagnostics.len() == before {
                for validator in &attr.validators {
                    if let Some(diag) = run_validator(validator, name, v, root) {
                        diagnostics.push(diag);
                    }
                }
            }
        }
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        }
        AttributeType::Int64 => {
            if as_int64(value).is_none() {
                diagnostics.push(type_error(path, "int64", value));
            }
        }
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        }
        AttributeType::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                validate_object_type(attrs, obj, path, diagnostics);
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        }
    }
}

fn validate_object_type(
    attrs: &HashMap<String, AttributeType>,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        if let Some(value) = obj.get(name).filter(|v| !v.is_null()) {
            validate_attribute_type(attr_type, value, &format!("{}.{}", path, name), diagnostics);
        }
    }
}

fn run_validator(
    validator: &Validator,
    name: &str,
    value: &Value,
    root: &Map<String, Value>,
) -> Option<Diagnostic> {
    match validator {
        Validator::RegexMatches { pattern, message } => {
            let s = value.as_str()?;
            let re = match compiled(pattern) {
                Ok(re) => re,
                Err(e) => {
                    return Some(
                        Diagnostic::error("Invalid Validator Pattern")
                            .with_detail(format!(
                                "Pattern {:?} for attribute {} does not compile: {}. \
                                 Please report this issue to the provider developers.",
                                pattern, name, e
                            ))
                            .with_attribute(name),
                    )
                }
            };
            if re.is_match(s) {
                None
            } else {
                Some(
                    Diagnostic::error("Invalid Attribute Value Match")
                        .with_detail(format!("Attribute {} {}, got: {}", name, message, s))
                        .with_attribute(name),
                )
            }
        }
        Validator::AtLeast { min } => {
            let n = as_int64(value)?;
            if n >= *min {
                None
            } else {
                Some(
                    Diagnostic::error("Invalid Attribute Value")
                        .with_detail(format!(
                            "Attribute {} value must be at least {}, got: {}",
                            name, min, n
                        ))
                        .with_attribute(name),
                )
            }
        }
        Validator::AtLeastSumOf { attributes } => {
            let n = as_int64(value)?;
            let mut sum: i64 = 0;
            for other in attributes {
                // Unset or non-numeric siblings are reported by their own checks.
                let v = root.get(other).and_then(as_int64)?;
                sum = sum.saturating_add(v);
            }
            if n >= sum {
                None
            } else {
                Some(
                    Diagnostic::error("Invalid Attribute Value")
                        .with_detail(format!(
                            "Attribute {} value must be at least sum of {}, got: {}",
                            name,
                            attributes.join(" + "),
                            n
                        ))
                        .with_attribute(name),
                )
            }
        }
    }
}

// Helper functions

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Look up a pattern in the cache, compiling it on first use.
fn compiled(pattern: &str) -> Result<Regex, regex::Error> {
    let mut patterns = PATTERNS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(re) = patterns.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    patterns.insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// Read a JSON integer as an `i64`. Floats are rejected, even `1.0`, so that
/// anything validation accepts also decodes into the typed models.
fn as_int64(value: &Value) -> Option<i64> {
    value.as_i64()
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}
