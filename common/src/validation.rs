//! Field-level validation failures as returned by the API.
//!
//! DTOs derive `validator::Validate`; [`check`] runs the rules and flattens
//! `validator`'s nested error tree into a list of `{ field, message }` pairs
//! whose `field` is a path such as `fields[2].key`.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// Key under which `validator` files struct-level (schema) errors.
const SCHEMA_KEY: &str = "__all__";

/// Path used when the error concerns the payload as a whole.
pub const BODY_FIELD: &str = "body";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// JSON body of every `400` returned for a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub error: String,
    pub fields: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self {
            error: "validation".to_string(),
            fields,
        }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn from_errors(errors: &ValidationErrors) -> Self {
        let mut fields = Vec::new();
        flatten("", errors, &mut fields);
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Self::new(fields)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "invalid request ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationFailure {}

/// Runs the `Validate` rules of `value`.
pub fn check<T: Validate>(value: &T) -> Result<(), ValidationFailure> {
    value.validate().map_err(|e| ValidationFailure::from_errors(&e))
}

/// Builds an error that reports against `field` (relative to the struct it is
/// raised on) instead of the struct as a whole. Used by schema-level rules.
pub fn error_at(field: String, code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code).with_message(message.into());
    err.add_param("field".into(), &field);
    err
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn flatten(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (name, kind) in errors.errors() {
        let name: &str = name;
        let path = join(prefix, name);
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let field = match err.params.get("field").and_then(|v| v.as_str()) {
                        Some(explicit) => join(prefix, explicit),
                        None if name == SCHEMA_KEY && prefix.is_empty() => BODY_FIELD.to_string(),
                        None if name == SCHEMA_KEY => prefix.to_string(),
                        None => path.clone(),
                    };
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", err.code));
                    out.push(FieldError { field, message });
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}
