//! Configuration records for user-defined attributes attached to tasks and sites.
//!
//! A company configures its own extra columns (e.g. `badge_number` on a site,
//! `weather` on a task). Each column is described by a [`CustomFieldConfig`];
//! the full list for a company is replaced at once through
//! `PUT /api/custom-fields` (see `requests::UpdateCustomFieldsRequest`).

use crate::validation::error_at;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

/// Allowed shape of a field key: lower snake case, not starting with a digit.
pub static FIELD_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("field key pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    Text,
    Number,
    Date,
    Boolean,
    Select,
    Multiselect,
    Url,
    Gps,
}

impl CustomFieldType {
    /// Types whose values are picked from `options`.
    pub fn is_choice(&self) -> bool {
        matches!(self, CustomFieldType::Select | CustomFieldType::Multiselect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldScope {
    Task,
    Site,
}

impl CustomFieldScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomFieldScope::Task => "task",
            CustomFieldScope::Site => "site",
        }
    }
}

impl std::str::FromStr for CustomFieldScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(CustomFieldScope::Task),
            "site" => Ok(CustomFieldScope::Site),
            other => Err(format!("unknown custom field scope '{}'", other)),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One configured custom field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "options_match_type"))]
pub struct CustomFieldConfig {
    #[validate(
        length(min = 1, max = 50, message = "key must be 1 to 50 characters"),
        regex(
            path = *FIELD_KEY,
            message = "key must match [a-z_][a-z0-9_]*"
        )
    )]
    pub key: String,

    #[validate(length(min = 1, max = 100, message = "label must be 1 to 100 characters"))]
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: CustomFieldType,

    #[serde(default)]
    pub required: bool,

    pub scope: CustomFieldScope,

    #[serde(default = "default_true")]
    pub show_in_list: bool,

    #[serde(default = "default_true")]
    pub show_in_export: bool,

    #[serde(default)]
    #[validate(range(min = 0, message = "order must not be negative"))]
    pub order: i32,

    /// Choices for `select` / `multiselect`. May be empty; other types must omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "distinct_options"))]
    pub options: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
}

fn options_match_type(field: &CustomFieldConfig) -> Result<(), ValidationError> {
    if field.options.is_some() && !field.field_type.is_choice() {
        return Err(error_at(
            "options".to_string(),
            "options_not_allowed",
            "options are only allowed on select and multiselect fields".to_string(),
        ));
    }
    Ok(())
}

/// Options behave as a set: no blanks, no repeats.
fn distinct_options(options: &[String]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for option in options {
        if option.trim().is_empty() {
            return Err(ValidationError::new("blank_option").with_message("options must not be blank".into()));
        }
        if !seen.insert(option.as_str()) {
            return Err(ValidationError::new("duplicate_option")
                .with_message(format!("option '{}' is listed twice", option).into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(key: &str) -> CustomFieldConfig {
        serde_json::from_value(json!({
            "key": key,
            "label": "Badge",
            "type": "text",
            "scope": "site"
        }))
        .unwrap()
    }

    #[test]
    fn display_flags_default_to_true() {
        let f = field("badge_number");
        assert!(f.show_in_list);
        assert!(f.show_in_export);
        assert!(!f.required);
        assert_eq!(f.order, 0);
    }

    #[test]
    fn key_pattern() {
        assert!(field("badge_number").validate().is_ok());
        assert!(field("_internal2").validate().is_ok());
        assert!(field("2fast").validate().is_err());
        assert!(field("Badge").validate().is_err());
        assert!(field("").validate().is_err());
    }

    #[test]
    fn unknown_type_does_not_deserialize() {
        let parsed = serde_json::from_value::<CustomFieldConfig>(json!({
            "key": "k", "label": "K", "type": "color", "scope": "task"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn repeated_options_rejected() {
        let mut f = field("level");
        f.field_type = CustomFieldType::Select;
        f.options = Some(vec!["low".into(), "low".into()]);
        assert!(f.validate().is_err());
        f.options = Some(vec!["low".into(), "high".into()]);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn options_only_on_choice_types() {
        let mut f = field("weather");
        f.options = Some(vec!["sunny".into(), "rainy".into()]);
        let failure = crate::validation::check(&f).unwrap_err();
        assert!(failure.has_field("options"), "{:?}", failure);

        f.field_type = CustomFieldType::Multiselect;
        assert!(f.validate().is_ok());
        f.options = Some(vec![]);
        assert!(f.validate().is_ok());
        f.field_type = CustomFieldType::Select;
        f.options = None;
        assert!(f.validate().is_ok());
    }
}
