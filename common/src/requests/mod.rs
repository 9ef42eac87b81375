//! Request payloads accepted by the REST API.
//!
//! Every DTO derives `Validate`; the backend runs the rules in its extractor
//! before the handler is called, so handlers can rely on them.

use crate::model::custom_field::CustomFieldConfig;
use crate::model::export::{DashboardExportType, ExportFormat};
use crate::model::import::ImportEntityType;
use crate::validation::error_at;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const MAX_BULK_IDS: usize = 500;
pub const MAX_CUSTOM_FIELDS: usize = 100;

/// `YYYY-MM` with a real month number.
pub static MONTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("month pattern"));

/// Replaces the custom field configuration of the company.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "unique_field_keys"))]
pub struct UpdateCustomFieldsRequest {
    #[validate(nested)]
    pub fields: Vec<CustomFieldConfig>,
}

fn unique_field_keys(req: &UpdateCustomFieldsRequest) -> Result<(), ValidationError> {
    if req.fields.len() > MAX_CUSTOM_FIELDS {
        return Err(error_at(
            "fields".to_string(),
            "too_many",
            format!("at most {} custom fields can be configured", MAX_CUSTOM_FIELDS),
        ));
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, field) in req.fields.iter().enumerate() {
        if let Some(first) = seen.insert(field.key.as_str(), index) {
            return Err(error_at(
                format!("fields[{}].key", index),
                "duplicate_key",
                format!("key '{}' is already used by fields[{}]", field.key, first),
            ));
        }
    }
    Ok(())
}

/// Marks a batch of time entries as validated.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkValidateTimeEntriesRequest {
    #[validate(
        length(min = 1, max = 500, message = "between 1 and 500 ids are required"),
        custom(function = "distinct_ids")
    )]
    pub ids: Vec<Uuid>,
}

fn distinct_ids(ids: &[Uuid]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(**id)) {
        Some(id) => Err(ValidationError::new("duplicate_id")
            .with_message(format!("id {} is listed twice", id).into())),
        None => Ok(()),
    }
}

/// Body of `POST /api/timesheets/export`.
///
/// `date_from` after `date_to` is accepted here and simply yields an empty export.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetExportRequest {
    #[serde(default)]
    pub employee_id: Option<Uuid>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTimesheetQuery {
    pub employee_id: Uuid,
    #[validate(regex(path = *MONTH_PATTERN, message = "month must be formatted YYYY-MM"))]
    pub month: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTimesheetQuery {
    pub employee_id: Uuid,
    /// Any day of the wanted week.
    pub week_start: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamTimesheetQuery {
    pub manager_id: Uuid,
    pub date: NaiveDate,
}

/// Body of `POST /api/dashboard/export`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DashboardExportRequest {
    #[serde(rename = "type")]
    pub kind: DashboardExportType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "content must be 1 to 4000 characters"))]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "fileUrl must be a URL"))]
    pub file_url: Option<String>,
}

/// `?conversationId=` of the realtime stream endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeQuery {
    pub conversation_id: Uuid,
}

/// `meta` part of the multipart import upload. Must precede the `file` part.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportUploadMeta {
    pub entity_type: ImportEntityType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::check;
    use serde_json::json;

    fn field_json(key: &str) -> serde_json::Value {
        json!({ "key": key, "label": key, "type": "text", "scope": "task" })
    }

    #[test]
    fn custom_fields_with_unknown_type_are_rejected() {
        let body = json!({ "fields": [
            field_json("a"),
            { "key": "b", "label": "B", "type": "colour", "scope": "task" }
        ]});
        assert!(serde_json::from_value::<UpdateCustomFieldsRequest>(body).is_err());
    }

    #[test]
    fn nested_field_errors_carry_their_index() {
        let req: UpdateCustomFieldsRequest =
            serde_json::from_value(json!({ "fields": [field_json("ok"), field_json("Bad Key")] })).unwrap();
        let failure = check(&req).unwrap_err();
        assert!(failure.has_field("fields[1].key"), "{:?}", failure);
    }

    #[test]
    fn duplicate_keys_are_reported_on_the_second_occurrence() {
        let req: UpdateCustomFieldsRequest =
            serde_json::from_value(json!({ "fields": [field_json("site"), field_json("site")] })).unwrap();
        let failure = check(&req).unwrap_err();
        assert!(failure.has_field("fields[1].key"), "{:?}", failure);
    }

    #[test]
    fn bulk_validate_bounds() {
        let ids = |n: usize| BulkValidateTimeEntriesRequest {
            ids: (0..n).map(|_| Uuid::new_v4()).collect(),
        };
        assert!(check(&ids(0)).is_err());
        assert!(check(&ids(1)).is_ok());
        assert!(check(&ids(MAX_BULK_IDS)).is_ok());
        let failure = check(&ids(MAX_BULK_IDS + 1)).unwrap_err();
        assert!(failure.has_field("ids"));
    }

    #[test]
    fn text_field_with_options_is_reported_on_its_index() {
        let mut with_options = field_json("weather");
        with_options["options"] = json!(["sunny", "rainy"]);
        let req: UpdateCustomFieldsRequest =
            serde_json::from_value(json!({ "fields": [field_json("ok"), with_options] })).unwrap();
        let failure = check(&req).unwrap_err();
        assert!(failure.has_field("fields[1].options"), "{:?}", failure);
    }

    #[test]
    fn bulk_validate_rejects_repeated_ids() {
        let id = Uuid::new_v4();
        let req = BulkValidateTimeEntriesRequest { ids: vec![id, Uuid::new_v4(), id] };
        let failure = check(&req).unwrap_err();
        assert!(failure.has_field("ids"), "{:?}", failure);
    }

    #[test]
    fn bulk_validate_rejects_malformed_ids() {
        let body = json!({ "ids": ["not-a-uuid"] });
        assert!(serde_json::from_value::<BulkValidateTimeEntriesRequest>(body).is_err());
    }

    #[test]
    fn timesheet_export_accepts_inverted_range_but_not_unknown_format() {
        let req: TimesheetExportRequest =
            serde_json::from_value(json!({ "dateFrom": "2024-03-01", "dateTo": "2024-02-01" })).unwrap();
        assert!(check(&req).is_ok());
        assert_eq!(req.format, ExportFormat::Csv);

        let bad = json!({ "dateFrom": "2024-02-01", "dateTo": "2024-03-01", "format": "xlsx" });
        assert!(serde_json::from_value::<TimesheetExportRequest>(bad).is_err());
    }

    #[test]
    fn monthly_query_requires_year_month() {
        let q = |month: &str| MonthlyTimesheetQuery {
            employee_id: Uuid::new_v4(),
            month: month.to_string(),
        };
        assert!(check(&q("2024-02")).is_ok());
        assert!(check(&q("13-2024")).is_err());
        assert!(check(&q("2024-13")).is_err());
        assert!(check(&q("2024-2")).is_err());
    }

    #[test]
    fn login_distinguishes_malformed_email() {
        let req = LoginRequest {
            email: "nobody".into(),
            password: "secret".into(),
        };
        assert!(check(&req).unwrap_err().has_field("email"));
    }
}
