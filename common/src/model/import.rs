//! Bulk spreadsheet import: entity kinds, expected columns and job records.
//!
//! The upload endpoint stores the raw file in the import bucket and creates an
//! [`ImportJob`]. A background job then checks every data row against the
//! [`ImportColumn`]s of the chosen [`ImportEntityType`] and persists the rows
//! that pass. Rows that fail are reported as [`RowError`]s without aborting the
//! whole import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value kind expected in a column. Drives per-cell validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Email,
    Number,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportColumn {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

const fn col(name: &'static str, kind: ColumnKind, required: bool) -> ImportColumn {
    ImportColumn {
        name,
        kind,
        required,
    }
}

const CLIENT_COLUMNS: &[ImportColumn] = &[
    col("name", ColumnKind::Text, true),
    col("email", ColumnKind::Email, false),
    col("phone", ColumnKind::Text, false),
    col("siret", ColumnKind::Text, false),
];

const EMPLOYEE_COLUMNS: &[ImportColumn] = &[
    col("full_name", ColumnKind::Text, true),
    col("email", ColumnKind::Email, true),
    col("hourly_rate", ColumnKind::Number, false),
];

const PROJECT_COLUMNS: &[ImportColumn] = &[
    col("name", ColumnKind::Text, true),
    col("client_name", ColumnKind::Text, false),
    col("start_date", ColumnKind::Date, false),
];

const TIME_ENTRY_COLUMNS: &[ImportColumn] = &[
    col("employee_email", ColumnKind::Email, true),
    col("date", ColumnKind::Date, true),
    col("hours", ColumnKind::Number, true),
    col("project_name", ColumnKind::Text, false),
    col("description", ColumnKind::Text, false),
];

const SUPPLIER_COLUMNS: &[ImportColumn] = &[
    col("name", ColumnKind::Text, true),
    col("siret", ColumnKind::Text, false),
    col("email", ColumnKind::Email, false),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportEntityType {
    Clients,
    Employees,
    Projects,
    TimeEntries,
    Suppliers,
}

impl ImportEntityType {
    pub const ALL: [ImportEntityType; 5] = [
        ImportEntityType::Clients,
        ImportEntityType::Employees,
        ImportEntityType::Projects,
        ImportEntityType::TimeEntries,
        ImportEntityType::Suppliers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportEntityType::Clients => "clients",
            ImportEntityType::Employees => "employees",
            ImportEntityType::Projects => "projects",
            ImportEntityType::TimeEntries => "time_entries",
            ImportEntityType::Suppliers => "suppliers",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImportEntityType::Clients => "Clients",
            ImportEntityType::Employees => "Employees",
            ImportEntityType::Projects => "Projects",
            ImportEntityType::TimeEntries => "Time entries",
            ImportEntityType::Suppliers => "Suppliers",
        }
    }

    /// Columns the uploaded sheet must (or may) contain, in template order.
    pub fn columns(&self) -> &'static [ImportColumn] {
        match self {
            ImportEntityType::Clients => CLIENT_COLUMNS,
            ImportEntityType::Employees => EMPLOYEE_COLUMNS,
            ImportEntityType::Projects => PROJECT_COLUMNS,
            ImportEntityType::TimeEntries => TIME_ENTRY_COLUMNS,
            ImportEntityType::Suppliers => SUPPLIER_COLUMNS,
        }
    }
}

impl std::str::FromStr for ImportEntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImportEntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown import entity type '{}'", s))
    }
}

/// Normalizes a sheet header cell so `"Full Name"`, `"full-name"` and
/// `" full_name "` all map to `full_name`.
pub fn normalize_header(cell: &str) -> String {
    cell.trim()
        .trim_matches('"')
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Persisted lifecycle of an import job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportJobState {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl ImportJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportJobState::Pending => "pending",
            ImportJobState::Processing => "processing",
            ImportJobState::Completed => "completed",
            ImportJobState::CompletedWithErrors => "completed_with_errors",
            ImportJobState::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ImportJobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImportJobState::Pending),
            "processing" => Ok(ImportJobState::Processing),
            "completed" => Ok(ImportJobState::Completed),
            "completed_with_errors" => Ok(ImportJobState::CompletedWithErrors),
            "failed" => Ok(ImportJobState::Failed),
            other => Err(format!("unknown import job state '{}'", other)),
        }
    }
}

/// A data row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// 1-based line number in the sheet, header included.
    pub row: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

/// Outcome of a finished import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_rows: u32,
    pub imported_rows: u32,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn final_state(&self) -> ImportJobState {
        if self.errors.is_empty() {
            ImportJobState::Completed
        } else {
            ImportJobState::CompletedWithErrors
        }
    }
}

/// Entry of the "recent imports" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub id: Uuid,
    pub entity_type: ImportEntityType,
    pub file_name: String,
    /// Location of the raw file inside the import bucket.
    pub object_path: String,
    pub checksum: String,
    pub state: ImportJobState,
    pub total_rows: u32,
    pub imported_rows: u32,
    pub error_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAccepted {
    pub job_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header(" Full Name "), "full_name");
        assert_eq!(normalize_header("\"employee-email\""), "employee_email");
    }

    #[test]
    fn entity_type_round_trips_through_str() {
        for t in ImportEntityType::ALL {
            assert_eq!(t.as_str().parse::<ImportEntityType>(), Ok(t));
        }
        assert!("invoices".parse::<ImportEntityType>().is_err());
    }

    #[test]
    fn every_entity_has_a_required_column() {
        for t in ImportEntityType::ALL {
            assert!(t.columns().iter().any(|c| c.required), "{:?}", t);
        }
    }

    #[test]
    fn report_state_reflects_row_errors() {
        let mut report = ImportReport {
            total_rows: 2,
            imported_rows: 2,
            errors: vec![],
        };
        assert_eq!(report.final_state(), ImportJobState::Completed);
        report.errors.push(RowError {
            row: 3,
            column: Some("email".into()),
            message: "invalid email".into(),
        });
        assert_eq!(report.final_state(), ImportJobState::CompletedWithErrors);
    }
}
