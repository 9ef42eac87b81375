//! Downloadable exports: formats, dashboard export kinds and file naming.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Output format of an export. Only CSV is produced today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

/// What a dashboard export contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardExportType {
    TimeEntries,
    Projects,
    Invoices,
    Expenses,
}

impl DashboardExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardExportType::TimeEntries => "time-entries",
            DashboardExportType::Projects => "projects",
            DashboardExportType::Invoices => "invoices",
            DashboardExportType::Expenses => "expenses",
        }
    }
}

/// `dashboard-<type>-<ISO date>.<ext>`
pub fn export_filename(kind: DashboardExportType, date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "dashboard-{}-{}.{}",
        kind.as_str(),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}
